//! TOML-based configuration for rdlbind.
//!
//! Supports a config file (rdlbind.toml) with environment variable expansion
//! in credential values.
//!
//! Example configuration:
//! ```toml
//! [logging]
//! level = "info"
//!
//! [data_sources.Northwind]
//! host = "./data/northwind.db"
//! username = "report"
//! password = "${NORTHWIND_PASSWORD}"
//!
//! [data_sources.Legacy]
//! cancel = true  # never connect; loads using it abort
//!
//! [parameters]
//! ID = ["42"]
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::binding::ReportParameters;

use super::connection::ConnectionRequest;

/// Error type for settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read config file")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    /// Log output configuration.
    pub logging: LoggingSettings,

    /// Credentials keyed by data source name.
    pub data_sources: HashMap<String, DataSourceSettings>,

    /// Report parameter values applied before command-line overrides.
    pub parameters: ReportParameters,
}

/// Log output configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Filter directive used when `RDLBIND_LOG` is unset (e.g. "info", "rdlbind=debug").
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

/// Credentials for one data source. Unset fields keep the definition's values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct DataSourceSettings {
    /// Replaces `data source` (supports ${ENV_VAR} expansion).
    pub host: Option<String>,

    pub username: Option<String>,

    /// Supports ${ENV_VAR} expansion.
    pub password: Option<String>,

    /// Force integrated security on or off.
    pub integrated_security: Option<bool>,

    /// Decline to connect, as a user cancelling the credential prompt would.
    pub cancel: bool,
}

impl DataSourceSettings {
    /// Apply these settings to a connection request.
    pub fn apply(
        &self,
        mut request: ConnectionRequest,
    ) -> Result<ConnectionRequest, SettingsError> {
        if let Some(host) = &self.host {
            request.host = expand_env_vars(host)?;
        }
        if let Some(username) = &self.username {
            let password = match &self.password {
                Some(p) => expand_env_vars(p)?,
                None => String::new(),
            };
            request = request.with_credentials(expand_env_vars(username)?, password);
        }
        if let Some(integrated) = self.integrated_security {
            request.integrated_security = integrated;
        }
        Ok(request)
    }
}

impl Settings {
    /// Load settings from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SettingsError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let settings: Settings = toml::from_str(&content)?;
        Ok(settings)
    }

    /// Load settings from the default config file locations.
    ///
    /// Searches in order:
    /// 1. Environment variable `RDLBIND_CONFIG`
    /// 2. `./rdlbind.toml`
    /// 3. `~/.config/rdlbind/config.toml`
    pub fn load() -> Result<Self, SettingsError> {
        if let Ok(path) = env::var("RDLBIND_CONFIG") {
            return Self::from_file(&path);
        }

        let local_config = PathBuf::from("rdlbind.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("rdlbind").join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        Ok(Settings::default())
    }

    /// Credentials configured for a data source, if any.
    pub fn data_source(&self, name: &str) -> Option<&DataSourceSettings> {
        self.data_sources.get(name)
    }
}

/// Expand environment variables in a string.
///
/// Supports `${VAR}` and `$VAR` syntax.
pub fn expand_env_vars(s: &str) -> Result<String, SettingsError> {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '$' {
            result.push(c);
            continue;
        }

        let mut var_name = String::new();
        if chars.peek() == Some(&'{') {
            chars.next();
            for ch in chars.by_ref() {
                if ch == '}' {
                    break;
                }
                var_name.push(ch);
            }
        } else {
            while let Some(&ch) = chars.peek() {
                if !(ch.is_alphanumeric() || ch == '_') {
                    break;
                }
                var_name.push(ch);
                chars.next();
            }
            if var_name.is_empty() {
                // lone '$'
                result.push('$');
                continue;
            }
        }

        let value = env::var(&var_name).map_err(|_| SettingsError::MissingEnvVar(var_name))?;
        result.push_str(&value);
    }

    Ok(result)
}
