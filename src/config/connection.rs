//! Connection string handling.
//!
//! Connection strings are `;`-separated `name=value` pairs:
//!
//! ```text
//! data source=./sales.db;Mode=ReadOnly;Integrated Security=SSPI
//! ```
//!
//! Names compare case-insensitively. Segments that do not split into exactly
//! one name and one value are ignored.

use std::fmt;

/// Key naming the connection target (server host or database file).
pub const DATA_SOURCE_KEY: &str = "data source";

const INTEGRATED_SECURITY_KEY: &str = "integrated security";
const PERSIST_SECURITY_INFO_KEY: &str = "persist security info";

/// Parsed `name=value` pairs, in their original order and spelling.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionString {
    pairs: Vec<(String, String)>,
}

impl ConnectionString {
    pub fn parse(s: &str) -> Self {
        let pairs = s
            .split(';')
            .filter_map(|segment| {
                let mut parts = segment.split('=');
                match (parts.next(), parts.next(), parts.next()) {
                    (Some(name), Some(value), None) => {
                        Some((name.trim().to_string(), value.trim().to_string()))
                    }
                    _ => None,
                }
            })
            .filter(|(name, _)| !name.is_empty())
            .collect();
        Self { pairs }
    }

    /// Value of the first pair whose name matches, ignoring case.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }
}

impl fmt::Display for ConnectionString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, value) in &self.pairs {
            write!(f, "{name}={value};")?;
        }
        Ok(())
    }
}

/// A data source's base connection string, split into the fields a
/// credential provider completes and the pairs it passes through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionRequest {
    /// Name of the data source being connected.
    pub data_source_name: String,
    /// The base connection string as declared in the definition.
    pub base: String,
    /// Value of `data source`.
    pub host: String,
    /// Whether the base string asked for integrated security.
    pub integrated_security: bool,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Every other pair, in order. `persist security info` is dropped.
    pub extra: Vec<(String, String)>,
}

impl ConnectionRequest {
    pub fn parse(data_source_name: impl Into<String>, base: impl Into<String>) -> Self {
        let base = base.into();
        let mut host = String::new();
        let mut integrated_security = false;
        let mut extra = Vec::new();

        for (name, value) in ConnectionString::parse(&base).pairs {
            if name.eq_ignore_ascii_case(DATA_SOURCE_KEY) {
                host = value;
            } else if name.eq_ignore_ascii_case(INTEGRATED_SECURITY_KEY) {
                integrated_security = true;
            } else if name.eq_ignore_ascii_case(PERSIST_SECURITY_INFO_KEY) {
                // discarded
            } else {
                extra.push((name, value));
            }
        }

        Self {
            data_source_name: data_source_name.into(),
            base,
            host,
            integrated_security,
            username: None,
            password: None,
            extra,
        }
    }

    /// Supply a user name and password, turning integrated security off.
    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.integrated_security = false;
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// Compose the completed connection string.
    pub fn to_connection_string(&self) -> String {
        let mut s = format!("{DATA_SOURCE_KEY}={}", self.host);
        if self.integrated_security {
            s.push_str(";Integrated Security=SSPI");
        } else {
            s.push_str(&format!(
                ";user={};password={}",
                self.username.as_deref().unwrap_or_default(),
                self.password.as_deref().unwrap_or_default()
            ));
        }
        s.push(';');
        for (name, value) in &self.extra {
            s.push_str(&format!("{name}={value};"));
        }
        s
    }
}
