//! Configuration module for rdlbind.
//!
//! Handles connection strings, environment variables, and settings.

mod connection;
mod settings;

pub use connection::{ConnectionRequest, ConnectionString, DATA_SOURCE_KEY};
pub use settings::{
    expand_env_vars, DataSourceSettings, LoggingSettings, Settings, SettingsError,
};
