//! Credential acquisition.
//!
//! A data source's connection string is usually incomplete: the definition
//! names the server but not who connects to it. Before the first query
//! against a data source, the load cycle hands a [`ConnectionRequest`] to a
//! [`CredentialProvider`], which either completes it and opens a connection
//! or declines.

use super::{Connection, EngineResult, SqliteConnection};
use crate::config::{ConnectionRequest, Settings};

/// Outcome of a credential request.
pub enum Connect {
    /// A live connection for the requested data source.
    Connected(Box<dyn Connection>),
    /// The user declined to supply credentials. The load aborts silently.
    Cancelled,
}

impl std::fmt::Debug for Connect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Connect::Connected(_) => f.write_str("Connected(..)"),
            Connect::Cancelled => f.write_str("Cancelled"),
        }
    }
}

/// Supplies connections for data sources, interactively or otherwise.
///
/// Implemented for closures, which is convenient for prompts and tests:
///
/// ```
/// use rdlbind::config::ConnectionRequest;
/// use rdlbind::engine::{Connect, CredentialProvider, EngineResult};
///
/// let mut decline =
///     |_request: ConnectionRequest| -> EngineResult<Connect> { Ok(Connect::Cancelled) };
/// # let _: &mut dyn CredentialProvider = &mut decline;
/// ```
pub trait CredentialProvider {
    fn connect(&mut self, request: ConnectionRequest) -> EngineResult<Connect>;
}

impl<F> CredentialProvider for F
where
    F: FnMut(ConnectionRequest) -> EngineResult<Connect>,
{
    fn connect(&mut self, request: ConnectionRequest) -> EngineResult<Connect> {
        self(request)
    }
}

/// Non-interactive provider backed by the `[data_sources]` settings table.
///
/// A data source without settings connects with its base connection string
/// unchanged.
#[derive(Debug, Clone, Default)]
pub struct ConfiguredCredentials {
    settings: Settings,
}

impl ConfiguredCredentials {
    pub fn new(settings: Settings) -> Self {
        Self { settings }
    }

    /// The connection string that would be opened for `request`, or `None`
    /// when the data source is configured to cancel.
    pub fn complete(&self, request: ConnectionRequest) -> EngineResult<Option<String>> {
        match self.settings.data_source(&request.data_source_name) {
            Some(configured) if configured.cancel => Ok(None),
            Some(configured) => Ok(Some(configured.apply(request)?.to_connection_string())),
            None => Ok(Some(request.base)),
        }
    }
}

impl CredentialProvider for ConfiguredCredentials {
    fn connect(&mut self, request: ConnectionRequest) -> EngineResult<Connect> {
        let data_source = request.data_source_name.clone();
        match self.complete(request)? {
            Some(connection_string) => {
                tracing::debug!(
                    data_source = %data_source,
                    "connecting with configured credentials"
                );
                let connection = SqliteConnection::open(&connection_string)?;
                Ok(Connect::Connected(Box::new(connection)))
            }
            None => Ok(Connect::Cancelled),
        }
    }
}
