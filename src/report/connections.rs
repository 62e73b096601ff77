//! Per-cycle connection tracking.

use crate::config::ConnectionRequest;
use crate::engine::{Connect, Connection, CredentialProvider};
use crate::error::{ReportError, ReportResult};

/// One connection per data source name, opened lazily and closed together.
#[derive(Default)]
pub struct ConnectionManager {
    /// In the order they were opened.
    open: Vec<(String, Box<dyn Connection>)>,
}

impl ConnectionManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self, data_source: &str) -> bool {
        self.position(data_source).is_some()
    }

    /// Number of connections currently open.
    pub fn len(&self) -> usize {
        self.open.len()
    }

    pub fn is_empty(&self) -> bool {
        self.open.is_empty()
    }

    fn position(&self, data_source: &str) -> Option<usize> {
        self.open.iter().position(|(name, _)| name == data_source)
    }

    /// The open connection for `data_source`, asking `credentials` for one
    /// on first use. `Ok(None)` means the provider cancelled.
    pub fn get_or_connect(
        &mut self,
        data_source: &str,
        connection_string: &str,
        credentials: &mut dyn CredentialProvider,
    ) -> ReportResult<Option<&mut dyn Connection>> {
        let index = match self.position(data_source) {
            Some(index) => {
                tracing::debug!(data_source, "reusing open connection");
                index
            }
            None => {
                let request = ConnectionRequest::parse(data_source, connection_string);
                let outcome =
                    credentials
                        .connect(request)
                        .map_err(|source| ReportError::Connection {
                            data_source: data_source.to_string(),
                            source,
                        })?;
                match outcome {
                    Connect::Connected(connection) => {
                        tracing::info!(data_source, "connected to data source");
                        self.open.push((data_source.to_string(), connection));
                        self.open.len() - 1
                    }
                    Connect::Cancelled => {
                        tracing::info!(data_source, "connection cancelled");
                        return Ok(None);
                    }
                }
            }
        };
        Ok(Some(self.open[index].1.as_mut()))
    }

    /// Close every open connection exactly once.
    ///
    /// All connections are closed even when some fail; the first failure is
    /// returned and the rest are logged.
    pub fn close_all(&mut self) -> ReportResult<()> {
        let mut first_error = None;
        for (data_source, connection) in self.open.drain(..) {
            match connection.close() {
                Ok(()) => tracing::debug!(data_source = %data_source, "connection closed"),
                Err(source) => {
                    let err = ReportError::Close {
                        data_source,
                        source,
                    };
                    if first_error.is_none() {
                        first_error = Some(err);
                    } else {
                        tracing::warn!(error = %err.render(), "additional close failure");
                    }
                }
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

impl std::fmt::Debug for ConnectionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.open.iter().map(|(name, _)| name))
            .finish()
    }
}
