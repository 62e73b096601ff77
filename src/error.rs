//! Top-level error type for a report-load cycle.
//!
//! Every fatal condition aborts the current cycle and is reported to the
//! caller as one human-readable message. Display strings describe only their
//! own layer; [`render_chain`] appends the `source()` chain.

use std::error::Error as StdError;
use std::path::PathBuf;

use thiserror::Error;

use crate::definition::DefinitionError;
use crate::engine::EngineError;

/// Result type for load-cycle operations.
pub type ReportResult<T> = Result<T, ReportError>;

/// Errors surfaced to the caller of a load cycle.
#[derive(Debug, Error)]
pub enum ReportError {
    /// The definition document (or one of its reference files) is not usable.
    #[error("malformed report definition '{}'", path.display())]
    MalformedDefinition {
        path: PathBuf,
        #[source]
        source: DefinitionError,
    },

    /// A dataset names a data source the definition does not declare.
    #[error("unknown data source '{0}'")]
    UnknownDataSource(String),

    /// The caller asked for a dataset the definition does not declare.
    #[error("unknown dataset '{0}'")]
    UnknownDataset(String),

    /// A query parameter's value expression is not `=Parameters!<name>.Value`.
    #[error("can't parse query parameter expression: {0}")]
    UnparsableExpression(String),

    /// The bound report parameter is absent or has no values.
    #[error("report parameter {0} has no value set")]
    MissingParameterValue(String),

    /// Opening a connection for a data source failed.
    #[error("failed to connect to data source '{data_source}'")]
    Connection {
        data_source: String,
        #[source]
        source: EngineError,
    },

    /// Executing a dataset's command text failed.
    #[error("query for dataset '{dataset}' failed")]
    Query {
        dataset: String,
        #[source]
        source: EngineError,
    },

    /// Closing a data source's connection failed during cleanup.
    #[error("failed to close connection for data source '{data_source}'")]
    Close {
        data_source: String,
        #[source]
        source: EngineError,
    },
}

impl ReportError {
    pub(crate) fn malformed(path: impl Into<PathBuf>, source: DefinitionError) -> Self {
        Self::MalformedDefinition {
            path: path.into(),
            source,
        }
    }

    /// Render this error and its causes as a single message.
    pub fn render(&self) -> String {
        render_chain(self)
    }
}

/// Join an error's message with every message in its `source()` chain.
///
/// ```
/// use rdlbind::error::render_chain;
///
/// let err = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
/// assert_eq!(render_chain(&err), "gone");
/// ```
pub fn render_chain(err: &(dyn StdError + 'static)) -> String {
    let mut message = err.to_string();
    let mut current = err.source();
    while let Some(cause) = current {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        current = cause.source();
    }
    message
}
