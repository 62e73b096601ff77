//! Query execution against a relational data source.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────┐
//! │                 CredentialProvider                     │
//! │   ConnectionRequest ──► Connect::Connected | Cancelled │
//! └───────────────────────────────────────────────────────┘
//!                          │ Box<dyn Connection>
//!                          ▼
//! ┌───────────────────────────────────────────────────────┐
//! │                    Connection                          │
//! │   execute(command_text, [BoundParameter])              │
//! │        ──► MaterializedTable                           │
//! │   close()                                              │
//! └───────────────────────────────────────────────────────┘
//!                          │
//!                          ▼
//!                  SqliteConnection (rusqlite)
//! ```
//!
//! Command text is opaque; it is handed to the data source verbatim.

mod credentials;
mod sqlite;

use serde::Serialize;
use thiserror::Error;

use crate::config::SettingsError;

pub use credentials::{ConfiguredCredentials, Connect, CredentialProvider};
pub use sqlite::SqliteConnection;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors raised by a data source.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("database error")]
    Sqlite(#[from] rusqlite::Error),

    #[error("invalid connection string: {0}")]
    InvalidConnectionString(String),

    #[error("unsupported connection mode '{0}'")]
    UnsupportedMode(String),

    #[error("failed to close connection")]
    Close(#[source] rusqlite::Error),

    #[error("invalid credential settings")]
    Settings(#[from] SettingsError),

    /// Failure reported by a custom provider or connection.
    #[error("{0}")]
    Message(String),
}

impl EngineError {
    pub fn message(message: impl Into<String>) -> Self {
        Self::Message(message.into())
    }
}

/// A query parameter ready to be passed to the data source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BoundParameter {
    /// The dataset's placeholder name, not the report parameter's name.
    pub name: String,
    pub value: String,
}

/// A live connection to one data source.
///
/// Connections are used sequentially by one load cycle and closed exactly
/// once when it ends.
pub trait Connection {
    /// Run `command_text` with `parameters` and materialize every row.
    fn execute(
        &mut self,
        command_text: &str,
        parameters: &[BoundParameter],
    ) -> EngineResult<MaterializedTable>;

    /// Release the connection.
    fn close(self: Box<Self>) -> EngineResult<()>;
}

/// One typed cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl From<rusqlite::types::ValueRef<'_>> for Value {
    fn from(value: rusqlite::types::ValueRef<'_>) -> Self {
        use rusqlite::types::ValueRef;
        match value {
            ValueRef::Null => Value::Null,
            ValueRef::Integer(i) => Value::Integer(i),
            ValueRef::Real(f) => Value::Real(f),
            ValueRef::Text(t) => Value::Text(String::from_utf8_lossy(t).into_owned()),
            ValueRef::Blob(b) => Value::Blob(b.to_vec()),
        }
    }
}

/// The complete result set of one dataset query.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct MaterializedTable {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl MaterializedTable {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Append a row. Its width must match the column schema.
    pub fn push_row(&mut self, row: Vec<Value>) {
        debug_assert_eq!(row.len(), self.columns.len());
        self.rows.push(row);
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Cell at `row` in the named column.
    pub fn get(&self, row: usize, column: &str) -> Option<&Value> {
        let index = self.column_index(column)?;
        self.rows.get(row)?.get(index)
    }
}
