//! SQLite data source.
//!
//! The connection string's `data source` names the database file, or
//! `:memory:`. An optional `mode` selects `ReadOnly`, `ReadWrite` (default)
//! or `ReadWriteCreate`. Authentication keys are accepted and ignored.

use rusqlite::{OpenFlags, Statement};

use super::{BoundParameter, Connection, EngineError, EngineResult, MaterializedTable, Value};
use crate::config::{ConnectionString, DATA_SOURCE_KEY};

const MEMORY: &str = ":memory:";

/// Placeholder sigils tried for a parameter name declared without one.
const SIGILS: [char; 3] = ['@', ':', '$'];

/// A rusqlite connection behind the [`Connection`] trait.
pub struct SqliteConnection {
    conn: rusqlite::Connection,
    target: String,
}

impl SqliteConnection {
    /// Open the database named by a connection string.
    pub fn open(connection_string: &str) -> EngineResult<Self> {
        let parsed = ConnectionString::parse(connection_string);
        let target = parsed
            .get(DATA_SOURCE_KEY)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                EngineError::InvalidConnectionString(format!("missing '{DATA_SOURCE_KEY}'"))
            })?
            .to_string();

        if parsed.contains("user") || parsed.contains("password") {
            tracing::debug!(target = %target, "ignoring credentials for sqlite data source");
        }

        let conn = if target == MEMORY {
            rusqlite::Connection::open_in_memory()?
        } else {
            rusqlite::Connection::open_with_flags(&target, open_flags(parsed.get("mode"))?)?
        };
        tracing::debug!(target = %target, "opened sqlite connection");

        Ok(Self { conn, target })
    }

    /// Database file (or `:memory:`) this connection targets.
    pub fn target(&self) -> &str {
        &self.target
    }
}

fn open_flags(mode: Option<&str>) -> EngineResult<OpenFlags> {
    let base = OpenFlags::SQLITE_OPEN_NO_MUTEX;
    let access = match mode.map(str::to_ascii_lowercase).as_deref() {
        None | Some("readwrite") => OpenFlags::SQLITE_OPEN_READ_WRITE,
        Some("readonly") => OpenFlags::SQLITE_OPEN_READ_ONLY,
        Some("readwritecreate") => {
            OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE
        }
        Some(_) => {
            return Err(EngineError::UnsupportedMode(
                mode.unwrap_or_default().to_string(),
            ))
        }
    };
    Ok(base | access)
}

/// One-based index of the placeholder a parameter binds to.
fn placeholder_index(stmt: &Statement<'_>, name: &str) -> EngineResult<Option<usize>> {
    if name.starts_with(SIGILS) {
        return Ok(stmt.parameter_index(name)?);
    }
    for sigil in SIGILS {
        if let Some(index) = stmt.parameter_index(&format!("{sigil}{name}"))? {
            return Ok(Some(index));
        }
    }
    Ok(None)
}

impl Connection for SqliteConnection {
    fn execute(
        &mut self,
        command_text: &str,
        parameters: &[BoundParameter],
    ) -> EngineResult<MaterializedTable> {
        let mut stmt = self.conn.prepare(command_text)?;
        for parameter in parameters {
            match placeholder_index(&stmt, &parameter.name)? {
                Some(index) => stmt.raw_bind_parameter(index, parameter.value.as_str())?,
                None => tracing::debug!(
                    parameter = %parameter.name,
                    "parameter not referenced by command text"
                ),
            }
        }

        let columns = stmt
            .column_names()
            .into_iter()
            .map(String::from)
            .collect();
        let mut table = MaterializedTable::new(columns);
        let width = table.column_count();

        let mut rows = stmt.raw_query();
        while let Some(row) = rows.next()? {
            let mut cells = Vec::with_capacity(width);
            for i in 0..width {
                cells.push(Value::from(row.get_ref(i)?));
            }
            table.push_row(cells);
        }
        Ok(table)
    }

    fn close(self: Box<Self>) -> EngineResult<()> {
        let SqliteConnection { conn, target } = *self;
        conn.close().map_err(|(_, e)| EngineError::Close(e))?;
        tracing::debug!(target = %target, "closed sqlite connection");
        Ok(())
    }
}
