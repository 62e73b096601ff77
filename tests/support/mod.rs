//! Shared fixtures for integration tests.
#![allow(dead_code)]

use std::cell::RefCell;
use std::fs;
use std::path::PathBuf;
use std::rc::Rc;

use rdlbind::config::ConnectionRequest;
use rdlbind::engine::{
    BoundParameter, Connect, Connection, CredentialProvider, EngineResult, MaterializedTable,
    SqliteConnection,
};
use tempfile::TempDir;

pub const REPORT_NS: &str =
    "http://schemas.microsoft.com/sqlserver/reporting/2008/01/reportdefinition";
pub const DESIGNER_NS: &str = "http://schemas.microsoft.com/SQLServer/reporting/reportdesigner";

/// A temporary directory holding definitions, reference files and databases.
pub struct Fixture {
    pub dir: TempDir,
}

impl Fixture {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.path(name);
        fs::write(&path, contents).unwrap();
        path
    }

    /// Create a SQLite database file and run `sql` against it.
    pub fn database(&self, name: &str, sql: &str) -> PathBuf {
        let path = self.path(name);
        let conn = rusqlite::Connection::open(&path).unwrap();
        conn.execute_batch(sql).unwrap();
        path
    }
}

/// Wrap sections in a `<Report>` root with the 2008 schema namespace.
pub fn report(sections: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<Report xmlns="{REPORT_NS}" xmlns:rd="{DESIGNER_NS}">
{sections}
  <Body><Height>1in</Height></Body>
</Report>"#
    )
}

pub fn inline_source(name: &str, connect_string: &str) -> String {
    format!(
        r#"<DataSource Name="{name}">
  <ConnectionProperties>
    <DataProvider>SQL</DataProvider>
    <ConnectString>{connect_string}</ConnectString>
  </ConnectionProperties>
  <rd:DataSourceID>00000000-0000-0000-0000-000000000000</rd:DataSourceID>
</DataSource>"#
    )
}

pub fn referenced_source(name: &str, reference: &str) -> String {
    format!(
        r#"<DataSource Name="{name}">
  <DataSourceReference>{reference}</DataSourceReference>
</DataSource>"#
    )
}

pub fn rds(connect_string: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<RptDataSource xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" Name="Shared">
  <ConnectionProperties>
    <Extension>SQL</Extension>
    <ConnectString>{connect_string}</ConnectString>
  </ConnectionProperties>
  <DataSourceID>00000000-0000-0000-0000-000000000000</DataSourceID>
</RptDataSource>"#
    )
}

pub fn data_sources(sources: &[String]) -> String {
    format!("<DataSources>\n{}\n</DataSources>", sources.join("\n"))
}

/// A dataset; `params` are `(query parameter name, value expression)` pairs.
pub fn dataset(name: &str, source: &str, command: &str, params: &[(&str, &str)]) -> String {
    let query_parameters = if params.is_empty() {
        String::new()
    } else {
        let items: Vec<String> = params
            .iter()
            .map(|(p, expr)| {
                format!(r#"<QueryParameter Name="{p}"><Value>{expr}</Value></QueryParameter>"#)
            })
            .collect();
        format!("<QueryParameters>{}</QueryParameters>", items.join(""))
    };
    format!(
        r#"<DataSet Name="{name}">
  <Query>
    <DataSourceName>{source}</DataSourceName>
    <CommandText>{command}</CommandText>
    {query_parameters}
  </Query>
</DataSet>"#
    )
}

pub fn datasets(sets: &[String]) -> String {
    format!("<DataSets>\n{}\n</DataSets>", sets.join("\n"))
}

/// Everything the recording provider and its connections observed.
#[derive(Debug, Default)]
pub struct Log {
    pub requests: Vec<ConnectionRequest>,
    pub executes: Vec<(String, Vec<BoundParameter>)>,
    pub closes: Vec<String>,
}

/// Opens real SQLite connections from the base connection string and
/// records every call.
#[derive(Clone, Default)]
pub struct Recorder {
    pub log: Rc<RefCell<Log>>,
    pub cancel: bool,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancelling() -> Self {
        Self {
            cancel: true,
            ..Self::default()
        }
    }

    pub fn connects(&self) -> usize {
        self.log.borrow().requests.len()
    }

    pub fn executes(&self) -> usize {
        self.log.borrow().executes.len()
    }

    pub fn closes(&self) -> usize {
        self.log.borrow().closes.len()
    }
}

impl CredentialProvider for Recorder {
    fn connect(&mut self, request: ConnectionRequest) -> EngineResult<Connect> {
        self.log.borrow_mut().requests.push(request.clone());
        if self.cancel {
            return Ok(Connect::Cancelled);
        }
        let inner = SqliteConnection::open(&request.base)?;
        Ok(Connect::Connected(Box::new(RecordingConnection {
            data_source: request.data_source_name,
            inner,
            log: Rc::clone(&self.log),
        })))
    }
}

struct RecordingConnection {
    data_source: String,
    inner: SqliteConnection,
    log: Rc<RefCell<Log>>,
}

impl Connection for RecordingConnection {
    fn execute(
        &mut self,
        command_text: &str,
        parameters: &[BoundParameter],
    ) -> EngineResult<MaterializedTable> {
        self.log
            .borrow_mut()
            .executes
            .push((command_text.to_string(), parameters.to_vec()));
        self.inner.execute(command_text, parameters)
    }

    fn close(self: Box<Self>) -> EngineResult<()> {
        let this = *self;
        this.log.borrow_mut().closes.push(this.data_source);
        Box::new(this.inner).close()
    }
}
