//! Report-load cycles.
//!
//! A [`LoadCycle`] owns everything one report load needs: the parsed
//! definition, the connections it opened, and the tables it materialized.
//! Each subreport or drill-through target gets its own independent cycle.
//!
//! ```text
//! LoadCycle::open(path)          parse definition, follow .rds references
//!   │
//!   ├── get_data(dataset, ..)    cached? ──► return cached table
//!   │     │
//!   │     ├── resolve data source
//!   │     ├── connection open? ──no──► CredentialProvider ──► Cancelled ──► None
//!   │     ├── bind query parameters
//!   │     └── execute, materialize, cache
//!   │
//!   └── cleanup()                close every connection, drop catalogs
//! ```
//!
//! Cleanup must run on every exit path. [`load_report_data`] does this for
//! callers; a `LoadCycle` that is dropped without an explicit cleanup closes
//! its connections in `Drop`.

mod connections;

use std::collections::HashMap;
use std::path::Path;
use std::rc::Rc;

pub use connections::ConnectionManager;

use crate::binding::{self, ReportParameters};
use crate::definition::{parse_definition, sibling_definition, ReportDefinition};
use crate::engine::{CredentialProvider, MaterializedTable};
use crate::error::{ReportError, ReportResult};

/// State for one report load.
#[derive(Debug)]
pub struct LoadCycle {
    definition: ReportDefinition,
    connections: ConnectionManager,
    results: HashMap<String, Rc<MaterializedTable>>,
}

impl LoadCycle {
    /// Parse the definition at `path` and start a cycle for it.
    pub fn open(path: &Path) -> ReportResult<Self> {
        Ok(Self::new(parse_definition(path)?))
    }

    /// Start a cycle for an already parsed definition.
    pub fn new(definition: ReportDefinition) -> Self {
        Self {
            definition,
            connections: ConnectionManager::new(),
            results: HashMap::new(),
        }
    }

    pub fn definition(&self) -> &ReportDefinition {
        &self.definition
    }

    /// Connections currently held by this cycle.
    pub fn connections(&self) -> &ConnectionManager {
        &self.connections
    }

    /// Whether `dataset` has been materialized in this cycle.
    pub fn is_cached(&self, dataset: &str) -> bool {
        self.results.contains_key(dataset)
    }

    /// Fetch a dataset's table, executing its query on first request.
    ///
    /// Returns `Ok(None)` when the credential provider cancels; the caller
    /// should abort the whole report load without reporting an error.
    pub fn get_data(
        &mut self,
        dataset: &str,
        params: &ReportParameters,
        credentials: &mut dyn CredentialProvider,
    ) -> ReportResult<Option<Rc<MaterializedTable>>> {
        if let Some(table) = self.results.get(dataset) {
            tracing::debug!(dataset, "dataset cache hit");
            return Ok(Some(Rc::clone(table)));
        }

        let definition = self
            .definition
            .datasets
            .get(dataset)
            .ok_or_else(|| ReportError::UnknownDataset(dataset.to_string()))?;
        let data_source = definition.data_source_name.as_str();
        let connection_string = self.definition.data_sources.resolve(data_source)?;

        let connection = self
            .connections
            .get_or_connect(data_source, connection_string, credentials)?;
        let Some(connection) = connection else {
            return Ok(None);
        };

        let parameters = binding::bind_all(&definition.query_parameters, params)?;
        tracing::debug!(
            dataset,
            data_source,
            parameters = parameters.len(),
            "executing dataset query"
        );
        let table = connection
            .execute(&definition.command_text, &parameters)
            .map_err(|source| ReportError::Query {
                dataset: dataset.to_string(),
                source,
            })?;
        tracing::info!(dataset, rows = table.row_count(), "dataset materialized");

        let table = Rc::new(table);
        self.results.insert(dataset.to_string(), Rc::clone(&table));
        Ok(Some(table))
    }

    /// Close every connection opened by this cycle and release its catalogs.
    ///
    /// Safe to call more than once; later calls have nothing to close.
    pub fn cleanup(&mut self) -> ReportResult<()> {
        let closed = self.connections.close_all();
        self.results.clear();
        self.definition.data_sources.clear();
        self.definition.datasets.clear();
        self.definition.parameters.clear();
        closed
    }
}

impl Drop for LoadCycle {
    fn drop(&mut self) {
        if self.connections.is_empty() {
            return;
        }
        if let Err(err) = self.cleanup() {
            tracing::warn!(error = %err.render(), "cleanup failed while dropping load cycle");
        }
    }
}

/// Result of loading a report's datasets.
#[derive(Debug, Clone)]
pub enum LoadOutcome {
    /// Every requested dataset, in request order.
    Loaded(Vec<(String, Rc<MaterializedTable>)>),
    /// Credential acquisition was cancelled; show nothing.
    Aborted,
}

impl LoadOutcome {
    pub fn is_aborted(&self) -> bool {
        matches!(self, LoadOutcome::Aborted)
    }

    /// The table loaded for `dataset`, if the load completed.
    pub fn table(&self, dataset: &str) -> Option<&MaterializedTable> {
        match self {
            LoadOutcome::Loaded(tables) => tables
                .iter()
                .find(|(name, _)| name == dataset)
                .map(|(_, table)| table.as_ref()),
            LoadOutcome::Aborted => None,
        }
    }
}

/// Load `datasets` from the definition at `path` in one cycle.
///
/// The cycle is cleaned up on every exit path. When both data retrieval and
/// cleanup fail, the retrieval error is returned and the cleanup error is
/// logged.
pub fn load_report_data<S: AsRef<str>>(
    path: &Path,
    datasets: &[S],
    params: &ReportParameters,
    credentials: &mut dyn CredentialProvider,
) -> ReportResult<LoadOutcome> {
    let mut cycle = LoadCycle::open(path)?;
    let loaded = load_into(&mut cycle, datasets, params, credentials);
    let cleaned = cycle.cleanup();

    match (loaded, cleaned) {
        (Ok(outcome), Ok(())) => Ok(outcome),
        (Ok(_), Err(err)) => Err(err),
        (Err(err), Ok(())) => Err(err),
        (Err(err), Err(cleanup_err)) => {
            tracing::warn!(error = %cleanup_err.render(), "cleanup failed after load error");
            Err(err)
        }
    }
}

/// Load datasets for a subreport or drill-through target of `parent`.
///
/// The target definition is `<parent dir>/<report_name>.rdlc` and runs in its
/// own cycle with its own connections.
pub fn load_subreport_data<S: AsRef<str>>(
    parent: &Path,
    report_name: &str,
    datasets: &[S],
    params: &ReportParameters,
    credentials: &mut dyn CredentialProvider,
) -> ReportResult<LoadOutcome> {
    let path = sibling_definition(parent, report_name);
    tracing::debug!(parent = %parent.display(), target = %path.display(), "loading subreport");
    load_report_data(&path, datasets, params, credentials)
}

fn load_into<S: AsRef<str>>(
    cycle: &mut LoadCycle,
    datasets: &[S],
    params: &ReportParameters,
    credentials: &mut dyn CredentialProvider,
) -> ReportResult<LoadOutcome> {
    let mut tables = Vec::with_capacity(datasets.len());
    for dataset in datasets {
        let dataset = dataset.as_ref();
        match cycle.get_data(dataset, params, credentials)? {
            Some(table) => tables.push((dataset.to_string(), table)),
            None => return Ok(LoadOutcome::Aborted),
        }
    }
    Ok(LoadOutcome::Loaded(tables))
}
