//! # rdlbind
//!
//! Report definition introspection and data binding.
//!
//! ## Architecture
//!
//! rdlbind reads a declarative report definition (RDL/RDLC), works out where
//! each dataset's data comes from, and materializes it:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │            Report definition (.rdlc) + .rds files        │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [definition]
//! ┌─────────────────────────────────────────────────────────┐
//! │   DataSourceCatalog · DatasetCatalog · ReportParameters  │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [binding]
//! ┌─────────────────────────────────────────────────────────┐
//! │   =Parameters!<name>.Value  ──►  BoundParameter          │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [report + engine]
//! ┌─────────────────────────────────────────────────────────┐
//! │   LoadCycle: connect (CredentialProvider), execute,      │
//! │   cache MaterializedTable, close on cleanup              │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use rdlbind::prelude::*;
//!
//! let params = ReportParameters::new().with_value("ID", "42");
//! let mut credentials = ConfiguredCredentials::new(Settings::load()?);
//! match load_report_data("sales.rdlc".as_ref(), &["Orders"], &params, &mut credentials)? {
//!     LoadOutcome::Loaded(tables) => { /* hand tables to the renderer */ }
//!     LoadOutcome::Aborted => { /* user cancelled; show nothing */ }
//! }
//! ```

pub mod binding;
pub mod config;
pub mod definition;
pub mod engine;
pub mod error;
pub mod report;

/// Re-exports for convenient usage.
pub mod prelude {
    pub use crate::binding::ReportParameters;
    pub use crate::config::{ConnectionRequest, Settings};
    pub use crate::definition::{parse_definition, ReportDefinition};
    pub use crate::engine::{
        ConfiguredCredentials, Connect, Connection, CredentialProvider, MaterializedTable, Value,
    };
    pub use crate::error::{render_chain, ReportError, ReportResult};
    pub use crate::report::{load_report_data, load_subreport_data, LoadCycle, LoadOutcome};
}

// Also export at crate root for convenience
pub use error::{ReportError, ReportResult};
pub use report::{load_report_data, LoadCycle, LoadOutcome};
