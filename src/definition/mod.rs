//! Report definition documents.
//!
//! A definition is an XML document (`.rdl`/`.rdlc`) whose root element
//! carries the report schema namespace. This module reads it into three
//! ordered catalogs:
//!
//! ```text
//! Report
//! ├── DataSources/DataSource[@Name]      -> DataSourceCatalog
//! │   ├── ConnectionProperties/ConnectString
//! │   └── DataSourceReference            -> <dir>/<reference>.rds
//! ├── DataSets/DataSet[@Name]/Query      -> DatasetCatalog
//! │   ├── DataSourceName
//! │   ├── CommandText
//! │   └── QueryParameters/QueryParameter[@Name]/Value
//! └── ReportParameters/ReportParameter   -> ReportParameterCatalog
//! ```
//!
//! All reference following happens here, at parse time. Resolving a data
//! source afterwards is a plain catalog lookup.
//!
//! # Example
//!
//! ```rust,ignore
//! use rdlbind::definition::parse_definition;
//!
//! let definition = parse_definition("reports/sales.rdlc".as_ref())?;
//! let connect_string = definition.data_sources.resolve("Northwind")?;
//! ```

mod parser;
mod reference;
mod types;
pub mod xml;

use std::path::PathBuf;

use thiserror::Error;

pub use parser::{
    parse_definition, parse_definition_str, ReportDefinition, DEFINITION_EXTENSION,
    DESIGNER_NAMESPACE,
};
pub use reference::{read_reference, reference_path, sibling_definition, REFERENCE_EXTENSION};
pub use types::{
    Catalog, CatalogEntry, DataSourceCatalog, DataSourceEntry, DatasetCatalog, DatasetDefinition,
    ParameterDataType, QueryParameterBinding, ReportParameterCatalog, ReportParameterDefinition,
};

/// Errors raised while reading a definition or reference document.
#[derive(Debug, Error)]
pub enum DefinitionError {
    #[error("failed to read '{}'", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("XML syntax error")]
    Xml(#[from] quick_xml::Error),

    /// Structural problems quick-xml does not report itself.
    #[error("ill-formed document: {0}")]
    Structure(String),

    #[error("expected root element <{expected}>, found <{found}>")]
    UnexpectedRoot { expected: String, found: String },

    #[error("missing <{element}> element in <{parent}>")]
    MissingElement { parent: String, element: String },

    #[error("missing '{attribute}' attribute on <{element}>")]
    MissingAttribute { element: String, attribute: String },

    #[error("duplicate {kind} name '{name}'")]
    DuplicateName { kind: &'static str, name: String },

    #[error("invalid value '{value}' in <{element}>")]
    InvalidValue { element: String, value: String },

    #[error("data source '{data_source}' references '{}'", path.display())]
    Reference {
        data_source: String,
        path: PathBuf,
        #[source]
        source: Box<DefinitionError>,
    },
}

impl DefinitionError {
    pub(crate) fn missing_element(parent: &str, element: &str) -> Self {
        Self::MissingElement {
            parent: parent.to_string(),
            element: element.to_string(),
        }
    }

    pub(crate) fn missing_attribute(element: &str, attribute: &str) -> Self {
        Self::MissingAttribute {
            element: element.to_string(),
            attribute: attribute.to_string(),
        }
    }
}
