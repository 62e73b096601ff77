//! Typed catalogs extracted from a definition document.

use serde::Serialize;

use super::DefinitionError;
use crate::error::{ReportError, ReportResult};

/// An entry that can live in a [`Catalog`].
pub trait CatalogEntry {
    /// Label used in duplicate-name errors.
    const KIND: &'static str;

    fn name(&self) -> &str;
}

/// Ordered collection of uniquely named entries.
///
/// Insertion order follows document order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Catalog<T> {
    entries: Vec<T>,
}

impl<T> Default for Catalog<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<T: CatalogEntry> Catalog<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry, rejecting a name that is already present.
    pub fn insert(&mut self, entry: T) -> Result<(), DefinitionError> {
        if self.contains(entry.name()) {
            return Err(DefinitionError::DuplicateName {
                kind: T::KIND,
                name: entry.name().to_string(),
            });
        }
        self.entries.push(entry);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&T> {
        self.entries.iter().find(|entry| entry.name() == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(T::name).collect()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl<'a, T> IntoIterator for &'a Catalog<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

// ============================================================================
// Data sources
// ============================================================================

/// A named connection target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DataSourceEntry {
    pub name: String,
    /// Base connection string; credentials are completed at connect time.
    pub connection_string: String,
    /// The `.rds` reference this entry was resolved through, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
}

impl CatalogEntry for DataSourceEntry {
    const KIND: &'static str = "data source";

    fn name(&self) -> &str {
        &self.name
    }
}

pub type DataSourceCatalog = Catalog<DataSourceEntry>;

impl Catalog<DataSourceEntry> {
    /// Connection string for a data source.
    ///
    /// References were already followed during parsing, so this is a lookup.
    pub fn resolve(&self, name: &str) -> ReportResult<&str> {
        self.get(name)
            .map(|entry| entry.connection_string.as_str())
            .ok_or_else(|| ReportError::UnknownDataSource(name.to_string()))
    }
}

// ============================================================================
// Datasets
// ============================================================================

/// Link between a query placeholder and a report parameter expression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryParameterBinding {
    /// Placeholder name as declared on the query (e.g. `@p`).
    pub name: String,
    /// Value expression, normally `=Parameters!<name>.Value`.
    pub value_expression: String,
}

impl QueryParameterBinding {
    pub fn new(name: impl Into<String>, value_expression: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value_expression: value_expression.into(),
        }
    }
}

/// A named query against one data source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatasetDefinition {
    pub name: String,
    pub data_source_name: String,
    pub command_text: String,
    pub query_parameters: Vec<QueryParameterBinding>,
}

impl CatalogEntry for DatasetDefinition {
    const KIND: &'static str = "dataset";

    fn name(&self) -> &str {
        &self.name
    }
}

pub type DatasetCatalog = Catalog<DatasetDefinition>;

// ============================================================================
// Report parameters
// ============================================================================

/// Declared data type of a report parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum ParameterDataType {
    #[default]
    String,
    Boolean,
    Integer,
    Float,
    DateTime,
}

impl ParameterDataType {
    /// Parse the text of a `<DataType>` element.
    pub fn parse(text: &str) -> Option<Self> {
        match text {
            "String" => Some(Self::String),
            "Boolean" => Some(Self::Boolean),
            "Integer" => Some(Self::Integer),
            "Float" => Some(Self::Float),
            "DateTime" => Some(Self::DateTime),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "String",
            Self::Boolean => "Boolean",
            Self::Integer => "Integer",
            Self::Float => "Float",
            Self::DateTime => "DateTime",
        }
    }
}

/// A report parameter as declared in the definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportParameterDefinition {
    pub name: String,
    pub data_type: ParameterDataType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    pub multi_value: bool,
    /// Literal defaults. `xsi:nil` values are not recorded.
    pub default_values: Vec<String>,
    /// Defaults given as expressions (`=Today()`), which are never evaluated.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub default_expressions: Vec<String>,
}

impl ReportParameterDefinition {
    /// Whether the declared defaults can be used as values as they stand.
    pub fn has_literal_default(&self) -> bool {
        !self.default_values.is_empty() && self.default_expressions.is_empty()
    }
}

impl CatalogEntry for ReportParameterDefinition {
    const KIND: &'static str = "report parameter";

    fn name(&self) -> &str {
        &self.name
    }
}

pub type ReportParameterCatalog = Catalog<ReportParameterDefinition>;
