//! Walks a definition's element tree and builds its catalogs.

use std::fs;
use std::path::Path;

use serde::Serialize;

use super::reference::{read_reference, reference_path};
use super::types::*;
use super::xml::{parse_document, Element};
use super::DefinitionError;
use crate::error::{ReportError, ReportResult};

/// Extension of client-side report definitions.
pub const DEFINITION_EXTENSION: &str = "rdlc";

/// Design-time annotation namespace. Elements bound to it are discarded.
pub const DESIGNER_NAMESPACE: &str =
    "http://schemas.microsoft.com/SQLServer/reporting/reportdesigner";

const ROOT: &str = "Report";

/// Everything this crate reads from one definition document.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ReportDefinition {
    /// Primary namespace, taken from the root element.
    pub namespace: Option<String>,
    pub data_sources: DataSourceCatalog,
    pub datasets: DatasetCatalog,
    pub parameters: ReportParameterCatalog,
}

/// Parse the definition at `path`, following any data source references.
pub fn parse_definition(path: &Path) -> ReportResult<ReportDefinition> {
    tracing::debug!(path = %path.display(), "parsing report definition");
    let source = fs::read_to_string(path).map_err(|source| {
        ReportError::malformed(
            path,
            DefinitionError::Io {
                path: path.to_path_buf(),
                source,
            },
        )
    })?;
    let definition =
        parse_definition_str(&source, path).map_err(|e| ReportError::malformed(path, e))?;
    tracing::debug!(
        data_sources = definition.data_sources.len(),
        datasets = definition.datasets.len(),
        parameters = definition.parameters.len(),
        "parsed report definition"
    );
    Ok(definition)
}

/// Parse definition text. `path` locates sibling `.rds` reference files and
/// need not exist when the document has no references.
pub fn parse_definition_str(
    source: &str,
    path: &Path,
) -> Result<ReportDefinition, DefinitionError> {
    let mut root = parse_document(source)?;
    if root.name != ROOT {
        return Err(DefinitionError::UnexpectedRoot {
            expected: ROOT.to_string(),
            found: root.name,
        });
    }
    root.prune_namespace(DESIGNER_NAMESPACE);

    let walker = Walker {
        namespace: root.namespace.as_deref(),
        path,
    };
    let data_sources = walker.data_sources(&root)?;
    let datasets = walker.datasets(&root)?;
    let parameters = walker.parameters(&root)?;

    Ok(ReportDefinition {
        namespace: root.namespace.clone(),
        data_sources,
        datasets,
        parameters,
    })
}

/// Element lookups scoped to the document's primary namespace.
struct Walker<'a> {
    namespace: Option<&'a str>,
    path: &'a Path,
}

impl<'a> Walker<'a> {
    fn child<'e>(&self, parent: &'e Element, name: &str) -> Option<&'e Element> {
        parent.child(self.namespace, name)
    }

    fn require<'e>(&self, parent: &'e Element, name: &str) -> Result<&'e Element, DefinitionError> {
        self.child(parent, name)
            .ok_or_else(|| DefinitionError::missing_element(&parent.name, name))
    }

    fn require_text(&self, parent: &Element, name: &str) -> Result<String, DefinitionError> {
        Ok(self.require(parent, name)?.text.clone())
    }

    fn each<'e>(&self, parent: &'e Element, name: &'static str) -> Vec<&'e Element> {
        parent
            .children
            .iter()
            .filter(|child| child.namespace.as_deref() == self.namespace && child.name == name)
            .collect()
    }

    fn data_sources(&self, root: &Element) -> Result<DataSourceCatalog, DefinitionError> {
        let mut catalog = DataSourceCatalog::new();
        let Some(section) = self.child(root, "DataSources") else {
            return Ok(catalog);
        };

        for node in self.each(section, "DataSource") {
            let name = name_attribute(node)?;
            let entry = match self.child(node, "ConnectionProperties") {
                Some(properties) => DataSourceEntry {
                    connection_string: self.require_text(properties, "ConnectString")?,
                    name,
                    reference: None,
                },
                None => {
                    let reference = self.require_text(node, "DataSourceReference")?;
                    let rds = reference_path(self.path, &reference);
                    let connection_string =
                        read_reference(&rds).map_err(|source| DefinitionError::Reference {
                            data_source: name.clone(),
                            path: rds.clone(),
                            source: Box::new(source),
                        })?;
                    DataSourceEntry {
                        name,
                        connection_string,
                        reference: Some(reference),
                    }
                }
            };
            catalog.insert(entry)?;
        }
        Ok(catalog)
    }

    fn datasets(&self, root: &Element) -> Result<DatasetCatalog, DefinitionError> {
        let mut catalog = DatasetCatalog::new();
        let Some(section) = self.child(root, "DataSets") else {
            return Ok(catalog);
        };

        for node in self.each(section, "DataSet") {
            let name = name_attribute(node)?;
            let query = self.require(node, "Query")?;

            let mut query_parameters = Vec::new();
            if let Some(parameters) = self.child(query, "QueryParameters") {
                for parameter in self.each(parameters, "QueryParameter") {
                    query_parameters.push(QueryParameterBinding {
                        name: name_attribute(parameter)?,
                        value_expression: self.require_text(parameter, "Value")?,
                    });
                }
            }

            catalog.insert(DatasetDefinition {
                name,
                data_source_name: self.require_text(query, "DataSourceName")?,
                command_text: self.require_text(query, "CommandText")?,
                query_parameters,
            })?;
        }
        Ok(catalog)
    }

    fn parameters(&self, root: &Element) -> Result<ReportParameterCatalog, DefinitionError> {
        let mut catalog = ReportParameterCatalog::new();
        let Some(section) = self.child(root, "ReportParameters") else {
            return Ok(catalog);
        };

        for node in self.each(section, "ReportParameter") {
            let data_type = match self.child(node, "DataType") {
                Some(element) => ParameterDataType::parse(&element.text).ok_or_else(|| {
                    DefinitionError::InvalidValue {
                        element: "DataType".to_string(),
                        value: element.text.clone(),
                    }
                })?,
                None => ParameterDataType::default(),
            };

            let multi_value = match self.child(node, "MultiValue") {
                Some(element) => parse_bool(element)?,
                None => false,
            };

            let mut default_values = Vec::new();
            let mut default_expressions = Vec::new();
            let values = self
                .child(node, "DefaultValue")
                .and_then(|default| self.child(default, "Values"));
            for value in values.map(|v| self.each(v, "Value")).unwrap_or_default() {
                if value.attribute("nil") == Some("true") {
                    continue;
                }
                if value.text.starts_with('=') {
                    default_expressions.push(value.text.clone());
                } else {
                    default_values.push(value.text.clone());
                }
            }

            catalog.insert(ReportParameterDefinition {
                name: name_attribute(node)?,
                data_type,
                prompt: self.child(node, "Prompt").map(|p| p.text.clone()),
                multi_value,
                default_values,
                default_expressions,
            })?;
        }
        Ok(catalog)
    }
}

fn name_attribute(element: &Element) -> Result<String, DefinitionError> {
    element
        .attribute("Name")
        .map(str::to_string)
        .ok_or_else(|| DefinitionError::missing_attribute(&element.name, "Name"))
}

fn parse_bool(element: &Element) -> Result<bool, DefinitionError> {
    match element.text.to_ascii_lowercase().as_str() {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(DefinitionError::InvalidValue {
            element: element.name.clone(),
            value: element.text.clone(),
        }),
    }
}
