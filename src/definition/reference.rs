//! Sibling files of a definition: shared data source references and
//! subreport/drill-through definitions.

use std::fs;
use std::path::{Path, PathBuf};

use super::xml::parse_document;
use super::{DefinitionError, DEFINITION_EXTENSION};

/// Extension of shared data source reference files.
pub const REFERENCE_EXTENSION: &str = "rds";

const REFERENCE_ROOT: &str = "RptDataSource";

/// Directory a definition's siblings are resolved against.
fn definition_dir(definition: &Path) -> &Path {
    definition.parent().unwrap_or_else(|| Path::new(""))
}

/// Location of `<reference>.rds` next to the definition.
pub fn reference_path(definition: &Path, reference: &str) -> PathBuf {
    definition_dir(definition).join(format!("{reference}.{REFERENCE_EXTENSION}"))
}

/// Location of the definition for a subreport or drill-through target named
/// `report_name`: the parent's directory, same stem, `.rdlc` extension.
pub fn sibling_definition(parent: &Path, report_name: &str) -> PathBuf {
    definition_dir(parent).join(format!("{report_name}.{DEFINITION_EXTENSION}"))
}

/// Read the connection string out of a `.rds` reference file.
///
/// The file holds `RptDataSource/ConnectionProperties/ConnectString`, in
/// whatever namespace its root element declares (usually none).
pub fn read_reference(path: &Path) -> Result<String, DefinitionError> {
    let source = fs::read_to_string(path).map_err(|source| DefinitionError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let root = parse_document(&source)?;
    if root.name != REFERENCE_ROOT {
        return Err(DefinitionError::UnexpectedRoot {
            expected: REFERENCE_ROOT.to_string(),
            found: root.name,
        });
    }

    let namespace = root.namespace.as_deref();
    let properties = root
        .child(namespace, "ConnectionProperties")
        .ok_or_else(|| DefinitionError::missing_element(REFERENCE_ROOT, "ConnectionProperties"))?;
    let connect_string = properties
        .child(namespace, "ConnectString")
        .ok_or_else(|| DefinitionError::missing_element("ConnectionProperties", "ConnectString"))?;

    tracing::debug!(path = %path.display(), "resolved data source reference");
    Ok(connect_string.text.clone())
}
