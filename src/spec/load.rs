use std::path::Path;

use serde_json::Value;

use crate::foundation::error::FigResult;
use crate::spec::model::FigureSet;
use crate::spec::validate::{Finding, validate_value};

/// Load and validate the figure document at `path`.
///
/// Fails with the first finding: [`crate::FigError::Spec`] for structural problems,
/// [`crate::FigError::Config`] for multi-panel geometry and nesting problems.
pub fn load(path: impl AsRef<Path>) -> FigResult<FigureSet> {
    let path = path.as_ref();
    let root = read_document(path).map_err(Finding::into_error)?;
    let set = FigureSet::from_value(&root)?;
    tracing::debug!(path = %path.display(), figures = set.len(), "loaded figure document");
    Ok(set)
}

/// Run every structural check on the document at `path` and return all findings.
///
/// Never invokes a renderer and never writes a file. An empty list means the document loads.
pub fn validate(path: impl AsRef<Path>) -> Vec<Finding> {
    match read_document(path.as_ref()) {
        Ok(root) => validate_value(&root),
        Err(finding) => vec![finding],
    }
}

fn read_document(path: &Path) -> Result<Value, Finding> {
    let text = std::fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Finding::spec(None, format!("JSON file does not exist: {}", path.display()))
        } else {
            Finding::spec(None, format!("cannot read JSON file '{}': {e}", path.display()))
        }
    })?;
    serde_json::from_str(&text).map_err(|e| {
        Finding::spec(None, format!("failed to parse JSON '{}': {e}", path.display()))
    })
}
