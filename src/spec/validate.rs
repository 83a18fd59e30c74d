//! Structural checks over the boundary JSON document.
//!
//! The same walk backs both loading (first finding becomes the error) and non-destructive
//! validation (every finding is reported). Nothing here touches renderers or the filesystem.

use std::collections::HashSet;
use std::fmt;

use serde_json::{Map, Value};

use crate::foundation::error::FigError;
use crate::spec::model::{
    FigureKind, FigureSet, FigureSpec, MAX_FILE_NAME_BYTES, MULTI_TYPE, MultiSpec, RESERVED_KEYS,
    page_file_name,
};

/// Which error class a finding maps to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FindingKind {
    /// Malformed structure ([`FigError::Spec`]).
    Spec,
    /// Invalid multi-panel geometry or nesting ([`FigError::Config`]).
    Config,
}

/// One problem found in a figure document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Finding {
    /// Error class.
    pub kind: FindingKind,
    /// Figure the problem belongs to; `None` for document-level problems.
    pub id: Option<String>,
    /// Human-readable description.
    pub message: String,
}

impl Finding {
    pub(crate) fn spec(id: Option<&str>, message: impl Into<String>) -> Self {
        Self {
            kind: FindingKind::Spec,
            id: id.map(str::to_string),
            message: message.into(),
        }
    }

    pub(crate) fn config(id: Option<&str>, message: impl Into<String>) -> Self {
        Self {
            kind: FindingKind::Config,
            id: id.map(str::to_string),
            message: message.into(),
        }
    }

    /// Convert into the matching [`FigError`].
    pub fn into_error(self) -> FigError {
        match self.kind {
            FindingKind::Spec => FigError::Spec {
                id: self.id,
                message: self.message,
            },
            FindingKind::Config => FigError::Config {
                id: self.id,
                message: self.message,
            },
        }
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            FindingKind::Spec => "spec",
            FindingKind::Config => "config",
        };
        match &self.id {
            Some(id) => write!(f, "[{kind}] {id}: {}", self.message),
            None => write!(f, "[{kind}] {}", self.message),
        }
    }
}

/// Check `root` and collect every finding.
pub fn validate_value(root: &Value) -> Vec<Finding> {
    walk_document(root).1
}

/// Walk the whole document, building the figures that are well formed and recording problems.
///
/// The returned set is only meaningful when the finding list is empty.
pub(crate) fn walk_document(root: &Value) -> (FigureSet, Vec<Finding>) {
    let mut walker = Walker::default();
    let Value::Object(entries) = root else {
        walker
            .findings
            .push(Finding::spec(None, "root of JSON must be an object mapping id -> figure spec"));
        return (FigureSet::default(), walker.findings);
    };
    if entries.is_empty() {
        walker
            .findings
            .push(Finding::spec(None, "document declares no figures"));
    }

    let mut figures = Vec::with_capacity(entries.len());
    for (id, node) in entries {
        if !walker.check_id(id) {
            continue;
        }
        if let Some(fig) = walker.figure(id, node, None) {
            figures.push(fig);
        }
    }
    (FigureSet::from_figures(figures), walker.findings)
}

#[derive(Default)]
struct Walker {
    findings: Vec<Finding>,
    seen: HashSet<String>,
}

impl Walker {
    fn check_id(&mut self, id: &str) -> bool {
        if id.is_empty() {
            self.findings
                .push(Finding::spec(None, "figure id must not be empty"));
            return false;
        }
        if id.contains(['/', '\\']) {
            self.findings.push(Finding::spec(
                Some(id),
                "figure id must not contain path separators",
            ));
            return false;
        }
        if id.contains('\0') {
            self.findings
                .push(Finding::spec(Some(id), "figure id must not contain NUL characters"));
            return false;
        }
        let file_name = page_file_name(id);
        if file_name.len() > MAX_FILE_NAME_BYTES {
            self.findings.push(Finding::spec(
                Some(id),
                format!(
                    "page file name '{file_name}' is {} bytes; at most {MAX_FILE_NAME_BYTES} are allowed",
                    file_name.len()
                ),
            ));
            return false;
        }
        if !self.seen.insert(id.to_string()) {
            self.findings.push(Finding::spec(
                Some(id),
                "duplicate figure id (ids share one output directory and result map)",
            ));
            return false;
        }
        true
    }

    fn figure(&mut self, id: &str, node: &Value, parent: Option<&str>) -> Option<FigureSpec> {
        let Value::Object(obj) = node else {
            self.findings
                .push(Finding::spec(Some(id), "figure spec must be an object"));
            return None;
        };
        let Some(type_name) = obj.get("type").and_then(Value::as_str) else {
            self.findings
                .push(Finding::spec(Some(id), "figure must have a string 'type' field"));
            return None;
        };
        let data = obj.get("data").cloned().unwrap_or(Value::Null);

        if type_name != MULTI_TYPE {
            let attrs = collect_attrs(obj, &["type", "data"]);
            return Some(FigureSpec {
                id: id.to_string(),
                kind: FigureKind::Single {
                    type_name: type_name.to_string(),
                },
                data,
                attrs,
            });
        }

        if let Some(parent) = parent {
            self.findings.push(Finding::config(
                Some(id),
                format!("nested 'multi' inside multi figure '{parent}' is not supported"),
            ));
            return None;
        }

        let row = self.dimension(id, obj, "row");
        let column = self.dimension(id, obj, "column");
        let children = match obj.get("figures") {
            Some(Value::Object(m)) if !m.is_empty() => Some(m),
            Some(Value::Object(_)) => {
                self.findings
                    .push(Finding::spec(Some(id), "multi 'figures' must not be empty"));
                None
            }
            _ => {
                self.findings
                    .push(Finding::spec(Some(id), "multi requires 'figures' object"));
                None
            }
        };
        let children = children?;

        let mut figures = Vec::with_capacity(children.len());
        let mut complete = true;
        for (sub_id, sub) in children {
            if !self.check_id(sub_id) {
                complete = false;
                continue;
            }
            match self.figure(sub_id, sub, Some(id)) {
                Some(child) => figures.push(child),
                None => complete = false,
            }
        }

        let (row, column) = (row?, column?);
        let multi = MultiSpec {
            row,
            column,
            figures,
        };
        if children.len() as u64 > multi.capacity() {
            self.findings.push(Finding::config(
                Some(id),
                format!(
                    "grid {row}x{column} holds {} cells but {} figures are nested",
                    multi.capacity(),
                    children.len()
                ),
            ));
            return None;
        }
        if !complete {
            return None;
        }
        Some(FigureSpec {
            id: id.to_string(),
            kind: FigureKind::Multi(multi),
            data,
            attrs: collect_attrs(obj, &RESERVED_KEYS),
        })
    }

    fn dimension(&mut self, id: &str, obj: &Map<String, Value>, key: &str) -> Option<u32> {
        let Some(value) = obj.get(key) else {
            self.findings
                .push(Finding::spec(Some(id), format!("multi requires '{key}'")));
            return None;
        };
        match (value.as_u64(), value.as_i64()) {
            (Some(0), _) | (None, Some(_)) => {
                self.findings.push(Finding::config(
                    Some(id),
                    format!("'{key}' must be a positive integer, got {value}"),
                ));
                None
            }
            (Some(n), _) => match u32::try_from(n) {
                Ok(n) => Some(n),
                Err(_) => {
                    self.findings
                        .push(Finding::config(Some(id), format!("'{key}' is too large: {n}")));
                    None
                }
            },
            (None, None) => {
                self.findings.push(Finding::spec(
                    Some(id),
                    format!("'{key}' must be an integer, got {value}"),
                ));
                None
            }
        }
    }
}

fn collect_attrs(obj: &Map<String, Value>, reserved: &[&str]) -> Map<String, Value> {
    obj.iter()
        .filter(|(k, _)| !reserved.contains(&k.as_str()))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

#[cfg(test)]
#[path = "../../tests/unit/spec/validate.rs"]
mod tests;
