use std::path::Path;

use serde_json::{Map, Value};

use crate::foundation::error::{FigError, FigResult};
use crate::spec::validate::walk_document;

/// Type string reserved for multi-panel figures.
pub const MULTI_TYPE: &str = "multi";

/// Figure-object keys interpreted by the loader; every other key is kept in [`FigureSpec::attrs`].
pub(crate) const RESERVED_KEYS: [&str; 5] = ["type", "data", "row", "column", "figures"];

/// Longest file name most filesystems accept, in bytes.
pub(crate) const MAX_FILE_NAME_BYTES: usize = 255;

/// Page file name for figure `id`.
pub(crate) fn page_file_name(id: &str) -> String {
    format!("fig{id}.pdf")
}

/// One figure of the document, immutable once loaded.
#[derive(Clone, Debug, PartialEq)]
pub struct FigureSpec {
    /// Figure id (the JSON key).
    pub id: String,
    /// Single renderer figure or multi-panel composition.
    pub kind: FigureKind,
    /// Opaque payload handed to the renderer; `null` when absent.
    pub data: Value,
    /// Remaining keys of the figure object, in declaration order.
    pub attrs: Map<String, Value>,
}

/// What a figure is made of.
#[derive(Clone, Debug, PartialEq)]
pub enum FigureKind {
    /// Rendered by the renderer bound to `type_name`.
    Single {
        /// Renderer type string.
        type_name: String,
    },
    /// Grid of nested figures.
    Multi(MultiSpec),
}

/// Grid geometry and children of a multi-panel figure.
#[derive(Clone, Debug, PartialEq)]
pub struct MultiSpec {
    /// Number of grid rows.
    pub row: u32,
    /// Number of grid columns.
    pub column: u32,
    /// Nested figures in declaration order.
    pub figures: Vec<FigureSpec>,
}

impl MultiSpec {
    /// Number of cells in the grid.
    pub fn capacity(&self) -> u64 {
        u64::from(self.row) * u64::from(self.column)
    }

    /// Check positive geometry, capacity and the absence of nested multi figures.
    pub fn check_geometry(&self) -> FigResult<()> {
        if self.row == 0 || self.column == 0 {
            return Err(FigError::config(format!(
                "'row' and 'column' must be positive, got {}x{}",
                self.row, self.column
            )));
        }
        if self.figures.len() as u64 > self.capacity() {
            return Err(FigError::config(format!(
                "grid {}x{} holds {} cells but {} figures are nested",
                self.row,
                self.column,
                self.capacity(),
                self.figures.len()
            )));
        }
        if let Some(nested) = self.figures.iter().find(|f| f.is_multi()) {
            return Err(FigError::config("nested 'multi' figures are not supported")
                .attributed_to(&nested.id));
        }
        Ok(())
    }
}

impl FigureSpec {
    /// The renderer type string (`"multi"` for multi-panel figures).
    pub fn type_name(&self) -> &str {
        match &self.kind {
            FigureKind::Single { type_name } => type_name,
            FigureKind::Multi(_) => MULTI_TYPE,
        }
    }

    /// Whether this is a multi-panel figure.
    pub fn is_multi(&self) -> bool {
        matches!(self.kind, FigureKind::Multi(_))
    }

    /// Rebuild the JSON object for this figure.
    pub fn to_value(&self) -> Value {
        let mut obj = Map::new();
        obj.insert("type".to_string(), Value::from(self.type_name()));
        if let FigureKind::Multi(multi) = &self.kind {
            obj.insert("row".to_string(), Value::from(multi.row));
            obj.insert("column".to_string(), Value::from(multi.column));
        }
        if !self.data.is_null() {
            obj.insert("data".to_string(), self.data.clone());
        }
        for (k, v) in &self.attrs {
            obj.insert(k.clone(), v.clone());
        }
        if let FigureKind::Multi(multi) = &self.kind {
            let figures = multi
                .figures
                .iter()
                .map(|f| (f.id.clone(), f.to_value()))
                .collect();
            obj.insert("figures".to_string(), Value::Object(figures));
        }
        Value::Object(obj)
    }
}

/// Ordered mapping of figure id to [`FigureSpec`], in declaration order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FigureSet {
    figures: Vec<FigureSpec>,
}

impl FigureSet {
    /// Build a set from already-validated figures.
    pub(crate) fn from_figures(figures: Vec<FigureSpec>) -> Self {
        Self { figures }
    }

    /// Parse and validate a document held in memory.
    pub fn from_json_str(s: &str) -> FigResult<Self> {
        let root: Value = serde_json::from_str(s)
            .map_err(|e| FigError::spec(format!("failed to parse JSON: {e}")))?;
        Self::from_value(&root)
    }

    /// Parse and validate a document from a reader.
    pub fn from_reader<R: std::io::Read>(r: R) -> FigResult<Self> {
        let root: Value = serde_json::from_reader(r)
            .map_err(|e| FigError::spec(format!("failed to parse JSON: {e}")))?;
        Self::from_value(&root)
    }

    /// Validate an already-parsed document, failing with its first finding.
    pub fn from_value(root: &Value) -> FigResult<Self> {
        let (set, findings) = walk_document(root);
        match findings.into_iter().next() {
            Some(first) => Err(first.into_error()),
            None => Ok(set),
        }
    }

    /// Top-level figures in declaration order.
    pub fn iter(&self) -> std::slice::Iter<'_, FigureSpec> {
        self.figures.iter()
    }

    /// Number of top-level figures.
    pub fn len(&self) -> usize {
        self.figures.len()
    }

    /// Whether the document declares no figures.
    pub fn is_empty(&self) -> bool {
        self.figures.is_empty()
    }

    /// Top-level ids in declaration order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.figures.iter().map(|f| f.id.as_str())
    }

    /// Look up a figure by id, top level first, then inside multi figures.
    pub fn get(&self, id: &str) -> Option<&FigureSpec> {
        self.figures.iter().find(|f| f.id == id).or_else(|| {
            self.figures.iter().find_map(|f| match &f.kind {
                FigureKind::Multi(multi) => multi.figures.iter().find(|c| c.id == id),
                FigureKind::Single { .. } => None,
            })
        })
    }

    /// Look up a top-level figure by id.
    pub fn top_level(&self, id: &str) -> Option<&FigureSpec> {
        self.figures.iter().find(|f| f.id == id)
    }

    /// Rebuild the JSON document, preserving declaration order.
    pub fn to_value(&self) -> Value {
        Value::Object(
            self.figures
                .iter()
                .map(|f| (f.id.clone(), f.to_value()))
                .collect(),
        )
    }

    /// Write the document back to `path` as pretty-printed JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> FigResult<()> {
        let path = path.as_ref();
        let text = serde_json::to_string_pretty(&self.to_value())
            .map_err(|e| FigError::spec(format!("failed to serialize JSON: {e}")))?;
        std::fs::write(path, text + "\n").map_err(|source| FigError::io(path, source))
    }
}

impl<'a> IntoIterator for &'a FigureSet {
    type Item = &'a FigureSpec;
    type IntoIter = std::slice::Iter<'a, FigureSpec>;

    fn into_iter(self) -> Self::IntoIter {
        self.figures.iter()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/spec/model.rs"]
mod tests;
