use std::path::{Path, PathBuf};

use crate::foundation::error::FigError;

/// A page file produced for one figure.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutputArtifact {
    /// Figure id.
    pub id: String,
    /// Position of the figure in its enclosing scope's declaration order.
    pub order: usize,
    /// The figure's page file (`fig{id}.pdf`).
    pub page: PathBuf,
    /// Standalone pages of a multi figure's children, in declaration order.
    pub children: Vec<OutputArtifact>,
}

/// A figure left out of the build in best-effort mode.
#[derive(Debug)]
pub struct SkippedFigure {
    /// Top-level figure that was skipped.
    pub id: String,
    /// Why. For a multi figure this usually names the failing child.
    pub error: FigError,
}

impl SkippedFigure {
    /// The skipped id plus, for a multi figure, the child that caused the skip.
    pub fn ids(&self) -> Vec<&str> {
        let mut ids = vec![self.id.as_str()];
        if let Some(cause) = self.error.figure_id()
            && cause != self.id
        {
            ids.push(cause);
        }
        ids
    }
}

/// Outcome of a build.
#[derive(Debug, Default)]
pub struct BuildReport {
    /// Combined document; `None` for single-figure builds.
    pub combined: Option<PathBuf>,
    /// Top-level artifacts in declaration order.
    pub artifacts: Vec<OutputArtifact>,
    /// Figures skipped in best-effort mode, in declaration order.
    pub skipped: Vec<SkippedFigure>,
}

impl BuildReport {
    /// Top-level page files in the order they were (or would be) concatenated.
    pub fn pages(&self) -> Vec<&Path> {
        self.artifacts.iter().map(|a| a.page.as_path()).collect()
    }

    /// Every skipped id, parents before the children that caused them.
    pub fn skipped_ids(&self) -> Vec<&str> {
        self.skipped.iter().flat_map(SkippedFigure::ids).collect()
    }
}

/// Attribute a page-level error to the artifact that owns the page, if any.
pub(crate) fn attribute_by_page(err: FigError, artifacts: &[OutputArtifact]) -> FigError {
    let FigError::Merge { path, .. } = &err else {
        return err;
    };
    let owner = artifacts
        .iter()
        .flat_map(|a| std::iter::once(a).chain(a.children.iter()))
        .find(|a| &a.page == path)
        .map(|a| a.id.clone());
    match owner {
        Some(id) => err.attributed_to(&id),
        None => err,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/report.rs"]
mod tests;
