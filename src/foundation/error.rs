use std::path::PathBuf;

/// Convenience result type used across figloom.
pub type FigResult<T> = Result<T, FigError>;

/// Top-level error taxonomy used by the orchestration APIs.
///
/// Every variant that can be traced back to one figure carries that figure's id, so callers can
/// report which entry of the JSON document caused the failure.
#[derive(thiserror::Error, Debug)]
pub enum FigError {
    /// Malformed or structurally invalid JSON specification.
    #[error("spec error{}: {message}", fmt_id(.id))]
    Spec {
        /// Figure the problem is attributed to, if any.
        id: Option<String>,
        /// Human-readable description.
        message: String,
    },

    /// No resolution path binds a renderer type string.
    #[error("resolve error{}: type '{type_name}': {message}", fmt_id(.id))]
    Resolve {
        /// Figure whose type failed to resolve, once attributed.
        id: Option<String>,
        /// The type string that was looked up.
        type_name: String,
        /// Human-readable description.
        message: String,
    },

    /// Invalid multi-panel geometry or unsupported nesting.
    #[error("config error{}: {message}", fmt_id(.id))]
    Config {
        /// Figure the problem is attributed to, if any.
        id: Option<String>,
        /// Human-readable description.
        message: String,
    },

    /// A renderer failed; the original cause is kept as the error source.
    #[error("render error for figure '{id}': {source}")]
    Render {
        /// Figure being rendered.
        id: String,
        /// Error reported by the renderer.
        #[source]
        source: anyhow::Error,
    },

    /// A renderer completed but its page file is absent.
    #[error("output missing for figure '{id}': expected page '{}'", .path.display())]
    OutputMissing {
        /// Figure whose page is missing.
        id: String,
        /// Expected page path.
        path: PathBuf,
    },

    /// A page could not be read or written while composing or concatenating.
    #[error("merge error{}: '{}': {message}", fmt_id(.id), .path.display())]
    Merge {
        /// Figure owning the offending page, once attributed.
        id: Option<String>,
        /// Offending file.
        path: PathBuf,
        /// Human-readable description.
        message: String,
    },

    /// Filesystem failure outside of page handling (e.g. creating the output directory).
    #[error("io error{}: '{}': {source}", fmt_id(.id), .path.display())]
    Io {
        /// Figure whose file was being accessed, once attributed.
        id: Option<String>,
        /// Path being accessed.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

fn fmt_id(id: &Option<String>) -> String {
    match id {
        Some(id) => format!(" in figure '{id}'"),
        None => String::new(),
    }
}

impl FigError {
    /// Build a [`FigError::Spec`] value not yet tied to a figure.
    pub fn spec(msg: impl Into<String>) -> Self {
        Self::Spec {
            id: None,
            message: msg.into(),
        }
    }

    /// Build a [`FigError::Config`] value not yet tied to a figure.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            id: None,
            message: msg.into(),
        }
    }

    /// Build a [`FigError::Resolve`] value for `type_name`.
    pub fn resolve(type_name: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Resolve {
            id: None,
            type_name: type_name.into(),
            message: msg.into(),
        }
    }

    /// Build a [`FigError::Merge`] value for `path`.
    pub fn merge(path: impl Into<PathBuf>, msg: impl Into<String>) -> Self {
        Self::Merge {
            id: None,
            path: path.into(),
            message: msg.into(),
        }
    }

    /// Build a [`FigError::Io`] value for `path`.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            id: None,
            path: path.into(),
            source,
        }
    }

    /// Attach `figure_id` to variants that do not carry one yet.
    ///
    /// An id that is already present is kept, so the innermost attribution wins.
    pub fn attributed_to(mut self, figure_id: &str) -> Self {
        match &mut self {
            Self::Spec { id, .. }
            | Self::Resolve { id, .. }
            | Self::Config { id, .. }
            | Self::Merge { id, .. }
            | Self::Io { id, .. } => {
                if id.is_none() {
                    *id = Some(figure_id.to_string());
                }
            }
            Self::Render { .. } | Self::OutputMissing { .. } => {}
        }
        self
    }

    /// The figure this error is attributed to, if any.
    pub fn figure_id(&self) -> Option<&str> {
        match self {
            Self::Spec { id, .. }
            | Self::Resolve { id, .. }
            | Self::Config { id, .. }
            | Self::Merge { id, .. }
            | Self::Io { id, .. } => id.as_deref(),
            Self::Render { id, .. } | Self::OutputMissing { id, .. } => Some(id),
        }
    }

    /// Whether best-effort builds may skip the figure instead of aborting.
    ///
    /// Structural, configuration, merge and IO failures are always fatal.
    pub fn is_skippable(&self) -> bool {
        matches!(
            self,
            Self::Resolve { .. } | Self::Render { .. } | Self::OutputMissing { .. }
        )
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
