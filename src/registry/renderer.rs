use std::path::PathBuf;

use serde_json::{Map, Value};

/// Everything a renderer receives for one figure.
#[derive(Clone, Debug, serde::Serialize)]
pub struct RenderCall {
    /// Figure id.
    pub id: String,
    /// Opaque payload from the figure's `"data"` key (`null` when absent).
    pub data: Value,
    /// Remaining keys of the figure object (e.g. `"title"`), in declaration order.
    pub attrs: Map<String, Value>,
    /// Verbosity level requested by the caller (0 quiet, 1 normal, 2+ debug).
    pub verbosity: u8,
    /// Page file the renderer must write: `fig{id}.pdf` in the output directory.
    pub out_path: PathBuf,
    /// Directory of the figure document, for resolving payload-relative paths.
    pub base_dir: PathBuf,
}

/// Contract for anything that can draw and persist one figure's page.
///
/// A renderer writes a single-page PDF at [`RenderCall::out_path`] as a side effect and may
/// return a value that is kept in the session's result map under the figure id.
pub trait Renderer: Send + Sync {
    /// Render the figure described by `call`.
    fn render(&self, call: &RenderCall) -> anyhow::Result<Option<Value>>;
}

/// Adapter turning a closure into a [`Renderer`].
pub struct FnRenderer<F>(F);

impl<F> Renderer for FnRenderer<F>
where
    F: Fn(&RenderCall) -> anyhow::Result<Option<Value>> + Send + Sync,
{
    fn render(&self, call: &RenderCall) -> anyhow::Result<Option<Value>> {
        (self.0)(call)
    }
}

/// Wrap a closure as a [`Renderer`].
pub fn renderer_fn<F>(f: F) -> FnRenderer<F>
where
    F: Fn(&RenderCall) -> anyhow::Result<Option<Value>> + Send + Sync,
{
    FnRenderer(f)
}
