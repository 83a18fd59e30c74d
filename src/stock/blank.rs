use std::path::Path;
use std::sync::Arc;

use anyhow::Context as _;
use kurbo::Rect;
use lopdf::content::{Content, Operation};
use serde_json::Value;

use crate::foundation::error::{FigError, FigResult};
use crate::foundation::pdf::{real, write_single_page};
use crate::registry::plugin::RendererPlugin;
use crate::registry::renderer::{RenderCall, Renderer};

/// 4 x 3 inches.
const DEFAULT_WIDTH: f64 = 288.0;
const DEFAULT_HEIGHT: f64 = 216.0;

#[derive(Debug, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
struct BlankData {
    width: f64,
    height: f64,
    gray: Option<f64>,
}

impl Default for BlankData {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            gray: None,
        }
    }
}

/// Renders an empty page of a requested size.
#[derive(Clone, Copy, Debug, Default)]
pub struct BlankRenderer;

impl Renderer for BlankRenderer {
    fn render(&self, call: &RenderCall) -> anyhow::Result<Option<Value>> {
        let data: BlankData = super::payload(&call.data).context("invalid blank payload")?;
        if !(data.width > 0.0 && data.height > 0.0) {
            anyhow::bail!("page size must be positive, got {}x{}", data.width, data.height);
        }
        if let Some(g) = data.gray
            && !(0.0..=1.0).contains(&g)
        {
            anyhow::bail!("gray must be within [0, 1], got {g}");
        }
        write_blank_page(&call.out_path, data.width, data.height, data.gray)?;
        Ok(None)
    }
}

/// Write a one-page PDF of `width` x `height` points, filled with `gray` when given.
pub fn write_blank_page(path: &Path, width: f64, height: f64, gray: Option<f64>) -> FigResult<()> {
    let media_box = Rect::new(0.0, 0.0, width, height);
    let mut operations = Vec::new();
    if let Some(g) = gray {
        operations.push(Operation::new("g", vec![real(g)]));
        operations.push(Operation::new(
            "re",
            vec![real(0.0), real(0.0), real(width), real(height)],
        ));
        operations.push(Operation::new("f", vec![]));
    }
    let content = Content { operations }
        .encode()
        .map_err(|e| FigError::merge(path, format!("cannot encode content: {e}")))?;
    write_single_page(path, media_box, Vec::new(), content)
}

fn create() -> Arc<dyn Renderer> {
    Arc::new(BlankRenderer)
}

inventory::submit! { RendererPlugin::new("blank", create) }

#[cfg(test)]
#[path = "../../tests/unit/stock/blank.rs"]
mod tests;
