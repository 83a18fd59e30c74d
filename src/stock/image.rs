use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context as _;
use kurbo::Rect;
use lopdf::content::{Content, Operation};
use lopdf::{Object, Stream, dictionary};
use serde_json::{Value, json};

use crate::foundation::error::{FigError, FigResult};
use crate::foundation::pdf::{real, write_single_page};
use crate::registry::plugin::RendererPlugin;
use crate::registry::renderer::{RenderCall, Renderer};

const POINTS_PER_INCH: f64 = 72.0;

#[derive(Debug, serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct ImageData {
    file: PathBuf,
    #[serde(default = "default_dpi")]
    dpi: f64,
}

fn default_dpi() -> f64 {
    POINTS_PER_INCH
}

/// Places one raster image on a page sized to the image at the requested resolution.
///
/// Transparent pixels are flattened onto white.
#[derive(Clone, Copy, Debug, Default)]
pub struct ImageRenderer;

impl Renderer for ImageRenderer {
    fn render(&self, call: &RenderCall) -> anyhow::Result<Option<Value>> {
        if call.data.is_null() {
            anyhow::bail!("image payload needs a \"file\" entry");
        }
        let data: ImageData =
            serde_json::from_value(call.data.clone()).context("invalid image payload")?;
        if !(data.dpi > 0.0) {
            anyhow::bail!("dpi must be positive, got {}", data.dpi);
        }
        let source = call.base_dir.join(&data.file);
        let bytes = std::fs::read(&source)
            .with_context(|| format!("read image '{}'", source.display()))?;
        let img = ::image::load_from_memory(&bytes)
            .with_context(|| format!("decode image '{}'", source.display()))?;
        let (width, height) = (img.width(), img.height());
        write_image_page(&call.out_path, &img, data.dpi)?;
        Ok(Some(json!({ "width_px": width, "height_px": height })))
    }
}

/// Write a one-page PDF showing `img` at `dpi`.
pub fn write_image_page(path: &Path, img: &::image::DynamicImage, dpi: f64) -> FigResult<()> {
    let rgba = img.to_rgba8();
    let (w_px, h_px) = rgba.dimensions();
    let mut rgb = rgba.into_raw();
    flatten_onto_white(&mut rgb);

    let scale = POINTS_PER_INCH / dpi;
    let (w_pt, h_pt) = (f64::from(w_px) * scale, f64::from(h_px) * scale);

    let xobject = Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => Object::Integer(i64::from(w_px)),
            "Height" => Object::Integer(i64::from(h_px)),
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => Object::Integer(8),
        },
        rgb,
    );
    let content = Content {
        operations: vec![
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![real(w_pt), real(0.0), real(0.0), real(h_pt), real(0.0), real(0.0)],
            ),
            Operation::new("Do", vec![Object::Name(b"Im0".to_vec())]),
            Operation::new("Q", vec![]),
        ],
    }
    .encode()
    .map_err(|e| FigError::merge(path, format!("cannot encode content: {e}")))?;

    write_single_page(
        path,
        Rect::new(0.0, 0.0, w_pt, h_pt),
        vec![("Im0", xobject)],
        content,
    )
}

/// Blend RGBA8 pixels over white and pack the result as RGB8 in place.
fn flatten_onto_white(buf: &mut Vec<u8>) {
    let pixels = buf.len() / 4;
    for i in 0..pixels {
        let [r, g, b, a] = [0, 1, 2, 3].map(|c| u16::from(buf[i * 4 + c]));
        for (c, v) in [r, g, b].into_iter().enumerate() {
            buf[i * 3 + c] = ((v * a + 255 * (255 - a) + 127) / 255) as u8;
        }
    }
    buf.truncate(pixels * 3);
}

fn create() -> Arc<dyn Renderer> {
    Arc::new(ImageRenderer)
}

inventory::submit! { RendererPlugin::new("image", create) }

#[cfg(test)]
#[path = "../../tests/unit/stock/image.rs"]
mod tests;
