//! Renderers shipped with figloom and advertised as plugins.
//!
//! - `blank`: an empty page, optionally tinted; `data` is `{"width", "height", "gray"}`.
//! - `image`: one raster image per page; `data` is `{"file", "dpi"}` with `file` relative to
//!   the document directory.

pub(crate) mod blank;
pub(crate) mod image;

use serde::de::DeserializeOwned;
use serde_json::Value;

/// Decode a renderer payload, treating `null` as "all defaults".
fn payload<T: DeserializeOwned + Default>(data: &Value) -> anyhow::Result<T> {
    if data.is_null() {
        return Ok(T::default());
    }
    Ok(serde_json::from_value(data.clone())?)
}
