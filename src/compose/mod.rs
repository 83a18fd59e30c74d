//! Multi-panel composition: children rendered in order, then tiled onto one page.

pub(crate) mod grid;
pub(crate) mod multi;

use std::path::{Path, PathBuf};

use kurbo::Size;
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, Stream, dictionary};

use crate::compose::grid::GridLayout;
use crate::foundation::error::{FigError, FigResult};
use crate::foundation::pdf::{
    PDF_VERSION, finish_page_tree, import_pages, load_page_document, page_as_form, real,
    rect_to_array, save_document,
};

/// Tile the first page of each file in `panels` onto a `rows` x `columns` grid and write the
/// result as a one-page PDF at `out`.
///
/// Panels fill cells left to right, then top to bottom, and are never scaled.
pub fn compose_grid(panels: &[PathBuf], rows: u32, columns: u32, out: &Path) -> FigResult<()> {
    if rows == 0 || columns == 0 {
        return Err(FigError::config(format!(
            "grid must have at least one row and one column, got {rows}x{columns}"
        )));
    }
    if panels.is_empty() {
        return Err(FigError::config("grid has no panels to compose"));
    }
    let capacity = u64::from(rows) * u64::from(columns);
    if panels.len() as u64 > capacity {
        return Err(FigError::config(format!(
            "{} panels do not fit a {rows}x{columns} grid",
            panels.len()
        )));
    }

    let mut doc = Document::with_version(PDF_VERSION);
    let pages_id = doc.new_object_id();

    let mut placed = Vec::with_capacity(panels.len());
    for path in panels {
        let source = load_page_document(path)?;
        let pages = import_pages(&mut doc, source, path)?;
        let Some(first) = pages.first().copied() else {
            return Err(FigError::merge(path, "panel has no pages"));
        };
        if pages.len() > 1 {
            tracing::warn!(
                panel = %path.display(),
                pages = pages.len(),
                "panel has several pages; only the first is placed"
            );
        }
        placed.push((path, first));
    }

    let sizes: Vec<Size> = placed.iter().map(|(_, p)| p.media_box.size()).collect();
    let layout = GridLayout::for_panels(rows, columns, &sizes);

    let mut xobjects = Dictionary::new();
    let mut operations = Vec::with_capacity(placed.len() * 4);
    for (index, (path, page)) in placed.iter().enumerate() {
        let form = page_as_form(&doc, page, path)?;
        let form_id = doc.add_object(form);
        let name = format!("Panel{index}");
        xobjects.set(name.as_str(), form_id);

        let coeffs = layout.placement(index, page.media_box).as_coeffs();
        operations.push(Operation::new("q", vec![]));
        operations.push(Operation::new("cm", coeffs.iter().copied().map(real).collect()));
        operations.push(Operation::new("Do", vec![Object::Name(name.into_bytes())]));
        operations.push(Operation::new("Q", vec![]));
    }
    let content = Content { operations }
        .encode()
        .map_err(|e| FigError::merge(out, format!("cannot encode grid content: {e}")))?;
    let content_id = doc.add_object(Stream::new(Dictionary::new(), content));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "MediaBox" => rect_to_array(layout.page_rect()),
        "Resources" => dictionary! { "XObject" => xobjects },
        "Contents" => content_id,
    });

    finish_page_tree(&mut doc, pages_id, &[page_id]);
    save_document(&mut doc, out)?;
    tracing::debug!(
        out = %out.display(),
        panels = placed.len(),
        rows,
        columns,
        "composed grid page"
    );
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/compose/compose.rs"]
mod tests;
