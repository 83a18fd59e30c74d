//! Concatenation of page files into the combined document.

use std::path::{Path, PathBuf};

use lopdf::Document;
use rayon::prelude::*;

use crate::foundation::error::{FigError, FigResult};
use crate::foundation::pdf::{
    PDF_VERSION, finish_page_tree, import_pages, load_page_document, save_document,
};

/// Concatenate `pages` into one document at `out`, in exactly the given order.
///
/// Every input is re-checked and parsed here (in parallel), so a page that disappeared or was
/// corrupted after rendering fails the merge instead of being dropped silently.
#[tracing::instrument(skip(pages), fields(inputs = pages.len()))]
pub fn merge(pages: &[PathBuf], out: &Path) -> FigResult<PathBuf> {
    if pages.is_empty() {
        return Err(FigError::merge(out, "nothing to concatenate"));
    }

    let sources = pages
        .par_iter()
        .map(|path| load_page_document(path))
        .collect::<FigResult<Vec<Document>>>()?;

    let mut doc = Document::with_version(PDF_VERSION);
    let pages_id = doc.new_object_id();
    let mut kids = Vec::new();
    for (path, source) in pages.iter().zip(sources) {
        let imported = import_pages(&mut doc, source, path)?;
        if imported.is_empty() {
            return Err(FigError::merge(path, "document has no pages"));
        }
        kids.extend(imported.iter().map(|p| p.id));
    }

    finish_page_tree(&mut doc, pages_id, &kids);
    save_document(&mut doc, out)?;
    tracing::info!(
        pages = kids.len(),
        "merged combined document"
    );
    Ok(out.to_path_buf())
}

#[cfg(test)]
#[path = "../../tests/unit/merge/merge.rs"]
mod tests;
