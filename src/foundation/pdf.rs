//! Low-level PDF plumbing shared by composition, concatenation and the stock renderers.

use std::path::Path;

use kurbo::Rect;
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, dictionary};

use crate::foundation::error::{FigError, FigResult};

pub(crate) const PDF_VERSION: &str = "1.5";

/// Page attributes a page may inherit from its ancestors in the page tree.
const INHERITABLE: [&[u8]; 4] = [b"MediaBox", b"CropBox", b"Resources", b"Rotate"];

/// Page-tree walks stop after this many `Parent` hops; real trees are shallow.
const MAX_TREE_DEPTH: usize = 64;

pub(crate) fn real(v: f64) -> Object {
    Object::Real(v as f32)
}

pub(crate) fn rect_to_array(r: Rect) -> Object {
    Object::Array(vec![real(r.x0), real(r.y0), real(r.x1), real(r.y1)])
}

/// A page moved into a target document, with its inherited attributes flattened.
#[derive(Clone, Copy, Debug)]
pub(crate) struct ImportedPage {
    pub(crate) id: ObjectId,
    pub(crate) media_box: Rect,
}

/// Re-check that `path` is still a readable regular file and parse it.
pub(crate) fn load_page_document(path: &Path) -> FigResult<Document> {
    let meta = std::fs::metadata(path)
        .map_err(|e| FigError::merge(path, format!("page file is missing or unreadable: {e}")))?;
    if !meta.is_file() {
        return Err(FigError::merge(path, "page path is not a regular file"));
    }
    Document::load(path).map_err(|e| FigError::merge(path, format!("cannot parse PDF: {e}")))
}

/// Move every object of `source` into `target` and return `source`'s pages in page order.
///
/// The source catalog and page-tree nodes are dropped; each page dictionary gets its
/// inherited attributes copied in and its `Parent` link removed, ready to be re-parented.
pub(crate) fn import_pages(
    target: &mut Document,
    mut source: Document,
    path: &Path,
) -> FigResult<Vec<ImportedPage>> {
    source.renumber_objects_with(target.max_id + 1);

    let page_ids: Vec<ObjectId> = source.get_pages().into_values().collect();
    let mut pages = Vec::with_capacity(page_ids.len());
    for page_id in page_ids {
        let mut dict = source
            .get_dictionary(page_id)
            .map_err(|e| FigError::merge(path, format!("malformed page object: {e}")))?
            .clone();
        for key in INHERITABLE {
            if !dict.has(key)
                && let Some(value) = inherited(&source, page_id, key)
            {
                dict.set(key.to_vec(), value);
            }
        }
        let media_box = dict
            .get(b"MediaBox")
            .ok()
            .and_then(|obj| read_rect(&source, obj))
            .ok_or_else(|| FigError::merge(path, "page has no usable MediaBox"))?;
        dict.remove(b"Parent");
        source.objects.insert(page_id, Object::Dictionary(dict));
        pages.push(ImportedPage {
            id: page_id,
            media_box,
        });
    }

    let source_max = source.max_id;
    for (id, object) in source.objects {
        if is_tree_node(&object) {
            continue;
        }
        target.objects.insert(id, object);
    }
    target.max_id = target.max_id.max(source_max);
    Ok(pages)
}

/// Wrap an imported page as a Form XObject sharing the page's resources.
pub(crate) fn page_as_form(target: &Document, page: &ImportedPage, path: &Path) -> FigResult<Stream> {
    let content = target
        .get_page_content(page.id)
        .map_err(|e| FigError::merge(path, format!("cannot read page content: {e}")))?;
    let resources = target
        .get_dictionary(page.id)
        .ok()
        .and_then(|d| d.get(b"Resources").ok().cloned())
        .unwrap_or_else(|| Object::Dictionary(Dictionary::new()));
    let dict = dictionary! {
        "Type" => "XObject",
        "Subtype" => "Form",
        "BBox" => rect_to_array(page.media_box),
        "Resources" => resources,
    };
    Ok(Stream::new(dict, content))
}

/// Install a single-level page tree over `kids` and point the trailer at a new catalog.
pub(crate) fn finish_page_tree(doc: &mut Document, pages_id: ObjectId, kids: &[ObjectId]) {
    for kid in kids {
        if let Ok(dict) = doc.get_object_mut(*kid).and_then(|o| o.as_dict_mut()) {
            dict.set("Parent", pages_id);
        }
    }
    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => kids.iter().copied().map(Object::Reference).collect::<Vec<_>>(),
        "Count" => Object::Integer(kids.len() as i64),
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
}

/// Drop unreachable objects, compress streams and write `doc` to `path`.
pub(crate) fn save_document(doc: &mut Document, path: &Path) -> FigResult<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .map_err(|e| FigError::merge(path, format!("cannot create parent directory: {e}")))?;
    }
    doc.prune_objects();
    doc.compress();
    doc.save(path)
        .map_err(|e| FigError::merge(path, format!("cannot write PDF: {e}")))?;
    Ok(())
}

/// Write a one-page document with the given geometry, XObjects and content stream.
///
/// Each `(name, stream)` pair becomes an indirect XObject reachable as `/name` from `content`.
pub(crate) fn write_single_page(
    path: &Path,
    media_box: Rect,
    xobjects: Vec<(&str, Stream)>,
    content: Vec<u8>,
) -> FigResult<()> {
    let mut doc = Document::with_version(PDF_VERSION);
    let pages_id = doc.new_object_id();
    let mut names = Dictionary::new();
    for (name, stream) in xobjects {
        let id = doc.add_object(stream);
        names.set(name, id);
    }
    let content_id = doc.add_object(Stream::new(Dictionary::new(), content));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "MediaBox" => rect_to_array(media_box),
        "Resources" => dictionary! { "XObject" => names },
        "Contents" => content_id,
    });
    finish_page_tree(&mut doc, pages_id, &[page_id]);
    save_document(&mut doc, path)
}

fn inherited(doc: &Document, page_id: ObjectId, key: &[u8]) -> Option<Object> {
    let mut current = doc.get_dictionary(page_id).ok()?;
    for _ in 0..MAX_TREE_DEPTH {
        let parent = current.get(b"Parent").and_then(|p| p.as_reference()).ok()?;
        current = doc.get_dictionary(parent).ok()?;
        if let Ok(value) = current.get(key) {
            return Some(value.clone());
        }
    }
    None
}

fn read_rect(doc: &Document, obj: &Object) -> Option<Rect> {
    let obj = match obj {
        Object::Reference(id) => doc.get_object(*id).ok()?,
        other => other,
    };
    let arr = obj.as_array().ok()?;
    if arr.len() != 4 {
        return None;
    }
    let mut v = [0.0f64; 4];
    for (slot, item) in v.iter_mut().zip(arr) {
        *slot = f64::from(item.as_float().ok()?);
    }
    // Normalize so x0/y0 is the lower-left corner regardless of how the box was written.
    Some(Rect::new(v[0], v[1], v[2], v[3]).abs())
}

fn is_tree_node(object: &Object) -> bool {
    let Object::Dictionary(dict) = object else {
        return false;
    };
    matches!(
        dict.get(b"Type").and_then(|t| t.as_name()),
        Ok(b"Catalog") | Ok(b"Pages")
    )
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/pdf.rs"]
mod tests;
