use super::*;
use crate::stock::blank::write_blank_page;

fn widths(path: &Path) -> Vec<f64> {
    let doc = Document::load(path).unwrap();
    let mut target = Document::with_version(PDF_VERSION);
    import_pages(&mut target, doc, path)
        .unwrap()
        .iter()
        .map(|p| p.media_box.width())
        .collect()
}

#[test]
fn pages_keep_input_order() {
    let dir = tempfile::tempdir().unwrap();
    let mut pages = Vec::new();
    for (name, width) in [("b", 30.0), ("a", 10.0), ("c", 20.0)] {
        let path = dir.path().join(format!("fig{name}.pdf"));
        write_blank_page(&path, width, 5.0, None).unwrap();
        pages.push(path);
    }

    let out = merge(&pages, &dir.path().join("all.pdf")).unwrap();
    assert_eq!(widths(&out), vec![30.0, 10.0, 20.0]);
}

#[test]
fn repeated_inputs_are_not_deduplicated() {
    let dir = tempfile::tempdir().unwrap();
    let page = dir.path().join("fig1.pdf");
    write_blank_page(&page, 10.0, 10.0, None).unwrap();

    let out = merge(&[page.clone(), page], &dir.path().join("all.pdf")).unwrap();
    assert_eq!(widths(&out).len(), 2);
}

#[test]
fn empty_input_is_a_merge_error() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("all.pdf");
    let err = merge(&[], &out).unwrap_err();
    assert!(matches!(err, FigError::Merge { .. }));
    assert!(err.to_string().contains("nothing to concatenate"));
    assert!(!out.exists());
}

#[test]
fn vanished_or_corrupt_pages_fail_the_merge() {
    let dir = tempfile::tempdir().unwrap();
    let good = dir.path().join("fig1.pdf");
    write_blank_page(&good, 10.0, 10.0, None).unwrap();
    let gone = dir.path().join("fig2.pdf");
    let junk = dir.path().join("fig3.pdf");
    std::fs::write(&junk, b"not a pdf").unwrap();

    let out = dir.path().join("all.pdf");
    let err = merge(&[good.clone(), gone.clone()], &out).unwrap_err();
    assert!(matches!(&err, FigError::Merge { path, .. } if *path == gone));

    let err = merge(&[good, junk.clone()], &out).unwrap_err();
    assert!(matches!(&err, FigError::Merge { path, .. } if *path == junk));
    assert!(!out.exists());
}
