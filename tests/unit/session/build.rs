use super::*;
use crate::stock::blank::write_blank_page;
use serde_json::json;

fn session(dir: &Path, doc: &str, opts: BuildOpts) -> FigureSession {
    let figures = FigureSet::from_json_str(doc).unwrap();
    let opts = BuildOpts {
        out_dir: dir.join("fig"),
        output_name: dir.join("figures.pdf"),
        ..opts
    };
    let mut s = FigureSession::from_figures(figures, dir, opts);
    s.register_fn("hello", |call| {
        write_blank_page(&call.out_path, 50.0, 50.0, None)?;
        Ok(Some(json!({ "id": call.id })))
    });
    s.register_fn("quiet", |call| {
        write_blank_page(&call.out_path, 50.0, 50.0, None)?;
        Ok(None)
    });
    s.register_fn("lazy", |_| Ok(None));
    s.register_fn("broken", |_| anyhow::bail!("exploded"));
    s
}

#[test]
fn build_renders_every_figure_and_merges() {
    let dir = tempfile::tempdir().unwrap();
    let mut s = session(
        dir.path(),
        r#"{"1": {"type": "hello"}, "2": {"type": "quiet"}}"#,
        BuildOpts::default(),
    );
    let report = s.build().unwrap();

    assert_eq!(report.combined, Some(dir.path().join("figures.pdf")));
    assert!(dir.path().join("figures.pdf").is_file());
    assert_eq!(
        report.pages(),
        vec![s.page_path("1").as_path(), s.page_path("2").as_path()]
    );
    assert_eq!(s.result("1"), Some(&json!({"id": "1"})));
    assert_eq!(s.result("2"), Some(&Value::Null));
    assert_eq!(s.state(), &RunState::Done);
}

#[test]
fn renderer_failure_aborts_with_the_figure_id() {
    let dir = tempfile::tempdir().unwrap();
    let mut s = session(
        dir.path(),
        r#"{"1": {"type": "hello"}, "2": {"type": "broken"}, "3": {"type": "hello"}}"#,
        BuildOpts::default(),
    );
    let err = s.build().unwrap_err();

    assert!(matches!(&err, FigError::Render { id, .. } if id == "2"));
    assert!(err.to_string().contains("exploded"));
    assert!(!s.page_path("3").exists());
    assert!(!dir.path().join("figures.pdf").exists());
    assert!(matches!(
        s.state(),
        RunState::Aborted { figure_id: Some(id), .. } if id == "2"
    ));
}

#[test]
fn missing_page_is_reported_even_if_a_stale_one_existed() {
    let dir = tempfile::tempdir().unwrap();
    let mut s = session(dir.path(), r#"{"7": {"type": "lazy"}}"#, BuildOpts::default());
    std::fs::create_dir_all(dir.path().join("fig")).unwrap();
    write_blank_page(&s.page_path("7"), 10.0, 10.0, None).unwrap();

    let err = s.build().unwrap_err();
    assert!(matches!(err, FigError::OutputMissing { id, .. } if id == "7"));
    // the renderer ran, so its (empty) result is still recorded
    assert_eq!(s.result("7"), Some(&Value::Null));
}

#[test]
fn best_effort_skips_failures_and_merges_the_rest() {
    let dir = tempfile::tempdir().unwrap();
    let opts = BuildOpts {
        best_effort: true,
        ..BuildOpts::default()
    };
    let mut s = session(
        dir.path(),
        r#"{"1": {"type": "broken"}, "2": {"type": "hello"}, "3": {"type": "nope"}}"#,
        opts,
    );
    let report = s.build().unwrap();

    assert_eq!(report.skipped_ids(), vec!["1", "3"]);
    assert!(matches!(report.skipped[1].error, FigError::Resolve { .. }));
    assert_eq!(report.pages(), vec![s.page_path("2").as_path()]);
    assert!(report.combined.is_some());
}

#[test]
fn best_effort_with_nothing_left_fails_the_merge() {
    let dir = tempfile::tempdir().unwrap();
    let opts = BuildOpts {
        best_effort: true,
        ..BuildOpts::default()
    };
    let mut s = session(dir.path(), r#"{"1": {"type": "broken"}}"#, opts);
    let err = s.build().unwrap_err();
    assert!(err.to_string().contains("nothing to concatenate"));
}

#[test]
fn failing_child_skips_its_parent_in_best_effort() {
    let dir = tempfile::tempdir().unwrap();
    let opts = BuildOpts {
        best_effort: true,
        ..BuildOpts::default()
    };
    let mut s = session(
        dir.path(),
        r#"{
            "m": {"type": "multi", "row": 1, "column": 2,
                  "figures": {"ma": {"type": "hello"}, "mb": {"type": "broken"}}},
            "z": {"type": "hello"}
        }"#,
        opts,
    );
    let report = s.build().unwrap();

    assert_eq!(report.skipped_ids(), vec!["m", "mb"]);
    assert!(!s.page_path("m").exists());
    assert_eq!(report.pages(), vec![s.page_path("z").as_path()]);
}

#[test]
fn build_one_renders_a_multi_without_merging() {
    let dir = tempfile::tempdir().unwrap();
    let mut s = session(
        dir.path(),
        r#"{
            "1": {"type": "hello"},
            "3": {"type": "multi", "row": 1, "column": 2,
                  "figures": {"3a": {"type": "hello"}, "3b": {"type": "quiet"}}}
        }"#,
        BuildOpts::default(),
    );
    let report = s.build_one("3").unwrap();

    assert!(report.combined.is_none());
    assert_eq!(report.artifacts.len(), 1);
    let artifact = &report.artifacts[0];
    assert_eq!(artifact.id, "3");
    assert_eq!(artifact.order, 1);
    let children: Vec<_> = artifact.children.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(children, vec!["3a", "3b"]);
    assert!(s.page_path("3").is_file());
    assert!(!s.page_path("1").exists());
    assert!(!dir.path().join("figures.pdf").exists());
    assert_eq!(s.result("3a"), Some(&json!({"id": "3a"})));
    assert_eq!(s.result("3"), None);
}

#[test]
fn build_one_requires_a_top_level_id() {
    let dir = tempfile::tempdir().unwrap();
    let mut s = session(
        dir.path(),
        r#"{"3": {"type": "multi", "row": 1, "column": 1, "figures": {"3a": {"type": "hello"}}}}"#,
        BuildOpts::default(),
    );
    assert!(matches!(s.build_one("3a"), Err(FigError::Spec { .. })));
    assert!(matches!(s.build_one("9"), Err(FigError::Spec { .. })));
}

#[test]
fn open_uses_the_document_directory_as_base_dir() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("figs.json");
    std::fs::write(&path, r#"{"1": {"type": "blank"}}"#).unwrap();

    let s = FigureSession::open(&path, BuildOpts::default()).unwrap();
    assert_eq!(s.registry().base_dir(), dir.path());
    assert_eq!(s.figures().len(), 1);
    assert_eq!(s.state(), &RunState::Ready);
}

#[test]
fn failed_load_aborts_the_session() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.json");
    std::fs::write(&path, "[1, 2]").unwrap();

    let mut s = FigureSession::new(dir.path(), BuildOpts::default());
    assert!(matches!(s.load(&path), Err(FigError::Spec { .. })));
    assert!(matches!(s.state(), RunState::Aborted { figure_id: None, .. }));
}

#[test]
fn default_opts() {
    let opts = BuildOpts::default();
    assert_eq!(opts.out_dir, PathBuf::from("fig"));
    assert_eq!(opts.output_name, PathBuf::from("figures.pdf"));
    assert_eq!(opts.verbosity, 1);
    assert!(!opts.best_effort);
}

#[test]
fn relative_output_name_lands_in_out_dir() {
    let dir = tempfile::tempdir().unwrap();
    let figures = FigureSet::from_json_str(r#"{"1": {"type": "blank"}}"#).unwrap();
    let opts = BuildOpts {
        out_dir: dir.path().join("fig"),
        ..BuildOpts::default()
    };
    let mut s = FigureSession::from_figures(figures, dir.path(), opts);
    assert_eq!(s.combined_path(), dir.path().join("fig").join("figures.pdf"));

    let report = s.build().unwrap();
    assert_eq!(report.combined, Some(dir.path().join("fig").join("figures.pdf")));
    assert!(dir.path().join("fig").join("figures.pdf").is_file());
    assert!(!Path::new("figures.pdf").exists());
}

#[test]
fn page_clashing_with_the_combined_document_is_refused() {
    let dir = tempfile::tempdir().unwrap();
    let figures = FigureSet::from_json_str(
        r#"{"1": {"type": "blank"},
            "m": {"type": "multi", "row": 1, "column": 1, "figures": {"ures": {"type": "blank"}}}}"#,
    )
    .unwrap();
    let opts = BuildOpts {
        out_dir: dir.path().join("fig"),
        ..BuildOpts::default()
    };
    let mut s = FigureSession::from_figures(figures, dir.path(), opts);

    let err = s.build().unwrap_err();
    assert!(matches!(&err, FigError::Spec { id: Some(id), .. } if id == "ures"));
    assert!(!s.page_path("1").exists());
}

#[test]
fn unremovable_stale_page_is_attributed_to_its_figure() {
    let dir = tempfile::tempdir().unwrap();
    let mut s = session(dir.path(), r#"{"5": {"type": "hello"}}"#, BuildOpts::default());
    std::fs::create_dir_all(s.page_path("5")).unwrap();

    let err = s.build().unwrap_err();
    assert!(matches!(&err, FigError::Io { .. }));
    assert_eq!(err.figure_id(), Some("5"));
    assert!(matches!(
        s.state(),
        RunState::Aborted { figure_id: Some(id), .. } if id == "5"
    ));
}
