use super::*;

fn artifact(id: &str, order: usize, children: Vec<OutputArtifact>) -> OutputArtifact {
    OutputArtifact {
        id: id.to_string(),
        order,
        page: PathBuf::from(format!("fig/fig{id}.pdf")),
        children,
    }
}

#[test]
fn merge_errors_are_attributed_to_the_page_owner() {
    let artifacts = vec![
        artifact("1", 0, Vec::new()),
        artifact("3", 1, vec![artifact("3a", 0, Vec::new())]),
    ];

    let err = attribute_by_page(FigError::merge("fig/fig1.pdf", "gone"), &artifacts);
    assert_eq!(err.figure_id(), Some("1"));

    let err = attribute_by_page(FigError::merge("fig/fig3a.pdf", "gone"), &artifacts);
    assert_eq!(err.figure_id(), Some("3a"));

    let err = attribute_by_page(FigError::merge("figures.pdf", "nothing"), &artifacts);
    assert_eq!(err.figure_id(), None);

    let err = attribute_by_page(FigError::config("x"), &artifacts);
    assert_eq!(err.figure_id(), None);
}

#[test]
fn skipped_multi_reports_parent_and_child() {
    let skipped = SkippedFigure {
        id: "m".to_string(),
        error: FigError::Render {
            id: "mb".to_string(),
            source: anyhow::anyhow!("boom"),
        },
    };
    assert_eq!(skipped.ids(), vec!["m", "mb"]);

    let skipped = SkippedFigure {
        id: "1".to_string(),
        error: FigError::resolve("nope", "unknown").attributed_to("1"),
    };
    assert_eq!(skipped.ids(), vec!["1"]);
}
