use super::*;
use serde_json::json;

const DOC: &str = r#"{
  "2": {"type": "sine", "title": "Second", "data": {"amplitude": 2.0}},
  "1": {
    "type": "multi", "row": 1, "column": 2,
    "figures": {"1b": {"type": "hist"}, "1a": {"type": "sine"}}
  }
}"#;

#[test]
fn declaration_order_is_preserved() {
    let set = FigureSet::from_json_str(DOC).unwrap();
    assert_eq!(set.ids().collect::<Vec<_>>(), vec!["2", "1"]);

    let FigureKind::Multi(multi) = &set.top_level("1").unwrap().kind else {
        panic!("expected multi");
    };
    let child_ids: Vec<_> = multi.figures.iter().map(|f| f.id.as_str()).collect();
    assert_eq!(child_ids, vec!["1b", "1a"]);
}

#[test]
fn data_and_attrs_are_split() {
    let set = FigureSet::from_json_str(DOC).unwrap();
    let fig = set.get("2").unwrap();
    assert_eq!(fig.type_name(), "sine");
    assert_eq!(fig.data, json!({"amplitude": 2.0}));
    assert_eq!(fig.attrs.get("title"), Some(&json!("Second")));
    assert!(!fig.attrs.contains_key("type"));
}

#[test]
fn lookup_reaches_nested_figures() {
    let set = FigureSet::from_json_str(DOC).unwrap();
    assert_eq!(set.get("1a").unwrap().type_name(), "sine");
    assert!(set.top_level("1a").is_none());
    assert!(set.get("missing").is_none());
    assert!(set.get("1").unwrap().is_multi());
}

#[test]
fn load_fails_with_first_finding() {
    let err = FigureSet::from_json_str(r#"{"1": {"title": "x"}}"#).unwrap_err();
    assert!(matches!(err, FigError::Spec { .. }));
    assert_eq!(err.figure_id(), Some("1"));

    let err = FigureSet::from_json_str("{not json").unwrap_err();
    assert!(err.to_string().contains("failed to parse JSON"));
}

#[test]
fn geometry_check_matches_loader_rules() {
    let child = FigureSpec {
        id: "a".to_string(),
        kind: FigureKind::Single {
            type_name: "x".to_string(),
        },
        data: Value::Null,
        attrs: Map::new(),
    };
    let multi = MultiSpec {
        row: 1,
        column: 1,
        figures: vec![child.clone(), FigureSpec { id: "b".to_string(), ..child }],
    };
    assert!(matches!(multi.check_geometry(), Err(FigError::Config { .. })));

    let ok = MultiSpec { column: 2, ..multi };
    assert!(ok.check_geometry().is_ok());
}

#[test]
fn save_round_trips_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.json");
    let set = FigureSet::from_json_str(DOC).unwrap();
    set.save(&path).unwrap();

    let reloaded = FigureSet::from_json_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(reloaded, set);
}
