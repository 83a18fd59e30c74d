use super::*;

#[test]
fn function_names_are_identifiers() {
    assert!(is_function_name("render_sine"));
    assert!(is_function_name("plots.sine-v2"));
    assert!(!is_function_name(""));
    assert!(!is_function_name("1st"));
    assert!(!is_function_name("has space"));
}

#[test]
fn missing_module_cannot_be_imported() {
    let err = CommandRenderer::locate("figloom-no-such-module", "render", Path::new("."))
        .unwrap_err();
    assert!(err.contains("cannot import module"));

    let err = CommandRenderer::locate("./missing/tool", "render", Path::new(".")).unwrap_err();
    assert!(err.contains("cannot import module"));
}

#[test]
fn empty_parts_are_rejected() {
    assert!(CommandRenderer::locate("", "render", Path::new(".")).is_err());
    assert!(CommandRenderer::locate("sh", "", Path::new(".")).is_err());
}

#[cfg(unix)]
mod unix {
    use super::*;
    use std::os::unix::fs::PermissionsExt as _;

    fn script(dir: &Path, name: &str, body: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        let mut perms = std::fs::metadata(&path).unwrap().permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(&path, perms).unwrap();
        path
    }

    fn call(dir: &Path) -> RenderCall {
        RenderCall {
            id: "7".to_string(),
            data: serde_json::json!({"n": 3}),
            attrs: serde_json::Map::new(),
            verbosity: 1,
            out_path: dir.join("fig7.pdf"),
            base_dir: dir.to_path_buf(),
        }
    }

    #[test]
    fn bare_names_are_found_on_path() {
        let r = CommandRenderer::locate("sh", "render", Path::new(".")).unwrap();
        assert!(r.program().is_absolute());
        assert_eq!(r.function(), "render");
    }

    #[test]
    fn relative_modules_resolve_against_base_dir() {
        let dir = tempfile::tempdir().unwrap();
        script(dir.path(), "tool.sh", "exit 0");
        let r = CommandRenderer::locate("./tool.sh", "render", dir.path()).unwrap();
        assert_eq!(r.program(), dir.path().join("./tool.sh"));
    }

    #[test]
    fn stdout_json_becomes_the_result() {
        let dir = tempfile::tempdir().unwrap();
        let prog = script(
            dir.path(),
            "echo.sh",
            r#"cat > "$FIGLOOM_OUT_PATH.request"
printf '{"fn":"%s","id":"%s"}' "$1" "$FIGLOOM_FIGURE_ID""#,
        );
        let r = CommandRenderer::locate(prog.to_str().unwrap(), "sine", dir.path()).unwrap();
        let out = r.render(&call(dir.path())).unwrap();
        assert_eq!(out, Some(serde_json::json!({"fn": "sine", "id": "7"})));

        let request = std::fs::read_to_string(dir.path().join("fig7.pdf.request")).unwrap();
        let request: Value = serde_json::from_str(&request).unwrap();
        assert_eq!(request["data"], serde_json::json!({"n": 3}));
        assert_eq!(request["verbosity"], serde_json::json!(1));
    }

    #[test]
    fn silent_program_returns_empty_result() {
        let dir = tempfile::tempdir().unwrap();
        let prog = script(dir.path(), "quiet.sh", "cat > /dev/null");
        let r = CommandRenderer::locate(prog.to_str().unwrap(), "x", dir.path()).unwrap();
        assert_eq!(r.render(&call(dir.path())).unwrap(), None);
    }

    #[test]
    fn failing_program_reports_stderr() {
        let dir = tempfile::tempdir().unwrap();
        let prog = script(dir.path(), "fail.sh", "cat > /dev/null\necho 'no data' >&2\nexit 3");
        let r = CommandRenderer::locate(prog.to_str().unwrap(), "x", dir.path()).unwrap();
        let err = r.render(&call(dir.path())).unwrap_err();
        assert!(err.to_string().contains("no data"));
    }
}
