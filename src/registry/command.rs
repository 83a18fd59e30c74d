use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use anyhow::Context as _;
use serde_json::Value;

use crate::registry::renderer::{RenderCall, Renderer};

/// Renderer bound from a `"module:function"` type string.
///
/// The module is an external program and the function is passed as its first argument. The
/// [`RenderCall`] is written to the program's stdin as JSON; the figure id, output path and
/// verbosity are also exported as `FIGLOOM_FIGURE_ID`, `FIGLOOM_OUT_PATH` and
/// `FIGLOOM_VERBOSITY`. Whatever the program prints on stdout becomes the figure result: JSON
/// when it parses, otherwise the trimmed text; nothing at all is an empty result.
#[derive(Clone, Debug)]
pub struct CommandRenderer {
    program: PathBuf,
    function: String,
}

impl CommandRenderer {
    /// Locate `module` and check `function`, without running anything.
    ///
    /// Modules containing a path separator are resolved against `base_dir` (unless absolute);
    /// bare names are searched on `PATH`.
    pub(crate) fn locate(module: &str, function: &str, base_dir: &Path) -> Result<Self, String> {
        if module.is_empty() {
            return Err("module part of 'module:function' is empty".to_string());
        }
        if !is_function_name(function) {
            return Err(format!("'{function}' is not a valid function name"));
        }
        let program = find_program(module, base_dir)
            .ok_or_else(|| format!("cannot import module '{module}': no such executable"))?;
        Ok(Self {
            program,
            function: function.to_string(),
        })
    }

    /// Resolved program path.
    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Function name passed to the program.
    pub fn function(&self) -> &str {
        &self.function
    }
}

impl Renderer for CommandRenderer {
    fn render(&self, call: &RenderCall) -> anyhow::Result<Option<Value>> {
        let request = serde_json::to_vec(call).context("encode render request")?;

        let mut child = Command::new(&self.program)
            .arg(&self.function)
            .env("FIGLOOM_FIGURE_ID", &call.id)
            .env("FIGLOOM_OUT_PATH", &call.out_path)
            .env("FIGLOOM_VERBOSITY", call.verbosity.to_string())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("spawn renderer program '{}'", self.program.display()))?;

        let mut stdin = child
            .stdin
            .take()
            .context("failed to open renderer stdin (unexpected)")?;
        // Feed the request from a separate thread so a chatty program cannot deadlock on stdout.
        let feeder = std::thread::spawn(move || stdin.write_all(&request));

        let output = child
            .wait_with_output()
            .context("wait for renderer program")?;
        if let Ok(Err(e)) = feeder.join()
            && e.kind() != std::io::ErrorKind::BrokenPipe
        {
            return Err(e).context("write render request to renderer stdin");
        }

        if !output.status.success() {
            anyhow::bail!(
                "renderer program '{}' ({}) exited with {}: {}",
                self.program.display(),
                self.function,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stdout = stdout.trim();
        if stdout.is_empty() {
            return Ok(None);
        }
        Ok(Some(
            serde_json::from_str(stdout).unwrap_or_else(|_| Value::String(stdout.to_string())),
        ))
    }
}

fn is_function_name(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
}

fn find_program(module: &str, base_dir: &Path) -> Option<PathBuf> {
    let as_path = Path::new(module);
    if as_path.is_absolute() || module.contains(['/', '\\']) {
        let candidate = if as_path.is_absolute() {
            as_path.to_path_buf()
        } else {
            base_dir.join(as_path)
        };
        return is_executable(&candidate).then_some(candidate);
    }

    let path_var = std::env::var_os("PATH")?;
    std::env::split_paths(&path_var)
        .flat_map(|dir| program_candidates(&dir, module))
        .find(|p| is_executable(p))
}

fn program_candidates(dir: &Path, module: &str) -> Vec<PathBuf> {
    let mut out = vec![dir.join(module)];
    if cfg!(windows) {
        out.push(dir.join(format!("{module}.exe")));
    }
    out
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt as _;
    std::fs::metadata(path)
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

#[cfg(test)]
#[path = "../../tests/unit/registry/command.rs"]
mod tests;
