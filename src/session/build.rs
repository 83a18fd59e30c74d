use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::foundation::error::{FigError, FigResult};
use crate::merge::merge;
use crate::registry::renderer::{RenderCall, Renderer};
use crate::registry::resolve::RendererRegistry;
use crate::session::dispatch::Dispatcher;
use crate::session::report::{BuildReport, SkippedFigure, attribute_by_page};
use crate::spec::load::load;
use crate::spec::model::{FigureKind, FigureSet, FigureSpec, page_file_name};

/// Options controlling where and how a session builds.
#[derive(Clone, Debug)]
pub struct BuildOpts {
    /// Directory receiving the per-figure page files.
    pub out_dir: PathBuf,
    /// Combined document; a relative path is taken inside `out_dir`.
    pub output_name: PathBuf,
    /// Verbosity passed to every renderer (0 quiet, 1 normal, 2+ debug).
    pub verbosity: u8,
    /// Log and skip figures whose renderer fails instead of aborting.
    pub best_effort: bool,
}

impl Default for BuildOpts {
    fn default() -> Self {
        Self {
            out_dir: PathBuf::from("fig"),
            output_name: PathBuf::from("figures.pdf"),
            verbosity: 1,
            best_effort: false,
        }
    }
}

/// Where a session is in its run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RunState {
    /// Created, nothing loaded.
    Init,
    /// Reading and validating the document.
    Loading,
    /// Document loaded; nothing dispatched yet.
    Ready,
    /// Rendering a single figure.
    Dispatching,
    /// Rendering and tiling a multi figure.
    Composing,
    /// Concatenating top-level pages.
    Merging,
    /// The last build finished successfully.
    Done,
    /// The last load or build failed.
    Aborted {
        /// Figure the failure is attributed to, if any.
        figure_id: Option<String>,
        /// Rendered error message.
        cause: String,
    },
}

/// One figure document bound to a registry and an output directory.
///
/// Results of the last build are kept by figure id; a renderer that returned nothing is
/// recorded as `null`.
#[derive(Debug)]
pub struct FigureSession {
    figures: FigureSet,
    opts: BuildOpts,
    registry: RendererRegistry,
    results: Map<String, Value>,
    state: RunState,
}

impl FigureSession {
    /// A session with no figures; module paths resolve against `base_dir`.
    pub fn new(base_dir: impl Into<PathBuf>, opts: BuildOpts) -> Self {
        Self {
            figures: FigureSet::default(),
            opts,
            registry: RendererRegistry::new(base_dir),
            results: Map::new(),
            state: RunState::Init,
        }
    }

    /// Load the document at `path`; its directory becomes the base directory.
    pub fn open(path: impl AsRef<Path>, opts: BuildOpts) -> FigResult<Self> {
        let path = path.as_ref();
        let base_dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let mut session = Self::new(base_dir, opts);
        session.load(path)?;
        Ok(session)
    }

    /// A session over an already-loaded document.
    pub fn from_figures(figures: FigureSet, base_dir: impl Into<PathBuf>, opts: BuildOpts) -> Self {
        let mut session = Self::new(base_dir, opts);
        session.figures = figures;
        session.state = RunState::Ready;
        session
    }

    /// Replace the session's document with the one at `path`.
    pub fn load(&mut self, path: impl AsRef<Path>) -> FigResult<()> {
        self.state = RunState::Loading;
        match load(path) {
            Ok(figures) => {
                self.figures = figures;
                self.results.clear();
                self.state = RunState::Ready;
                Ok(())
            }
            Err(err) => Err(self.abort(err)),
        }
    }

    /// The loaded document.
    pub fn figures(&self) -> &FigureSet {
        &self.figures
    }

    /// Build options.
    pub fn opts(&self) -> &BuildOpts {
        &self.opts
    }

    /// The session's renderer registry.
    pub fn registry(&self) -> &RendererRegistry {
        &self.registry
    }

    /// Mutable access to the registry, e.g. to `reset()` it.
    pub fn registry_mut(&mut self) -> &mut RendererRegistry {
        &mut self.registry
    }

    /// Register a renderer under `name`.
    pub fn register(&mut self, name: impl Into<String>, renderer: Arc<dyn Renderer>) {
        self.registry.register(name, renderer);
    }

    /// Register a closure renderer under `name`.
    pub fn register_fn<F>(&mut self, name: impl Into<String>, f: F)
    where
        F: Fn(&RenderCall) -> anyhow::Result<Option<Value>> + Send + Sync + 'static,
    {
        self.registry.register_fn(name, f);
    }

    /// Current run state.
    pub fn state(&self) -> &RunState {
        &self.state
    }

    /// Renderer results of the last build, by figure id (children included).
    pub fn results(&self) -> &Map<String, Value> {
        &self.results
    }

    /// Renderer result for `id`; `Some(Value::Null)` when the renderer returned nothing.
    pub fn result(&self, id: &str) -> Option<&Value> {
        self.results.get(id)
    }

    /// Page file for figure `id`.
    pub fn page_path(&self, id: &str) -> PathBuf {
        self.opts.out_dir.join(page_file_name(id))
    }

    /// Where the combined document is written: `output_name` resolved against `out_dir`.
    pub fn combined_path(&self) -> PathBuf {
        self.opts.out_dir.join(&self.opts.output_name)
    }

    /// Render every top-level figure in declaration order and concatenate their pages.
    pub fn build(&mut self) -> FigResult<BuildReport> {
        let outcome = self.run(None);
        self.finish(outcome)
    }

    /// Render one top-level figure (with its children for a multi) without concatenating.
    pub fn build_one(&mut self, id: &str) -> FigResult<BuildReport> {
        let outcome = self.run(Some(id));
        self.finish(outcome)
    }

    fn run(&mut self, only: Option<&str>) -> FigResult<BuildReport> {
        let Self {
            figures,
            opts,
            registry,
            results,
            state,
        } = self;
        results.clear();

        let selected: Vec<(usize, &FigureSpec)> = match only {
            None => figures.iter().enumerate().collect(),
            Some(id) => {
                let found = figures.iter().enumerate().find(|(_, f)| f.id == id);
                let Some(found) = found else {
                    return Err(FigError::spec(format!("no top-level figure with id '{id}'")));
                };
                vec![found]
            }
        };
        if selected.is_empty() {
            return Err(FigError::spec("document declares no figures"));
        }
        for (_, spec) in &selected {
            if let FigureKind::Multi(multi) = &spec.kind {
                multi
                    .check_geometry()
                    .map_err(|e| e.attributed_to(&spec.id))?;
            }
        }

        let combined = opts.out_dir.join(&opts.output_name);
        for (_, spec) in &selected {
            check_page_clash(spec, &opts.out_dir, &combined)?;
        }

        std::fs::create_dir_all(&opts.out_dir)
            .map_err(|source| FigError::io(&opts.out_dir, source))?;

        let mut report = BuildReport::default();
        let mut dispatcher = Dispatcher::new(registry, results, &opts.out_dir, opts.verbosity);
        for (order, spec) in selected {
            *state = if spec.is_multi() {
                RunState::Composing
            } else {
                RunState::Dispatching
            };
            tracing::debug!(id = %spec.id, state = ?state, "dispatching figure");
            match dispatcher.dispatch(spec, order) {
                Ok(artifact) => report.artifacts.push(artifact),
                Err(err) if opts.best_effort && err.is_skippable() => {
                    tracing::warn!(id = %spec.id, error = %err, "skipping figure");
                    report.skipped.push(SkippedFigure {
                        id: spec.id.clone(),
                        error: err,
                    });
                }
                Err(err) => return Err(err),
            }
        }

        if only.is_none() {
            *state = RunState::Merging;
            let pages: Vec<PathBuf> = report.artifacts.iter().map(|a| a.page.clone()).collect();
            let combined = merge(&pages, &combined)
                .map_err(|e| attribute_by_page(e, &report.artifacts))?;
            report.combined = Some(combined);
        }
        Ok(report)
    }

    fn finish(&mut self, outcome: FigResult<BuildReport>) -> FigResult<BuildReport> {
        match outcome {
            Ok(report) => {
                self.state = RunState::Done;
                Ok(report)
            }
            Err(err) => Err(self.abort(err)),
        }
    }

    fn abort(&mut self, err: FigError) -> FigError {
        tracing::debug!(error = %err, "run aborted");
        self.state = RunState::Aborted {
            figure_id: err.figure_id().map(str::to_string),
            cause: err.to_string(),
        };
        err
    }
}

/// Refuse figures whose page would overwrite the combined document.
fn check_page_clash(spec: &FigureSpec, out_dir: &Path, combined: &Path) -> FigResult<()> {
    let children = match &spec.kind {
        FigureKind::Multi(multi) => multi.figures.as_slice(),
        FigureKind::Single { .. } => &[],
    };
    for figure in std::iter::once(spec).chain(children) {
        if out_dir.join(page_file_name(&figure.id)) == combined {
            return Err(FigError::spec(format!(
                "page file would overwrite the combined document '{}'",
                combined.display()
            ))
            .attributed_to(&figure.id));
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/session/build.rs"]
mod tests;
