use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use crate::compose::multi::compose_multi;
use crate::foundation::error::{FigError, FigResult};
use crate::registry::renderer::RenderCall;
use crate::registry::resolve::RendererRegistry;
use crate::session::report::OutputArtifact;
use crate::spec::model::{FigureKind, FigureSpec, page_file_name};

/// Resolves, invokes and verifies renderers for one build.
///
/// The dispatcher never draws anything itself: it hands each renderer the path it must write,
/// records the returned value and checks that the page exists afterwards.
pub(crate) struct Dispatcher<'a> {
    registry: &'a mut RendererRegistry,
    results: &'a mut Map<String, Value>,
    out_dir: &'a Path,
    verbosity: u8,
}

impl<'a> Dispatcher<'a> {
    pub(crate) fn new(
        registry: &'a mut RendererRegistry,
        results: &'a mut Map<String, Value>,
        out_dir: &'a Path,
        verbosity: u8,
    ) -> Self {
        Self {
            registry,
            results,
            out_dir,
            verbosity,
        }
    }

    pub(crate) fn page_path(&self, id: &str) -> PathBuf {
        self.out_dir.join(page_file_name(id))
    }

    /// Produce the page for a top-level figure, composing multi figures.
    pub(crate) fn dispatch(&mut self, spec: &FigureSpec, order: usize) -> FigResult<OutputArtifact> {
        match &spec.kind {
            FigureKind::Single { type_name } => self.render_single(spec, type_name, order),
            FigureKind::Multi(multi) => compose_multi(self, spec, multi, order),
        }
    }

    #[tracing::instrument(skip(self, spec), fields(id = %spec.id))]
    pub(crate) fn render_single(
        &mut self,
        spec: &FigureSpec,
        type_name: &str,
        order: usize,
    ) -> FigResult<OutputArtifact> {
        let renderer = self
            .registry
            .resolve(type_name)
            .map_err(|e| e.attributed_to(&spec.id))?;

        let out_path = self.page_path(&spec.id);
        remove_stale_page(&out_path).map_err(|e| e.attributed_to(&spec.id))?;

        let call = RenderCall {
            id: spec.id.clone(),
            data: spec.data.clone(),
            attrs: spec.attrs.clone(),
            verbosity: self.verbosity,
            out_path: out_path.clone(),
            base_dir: self.registry.base_dir().to_path_buf(),
        };
        tracing::debug!("invoking renderer");
        let value = renderer.render(&call).map_err(|source| FigError::Render {
            id: spec.id.clone(),
            source,
        })?;
        self.results
            .insert(spec.id.clone(), value.unwrap_or(Value::Null));

        if !out_path.is_file() {
            return Err(FigError::OutputMissing {
                id: spec.id.clone(),
                path: out_path,
            });
        }
        tracing::info!(page = %out_path.display(), "rendered figure");
        Ok(OutputArtifact {
            id: spec.id.clone(),
            order,
            page: out_path,
            children: Vec::new(),
        })
    }
}

/// A page left over from an earlier run must not satisfy output verification.
fn remove_stale_page(path: &Path) -> FigResult<()> {
    match std::fs::remove_file(path) {
        Ok(()) => {
            tracing::debug!(page = %path.display(), "removed stale page");
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(source) => Err(FigError::io(path, source)),
    }
}
