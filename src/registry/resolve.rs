use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::foundation::error::{FigError, FigResult};
use crate::registry::command::CommandRenderer;
use crate::registry::plugin::{DiscoveredPlugins, PLUGIN_GROUP, discover_plugins};
use crate::registry::renderer::{RenderCall, Renderer, renderer_fn};

/// How a type string was bound to its renderer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BindingKind {
    /// Explicitly registered on the registry.
    Registered,
    /// Resolved from a `"module:function"` reference.
    ImportResolved,
    /// Found among discovered plugins.
    PluginDiscovered,
}

/// A resolved type string: its name, how it was bound, and the shared renderer.
#[derive(Clone)]
pub struct RendererBinding {
    name: String,
    kind: BindingKind,
    renderer: Arc<dyn Renderer>,
}

impl RendererBinding {
    /// The full type string this binding was resolved from.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Resolution kind.
    pub fn kind(&self) -> BindingKind {
        self.kind
    }

    /// Shared renderer handle.
    pub fn renderer(&self) -> &Arc<dyn Renderer> {
        &self.renderer
    }
}

impl fmt::Debug for RendererBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RendererBinding")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("renderer_ptr", &Arc::as_ptr(&self.renderer))
            .finish()
    }
}

/// Resolves renderer type strings with a fixed precedence and caches the outcome.
///
/// Precedence: explicitly registered names, then `"module:function"` references, then
/// plugins advertised under [`PLUGIN_GROUP`]. The first kind that applies decides; a
/// `"module:function"`-shaped string that fails to import is an error, not a plugin lookup.
///
/// Both the resolution cache and plugin discovery are scoped to this registry instance.
pub struct RendererRegistry {
    base_dir: PathBuf,
    registered: HashMap<String, Arc<dyn Renderer>>,
    resolved: HashMap<String, RendererBinding>,
    plugins: Option<DiscoveredPlugins>,
}

impl RendererRegistry {
    /// Create an empty registry; `"module:function"` paths are resolved against `base_dir`.
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            registered: HashMap::new(),
            resolved: HashMap::new(),
            plugins: None,
        }
    }

    /// Directory used to resolve relative module paths.
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Register `renderer` under the exact name `name`; the last registration wins.
    pub fn register(&mut self, name: impl Into<String>, renderer: Arc<dyn Renderer>) {
        let name = name.into();
        if self.registered.contains_key(&name) {
            tracing::debug!(%name, "replacing registered renderer");
        }
        self.resolved.remove(&name);
        self.registered.insert(name, renderer);
    }

    /// Register a closure under `name`.
    pub fn register_fn<F>(&mut self, name: impl Into<String>, f: F)
    where
        F: Fn(&RenderCall) -> anyhow::Result<Option<serde_json::Value>> + Send + Sync + 'static,
    {
        self.register(name, Arc::new(renderer_fn(f)));
    }

    /// Resolve `type_name` to a renderer, caching successful resolutions.
    pub fn resolve(&mut self, type_name: &str) -> FigResult<Arc<dyn Renderer>> {
        Ok(Arc::clone(self.resolve_binding(type_name)?.renderer()))
    }

    /// Resolve `type_name` and return the full binding.
    pub fn resolve_binding(&mut self, type_name: &str) -> FigResult<&RendererBinding> {
        if !self.resolved.contains_key(type_name) {
            let binding = self.bind(type_name)?;
            tracing::debug!(type_name, kind = ?binding.kind, "resolved renderer");
            self.resolved.insert(type_name.to_string(), binding);
        }
        self.resolved
            .get(type_name)
            .ok_or_else(|| FigError::resolve(type_name, "resolution cache lost its entry"))
    }

    /// Cached binding for `type_name`, if it has been resolved.
    pub fn binding(&self, type_name: &str) -> Option<&RendererBinding> {
        self.resolved.get(type_name)
    }

    /// Explicitly registered names, sorted.
    pub fn registered_names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.registered.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Advertised plugin names, sorted. Triggers discovery if it has not happened yet.
    pub fn plugin_names(&mut self) -> Vec<&'static str> {
        self.plugins().keys().copied().collect()
    }

    /// Forget every cached resolution and the plugin discovery result.
    ///
    /// Registered renderers are kept.
    pub fn reset(&mut self) {
        self.resolved.clear();
        self.plugins = None;
    }

    fn bind(&mut self, type_name: &str) -> FigResult<RendererBinding> {
        if let Some(renderer) = self.registered.get(type_name) {
            return Ok(RendererBinding {
                name: type_name.to_string(),
                kind: BindingKind::Registered,
                renderer: Arc::clone(renderer),
            });
        }

        if let Some((module, function)) = type_name.rsplit_once(':') {
            let renderer = CommandRenderer::locate(module, function, &self.base_dir)
                .map_err(|msg| FigError::resolve(type_name, msg))?;
            return Ok(RendererBinding {
                name: type_name.to_string(),
                kind: BindingKind::ImportResolved,
                renderer: Arc::new(renderer),
            });
        }

        let renderer = match self.plugins().get(type_name).map(Vec::as_slice) {
            Some([renderer]) => Arc::clone(renderer),
            Some(candidates) => {
                return Err(FigError::resolve(
                    type_name,
                    format!(
                        "{} plugins advertise this name under '{PLUGIN_GROUP}'",
                        candidates.len()
                    ),
                ));
            }
            None => {
                return Err(FigError::resolve(
                    type_name,
                    "not registered, not a 'module:function' reference, and no plugin advertises it",
                ));
            }
        };
        Ok(RendererBinding {
            name: type_name.to_string(),
            kind: BindingKind::PluginDiscovered,
            renderer,
        })
    }

    fn plugins(&mut self) -> &DiscoveredPlugins {
        self.plugins.get_or_insert_with(discover_plugins)
    }
}

impl fmt::Debug for RendererRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RendererRegistry")
            .field("base_dir", &self.base_dir)
            .field("registered", &self.registered_names())
            .field("resolved", &self.resolved.len())
            .field("plugins_discovered", &self.plugins.is_some())
            .finish()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/registry/resolve.rs"]
mod tests;
