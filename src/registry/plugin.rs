use std::collections::BTreeMap;
use std::sync::Arc;

use crate::registry::renderer::Renderer;

/// Group under which renderer plugins advertise themselves.
pub const PLUGIN_GROUP: &str = "figloom.renderers";

/// A renderer advertised by a crate linked into the final binary.
///
/// Plugins register with [`inventory`]:
///
/// ```ignore
/// fn make_sine() -> std::sync::Arc<dyn figloom::Renderer> {
///     std::sync::Arc::new(SineRenderer)
/// }
///
/// inventory::submit! { figloom::RendererPlugin::new("sine", make_sine) }
/// ```
pub struct RendererPlugin {
    /// Registration group; only [`PLUGIN_GROUP`] entries are discovered.
    pub group: &'static str,
    /// Advertised renderer type name.
    pub name: &'static str,
    /// Factory called once per discovery.
    pub create: fn() -> Arc<dyn Renderer>,
}

impl RendererPlugin {
    /// Advertise `create` as renderer `name` under [`PLUGIN_GROUP`].
    pub const fn new(name: &'static str, create: fn() -> Arc<dyn Renderer>) -> Self {
        Self {
            group: PLUGIN_GROUP,
            name,
            create,
        }
    }
}

inventory::collect!(RendererPlugin);

/// Renderers found by one discovery pass, keyed by advertised name.
///
/// A name advertised more than once is kept with all its candidates so resolution can refuse
/// it instead of picking one arbitrarily.
pub(crate) type DiscoveredPlugins = BTreeMap<&'static str, Vec<Arc<dyn Renderer>>>;

pub(crate) fn discover_plugins() -> DiscoveredPlugins {
    let mut found = DiscoveredPlugins::new();
    for plugin in inventory::iter::<RendererPlugin> {
        if plugin.group != PLUGIN_GROUP {
            continue;
        }
        found
            .entry(plugin.name)
            .or_default()
            .push((plugin.create)());
    }
    tracing::debug!(count = found.len(), group = PLUGIN_GROUP, "discovered renderer plugins");
    found
}
