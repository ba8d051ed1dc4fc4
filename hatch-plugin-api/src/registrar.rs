//! PluginRegistrar - collects the plugins a module announces

use crate::Plugin;

/// Manifest names starting with this prefix are module internals, not plugins.
pub const RESERVED_PREFIX: &str = "__";

/// Host-side collector passed to a plugin module's register entry point.
///
/// A module calls [`PluginRegistrar::register`] once per concrete plugin it
/// provides. Registration order is preserved. Templates and reserved names
/// are dropped at registration time so the host only ever sees concrete
/// implementations.
#[derive(Default)]
pub struct PluginRegistrar {
    plugins: Vec<Box<dyn Plugin>>,
}

impl PluginRegistrar {
    /// Create an empty registrar
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a plugin instance
    pub fn register(&mut self, plugin: Box<dyn Plugin>) {
        let manifest = plugin.manifest();

        if manifest.name.starts_with(RESERVED_PREFIX) {
            tracing::debug!(plugin = %manifest.name, "Skipping reserved plugin name");
            return;
        }

        if plugin.is_template() {
            tracing::debug!(plugin = %manifest.name, "Skipping plugin template");
            return;
        }

        self.plugins.push(plugin);
    }

    /// Number of registered plugins
    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    /// Whether nothing has been registered
    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    /// Consume the registrar, returning plugins in registration order
    pub fn into_plugins(self) -> Vec<Box<dyn Plugin>> {
        self.plugins
    }
}

impl std::fmt::Debug for PluginRegistrar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<String> = self.plugins.iter().map(|p| p.manifest().name).collect();
        f.debug_struct("PluginRegistrar")
            .field("plugins", &names)
            .finish()
    }
}
