//! Module loading for code-archive plugins

use std::fmt;
use std::panic::AssertUnwindSafe;
use std::path::Path;
use std::sync::Arc;

use hatch_plugin_api::{
    API_VERSION, API_VERSION_SYMBOL, Plugin, PluginManifest, PluginRegistrar, REGISTER_SYMBOL,
};
use libloading::Library;
use tempfile::TempDir;

use super::archive;
use super::candidate::{CandidateKind, PluginCandidate};
use super::error::PluginHostError;

/// Keeps a loaded module resident. Plugins from a module hold an `Arc` to it.
pub struct ModuleHandle {
    /// Dropped before `_dir`, so the file is closed before it is deleted
    _library: Library,
    _dir: TempDir,
}

impl fmt::Debug for ModuleHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleHandle")
            .field("dir", &self._dir.path())
            .finish()
    }
}

/// What a module registered, plus whatever keeps its code alive
pub struct LoadedModule {
    pub plugins: Vec<Box<dyn Plugin>>,
    pub handle: Option<ModuleHandle>,
}

/// Loads a module's entry point out of an archive.
///
/// Each call must load into its own context: two archives exporting the same
/// symbols may never see each other.
pub trait ModuleRuntime: Send + Sync {
    fn load_module(
        &self,
        archive_path: &Path,
        entry_module_path: &str,
    ) -> Result<LoadedModule, PluginHostError>;
}

/// Loads native plugin libraries with `libloading`.
///
/// The entry module is extracted into a private temporary directory per
/// archive and opened as a separate library.
#[derive(Debug, Default, Clone, Copy)]
pub struct NativeModuleRuntime;

impl ModuleRuntime for NativeModuleRuntime {
    fn load_module(
        &self,
        archive_path: &Path,
        entry_module_path: &str,
    ) -> Result<LoadedModule, PluginHostError> {
        let dir = tempfile::Builder::new().prefix("hatch-module-").tempdir()?;
        let lib_path = archive::extract_entry(archive_path, entry_module_path, dir.path())?;

        // SAFETY: The library is a plugin the user activated through the
        // policy gate. It is expected to follow the export_plugin! contract.
        let library = unsafe { Library::new(&lib_path) }
            .map_err(|e| PluginHostError::module_load(archive_path, e))?;

        let plugins = {
            // SAFETY: Symbol generated by export_plugin! with this signature.
            let api_version_fn: libloading::Symbol<extern "C" fn() -> u32> =
                unsafe { library.get(API_VERSION_SYMBOL) }
                    .map_err(|e| PluginHostError::module_load(archive_path, e))?;

            let found = api_version_fn();
            if found != API_VERSION {
                return Err(PluginHostError::ApiVersionMismatch {
                    expected: API_VERSION,
                    found,
                });
            }

            // SAFETY: Symbol generated by export_plugin! with this signature.
            let register_fn: libloading::Symbol<extern "C" fn(&mut PluginRegistrar)> =
                unsafe { library.get(REGISTER_SYMBOL) }
                    .map_err(|e| PluginHostError::module_load(archive_path, e))?;

            let mut registrar = PluginRegistrar::new();
            register_fn(&mut registrar);
            registrar.into_plugins()
        };

        Ok(LoadedModule {
            plugins,
            handle: Some(ModuleHandle {
                _library: library,
                _dir: dir,
            }),
        })
    }
}

/// A concrete plugin instance from a code archive
pub struct LoadedPlugin {
    manifest: PluginManifest,
    instance: Box<dyn Plugin>,
    /// Declared after `instance` so the module outlives the instance
    _module: Option<Arc<ModuleHandle>>,
}

impl LoadedPlugin {
    pub fn new(instance: Box<dyn Plugin>, module: Option<Arc<ModuleHandle>>) -> Self {
        Self {
            manifest: instance.manifest(),
            instance,
            _module: module,
        }
    }

    pub fn manifest(&self) -> &PluginManifest {
        &self.manifest
    }

    pub fn name(&self) -> &str {
        &self.manifest.name
    }

    pub fn version(&self) -> &str {
        &self.manifest.version
    }

    pub fn description(&self) -> &str {
        &self.manifest.description
    }

    pub fn can_handle_on_response(&self) -> bool {
        self.instance.can_handle_on_response()
    }

    pub fn on_response(&mut self, response: &str) -> String {
        self.instance.on_response(response)
    }
}

impl fmt::Debug for LoadedPlugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadedPlugin")
            .field("manifest", &self.manifest)
            .finish_non_exhaustive()
    }
}

/// Turns code-archive candidates into plugin instances
pub struct ModuleLoader {
    runtime: Box<dyn ModuleRuntime>,
}

impl Default for ModuleLoader {
    fn default() -> Self {
        Self::new(Box::new(NativeModuleRuntime))
    }
}

impl ModuleLoader {
    pub fn new(runtime: Box<dyn ModuleRuntime>) -> Self {
        Self { runtime }
    }

    /// Load every code-archive candidate, in order.
    ///
    /// A candidate whose module fails to load is skipped with a warning.
    /// Candidates of other conventions are ignored.
    pub fn load<'a>(
        &self,
        candidates: impl IntoIterator<Item = &'a PluginCandidate>,
    ) -> Vec<LoadedPlugin> {
        let mut loaded = Vec::new();

        for candidate in candidates {
            match self.load_candidate(candidate) {
                Ok(plugins) => loaded.extend(plugins),
                Err(e) => {
                    tracing::warn!(plugin = %candidate.name, error = %e, "Failed to load plugin module");
                }
            }
        }

        loaded
    }

    /// Load one candidate's module and initialise the plugins it registers.
    ///
    /// Plugins whose `on_load` fails or panics are dropped individually.
    pub fn load_candidate(
        &self,
        candidate: &PluginCandidate,
    ) -> Result<Vec<LoadedPlugin>, PluginHostError> {
        let CandidateKind::CodeArchive {
            archive_path,
            entry_module_path,
        } = &candidate.kind
        else {
            tracing::debug!(plugin = %candidate.name, "Not a code archive, nothing to load");
            return Ok(Vec::new());
        };

        let module = self.runtime.load_module(archive_path, entry_module_path)?;
        let handle = module.handle.map(Arc::new);

        let mut loaded = Vec::new();
        for mut instance in module.plugins {
            let name = instance.manifest().name;
            let result =
                std::panic::catch_unwind(AssertUnwindSafe(|| instance.on_load()));

            match result {
                Ok(Ok(())) => {
                    tracing::debug!(module = %candidate.name, plugin = %name, "Plugin instantiated");
                    loaded.push(LoadedPlugin::new(instance, handle.clone()));
                }
                Ok(Err(e)) => {
                    tracing::warn!(module = %candidate.name, plugin = %name, error = %e, "Plugin on_load error, skipping");
                }
                Err(_) => {
                    tracing::error!(module = %candidate.name, plugin = %name, "Plugin panicked in on_load, skipping");
                }
            }
        }

        Ok(loaded)
    }
}
