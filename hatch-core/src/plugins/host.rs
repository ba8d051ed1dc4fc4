//! PluginHost - discovers, gates, and activates plugins from a plugin root

use std::path::{Path, PathBuf};

use super::candidate::{Catalog, Convention};
use super::error::PluginHostError;
use super::gate::{ActivatedPluginSet, ActivationGate};
use super::loader::{ModuleLoader, ModuleRuntime};
use super::policy::PluginPolicy;
use super::prompt::PluginPrompt;
use super::scanner::{self, ScanContext};
use super::spec_client::{ClientGenerator, ClientProjectConfig};

/// Configuration for PluginHost
#[derive(Debug, Clone)]
pub struct PluginHostConfig {
    /// Root holding the `openai/` and `generic/` convention directories
    /// (~/.config/hatch/plugins)
    pub plugins_root: PathBuf,
    /// Names used for generated API clients
    pub client_config: ClientProjectConfig,
}

impl Default for PluginHostConfig {
    fn default() -> Self {
        Self {
            plugins_root: hatch_paths::plugins_dir(),
            client_config: ClientProjectConfig::default(),
        }
    }
}

/// Host-side configuration that owns the plugin policy and the activated set
pub trait HostConfig {
    fn plugin_policy(&self) -> &PluginPolicy;
    fn set_plugins(&mut self, plugins: ActivatedPluginSet);
}

/// Runs discovery and activation for both plugin conventions
pub struct PluginHost {
    plugins_root: PathBuf,
    scan_context: ScanContext,
    loader: ModuleLoader,
}

impl PluginHost {
    /// Create a host with the default client generator and native module runtime
    pub fn new(config: PluginHostConfig) -> Self {
        Self {
            plugins_root: config.plugins_root,
            scan_context: ScanContext {
                client_config: config.client_config,
                ..ScanContext::default()
            },
            loader: ModuleLoader::default(),
        }
    }

    /// Replace the client generator used for remote-API plugins
    pub fn with_generator(mut self, generator: Box<dyn ClientGenerator>) -> Self {
        self.scan_context.generator = generator;
        self
    }

    /// Replace the runtime used to load code archives
    pub fn with_runtime(mut self, runtime: Box<dyn ModuleRuntime>) -> Self {
        self.loader = ModuleLoader::new(runtime);
        self
    }

    pub fn plugins_root(&self) -> &Path {
        &self.plugins_root
    }

    /// Directory scanned for one convention
    pub fn convention_root(&self, convention: Convention) -> PathBuf {
        self.plugins_root.join(convention.dir_name())
    }

    /// Scan one convention without activating anything
    pub fn discover(&self, convention: Convention) -> Result<Catalog, PluginHostError> {
        scanner::scan(
            &self.convention_root(convention),
            convention,
            &self.scan_context,
        )
    }

    /// Discover and activate plugins of both conventions.
    ///
    /// Remote-API plugins come first, then code-archive plugins. Only code
    /// archives that pass `policy` (or the prompt) are ever loaded.
    ///
    /// # Errors
    ///
    /// [`PluginHostError::InvalidPluginRoot`] if either convention directory
    /// is missing. Failures of individual plugins are logged and skipped.
    pub fn initialize(
        &self,
        policy: &PluginPolicy,
        prompt: &mut dyn PluginPrompt,
    ) -> Result<ActivatedPluginSet, PluginHostError> {
        let gate = ActivationGate::new(policy);
        let mut activated = ActivatedPluginSet::new();

        for convention in [Convention::ApiSpec, Convention::CodeArchive] {
            let catalog = self.discover(convention)?;
            tracing::debug!(
                %convention,
                found = catalog.len(),
                rejected = catalog.rejected.len(),
                "Scanned plugin directory"
            );
            activated.merge(gate.activate(catalog.into_candidates(), prompt, &self.loader));
        }

        for plugin in &activated {
            tracing::info!(convention = %plugin.convention(), "{}", plugin.summary());
        }
        tracing::info!(count = activated.len(), "Plugins activated");

        Ok(activated)
    }
}

/// Activate plugins under the host configuration's policy and store the result there
pub fn init_plugins<C: HostConfig>(
    host: &PluginHost,
    config: &mut C,
    prompt: &mut dyn PluginPrompt,
) -> Result<(), PluginHostError> {
    let activated = host.initialize(config.plugin_policy(), prompt)?;
    config.set_plugins(activated);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugins::archive::ENTRY_MODULE_FILENAME;
    use crate::plugins::archive::tests::write_zip;
    use crate::plugins::gate::ActivatedPlugin;
    use crate::plugins::loader::tests::{StubRuntime, register_foo};
    use tempfile::TempDir;

    const BAR_YAML: &str =
        "openapi: 3.0.0\ninfo:\n  title: Bar\n  version: '2'\nservers:\n  - url: https://bar.test\n";

    fn plugin_root() -> TempDir {
        let root = TempDir::new().unwrap();

        let foo = root.path().join("generic/foo");
        std::fs::create_dir_all(&foo).unwrap();
        write_zip(
            &foo.join("plugin.zip"),
            &[(format!("foo/{ENTRY_MODULE_FILENAME}").as_str(), "elf")],
        );

        let bar = root.path().join("openai/bar");
        std::fs::create_dir_all(&bar).unwrap();
        std::fs::write(bar.join("manifest.json"), r#"{"name":"bar"}"#).unwrap();
        std::fs::write(bar.join("openapi.yaml"), BAR_YAML).unwrap();

        root
    }

    fn host(root: &TempDir) -> PluginHost {
        let runtime =
            StubRuntime::new().with_module(root.path().join("generic/foo/plugin.zip"), register_foo);
        PluginHost::new(PluginHostConfig {
            plugins_root: root.path().to_path_buf(),
            client_config: ClientProjectConfig::default(),
        })
        .with_runtime(Box::new(runtime))
    }

    #[test]
    fn test_default_config_uses_plugins_dir() {
        let config = PluginHostConfig::default();
        assert_eq!(config.plugins_root, hatch_paths::plugins_dir());
    }

    #[test]
    fn test_convention_roots() {
        let host = PluginHost::new(PluginHostConfig {
            plugins_root: PathBuf::from("/plugins"),
            client_config: ClientProjectConfig::default(),
        });
        assert_eq!(
            host.convention_root(Convention::CodeArchive),
            PathBuf::from("/plugins/generic")
        );
        assert_eq!(
            host.convention_root(Convention::ApiSpec),
            PathBuf::from("/plugins/openai")
        );
    }

    #[test]
    fn test_initialize_orders_api_plugins_first() {
        let root = plugin_root();
        let policy = PluginPolicy::new(["foo", "bar"], Vec::<String>::new());
        let mut prompt = |_: &str| -> bool { panic!("no prompt expected") };

        let activated = host(&root).initialize(&policy, &mut prompt).unwrap();

        assert_eq!(activated.names(), vec!["bar", "foo"]);
        assert!(matches!(
            activated.get("bar"),
            Some(ActivatedPlugin::Api { .. })
        ));
        assert_eq!(
            activated.get("foo").unwrap().summary(),
            "FooPlugin: 1.0 - Says foo"
        );
    }

    #[test]
    fn test_initialize_asks_for_unlisted() {
        let root = plugin_root();
        let policy = PluginPolicy::new(Vec::<String>::new(), ["bar"]);
        let mut asked = Vec::new();
        let mut prompt = |name: &str| {
            asked.push(name.to_string());
            false
        };

        let activated = host(&root).initialize(&policy, &mut prompt).unwrap();

        assert!(activated.is_empty());
        assert_eq!(asked, vec!["foo"]);
    }

    #[test]
    fn test_initialize_requires_both_convention_dirs() {
        let root = plugin_root();
        std::fs::remove_dir_all(root.path().join("generic")).unwrap();

        let err = host(&root)
            .initialize(&PluginPolicy::default(), &mut |_: &str| true)
            .unwrap_err();
        assert!(matches!(err, PluginHostError::InvalidPluginRoot { .. }));
    }

    #[derive(Default)]
    struct TestConfig {
        policy: PluginPolicy,
        plugins: Option<ActivatedPluginSet>,
    }

    impl HostConfig for TestConfig {
        fn plugin_policy(&self) -> &PluginPolicy {
            &self.policy
        }

        fn set_plugins(&mut self, plugins: ActivatedPluginSet) {
            self.plugins = Some(plugins);
        }
    }

    #[test]
    fn test_init_plugins_stores_activated_set() {
        let root = plugin_root();
        let mut config = TestConfig {
            policy: PluginPolicy::new(["foo"], ["bar"]),
            ..TestConfig::default()
        };

        init_plugins(&host(&root), &mut config, &mut |_: &str| false).unwrap();

        let plugins = config.plugins.unwrap();
        assert_eq!(plugins.names(), vec!["foo"]);
    }
}
