//! hatch-plugin-api - Plugin API for the hatch plugin host
//!
//! This crate provides the traits and types needed to write plugins that the
//! hatch host can discover, activate, and call. Plugins are native Rust
//! dynamic libraries shipped inside a zip package; the host extracts the
//! library, checks the API version, and asks it to register its plugins.
//!
//! # Example
//!
//! ```ignore
//! use hatch_plugin_api::{Plugin, PluginManifest, export_plugin};
//!
//! #[derive(Default)]
//! pub struct ShoutPlugin;
//!
//! impl Plugin for ShoutPlugin {
//!     fn manifest(&self) -> PluginManifest {
//!         PluginManifest {
//!             name: "shout".to_string(),
//!             version: "0.1.0".to_string(),
//!             description: "Uppercases every response".to_string(),
//!             ..Default::default()
//!         }
//!     }
//!
//!     fn can_handle_on_response(&self) -> bool {
//!         true
//!     }
//!
//!     fn on_response(&mut self, response: &str) -> String {
//!         response.to_uppercase()
//!     }
//! }
//!
//! export_plugin!(ShoutPlugin);
//! ```

pub mod error;
pub mod registrar;
pub mod template;
pub mod types;

pub use error::PluginError;
pub use registrar::{PluginRegistrar, RESERVED_PREFIX};
pub use template::PluginTemplate;
pub use types::*;

/// Current plugin API version. Plugins must match this exactly.
/// This is checked when loading plugins to ensure compatibility.
pub const API_VERSION: u32 = 1;

/// Symbol exported by [`export_plugin!`] returning the plugin's API version.
pub const API_VERSION_SYMBOL: &[u8] = b"_hatch_plugin_api_version";

/// Symbol exported by [`export_plugin!`] that registers the module's plugins.
pub const REGISTER_SYMBOL: &[u8] = b"_hatch_plugin_register";

/// The core plugin trait - implement this to create a hatch plugin.
///
/// Every hook has a default implementation, so plugins only need to
/// override what they care about. A plugin that wants to rewrite responses
/// overrides both [`Plugin::can_handle_on_response`] and
/// [`Plugin::on_response`].
pub trait Plugin: Send + Sync {
    /// Return plugin metadata
    fn manifest(&self) -> PluginManifest;

    /// Marks the abstract template type. The host never activates templates.
    fn is_template(&self) -> bool {
        false
    }

    /// Called once after the plugin has been registered and activated.
    fn on_load(&mut self) -> Result<(), PluginError> {
        Ok(())
    }

    /// Whether this plugin wants to see responses.
    fn can_handle_on_response(&self) -> bool {
        false
    }

    /// Called with a response received from the model; returns the
    /// (possibly modified) response.
    fn on_response(&mut self, response: &str) -> String {
        response.to_string()
    }
}

/// Export one or more plugin types for dynamic loading.
///
/// This macro generates the C ABI entry points the hatch host calls after
/// opening a plugin library. Every listed type must implement [`Plugin`]
/// and [`Default`]; each is constructed with no arguments and handed to the
/// host's [`PluginRegistrar`] in the order given.
///
/// # Usage
///
/// ```ignore
/// hatch_plugin_api::export_plugin!(FooPlugin, BarPlugin);
/// ```
///
/// # Generated Functions
///
/// - `_hatch_plugin_api_version()`: Returns the API version
/// - `_hatch_plugin_register()`: Registers a fresh instance of every listed type
#[macro_export]
macro_rules! export_plugin {
    ($($plugin_type:ty),+ $(,)?) => {
        #[unsafe(no_mangle)]
        pub extern "C" fn _hatch_plugin_api_version() -> u32 {
            $crate::API_VERSION
        }

        #[unsafe(no_mangle)]
        pub extern "C" fn _hatch_plugin_register(registrar: &mut $crate::PluginRegistrar) {
            $(
                registrar.register(Box::new(<$plugin_type>::default()));
            )+
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Echo;

    impl Plugin for Echo {
        fn manifest(&self) -> PluginManifest {
            PluginManifest {
                name: "echo".to_string(),
                ..Default::default()
            }
        }
    }

    #[test]
    fn test_api_version_is_set() {
        assert_eq!(API_VERSION, 1);
    }

    #[test]
    fn test_plugin_trait_is_object_safe() {
        // This compiles only if Plugin is object-safe
        fn _takes_boxed_plugin(_: Box<dyn Plugin>) {}
    }

    #[test]
    fn test_default_hooks_pass_response_through() {
        let mut plugin = Echo;
        assert!(!plugin.is_template());
        assert!(!plugin.can_handle_on_response());
        assert_eq!(plugin.on_response("hello"), "hello");
        assert!(plugin.on_load().is_ok());
    }

    #[test]
    fn test_symbol_names_match_macro() {
        assert_eq!(API_VERSION_SYMBOL, b"_hatch_plugin_api_version");
        assert_eq!(REGISTER_SYMBOL, b"_hatch_plugin_register");
    }
}
