//! Hello Plugin - A simple example plugin for hatch
//!
//! This plugin demonstrates:
//! - Exporting plugin types with the `export_plugin!` macro
//! - Implementing the `Plugin` trait
//! - Keeping state across responses (`on_response`)
//!
//! ## Building
//!
//! ```bash
//! cargo build --release
//! ```
//!
//! ## Installing
//!
//! The host looks for an archive entry named `plugin.so` (`plugin.dylib`
//! on macOS, `plugin.dll` on Windows):
//!
//! ```bash
//! mkdir -p hello ~/.config/hatch/plugins/generic/hello
//! cp target/release/libhello_plugin.so hello/plugin.so
//! zip -r ~/.config/hatch/plugins/generic/hello/hello.zip hello
//! hatch plugin allow hello
//! ```

use hatch_plugin_api::{Plugin, PluginError, PluginManifest, export_plugin};

/// Signs every response and counts how many it has seen.
#[derive(Default)]
pub struct HelloPlugin {
    responses: u32,
}

impl Plugin for HelloPlugin {
    fn manifest(&self) -> PluginManifest {
        PluginManifest {
            name: "hello".to_string(),
            version: "0.1.0".to_string(),
            description: "Appends a greeting to every response".to_string(),
            author: "hatch-team".to_string(),
            ..Default::default()
        }
    }

    fn on_load(&mut self) -> Result<(), PluginError> {
        self.responses = 0;
        Ok(())
    }

    fn can_handle_on_response(&self) -> bool {
        true
    }

    fn on_response(&mut self, response: &str) -> String {
        self.responses += 1;
        format!("{response}\n\n(hello #{})", self.responses)
    }
}

export_plugin!(HelloPlugin);
