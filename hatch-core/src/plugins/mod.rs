//! Plugin system for hatch
//!
//! Plugins live under a plugin root (by default `~/.config/hatch/plugins/`)
//! in two convention directories:
//!
//! - `generic/<name>/*.zip` - code archives carrying a native module whose
//!   file name ends with [`ENTRY_MODULE_FILENAME`]
//! - `openai/<name>/` - remote-API plugins: an optional `manifest.json` and
//!   an `openapi.{json,yaml,yml}` description
//!
//! Discovery produces a [`Catalog`] of [`PluginCandidate`]s. The
//! [`ActivationGate`] applies a [`PluginPolicy`] (deny wins, allow passes,
//! everything else is put to a [`PluginPrompt`]) and only then are code
//! archives loaded through the [`ModuleLoader`].
//!
//! # Example
//!
//! ```ignore
//! use hatch_core::plugins::{PluginHost, PluginHostConfig, PluginPolicy, TerminalPrompt};
//!
//! let host = PluginHost::new(PluginHostConfig::default());
//! let policy = PluginPolicy::new(["weather"], ["legacy"]);
//!
//! let mut plugins = host.initialize(&policy, &mut TerminalPrompt)?;
//! let reply = plugins.dispatch_response("It is sunny");
//! ```

mod archive;
mod candidate;
mod error;
mod gate;
mod host;
mod loader;
mod policy;
mod prompt;
mod scanner;
mod spec_client;

pub use archive::{ARCHIVE_EXTENSION, ENTRY_MODULE_FILENAME, extract_entry, inspect};
pub use candidate::{
    ApiSpecBundle, CandidateKind, Catalog, Convention, PluginCandidate, RejectedCandidate,
};
pub use error::PluginHostError;
pub use gate::{ActivatedPlugin, ActivatedPluginSet, ActivationGate, Decision};
pub use host::{HostConfig, PluginHost, PluginHostConfig, init_plugins};
pub use loader::{
    LoadedModule, LoadedPlugin, ModuleHandle, ModuleLoader, ModuleRuntime, NativeModuleRuntime,
};
pub use policy::PluginPolicy;
pub use prompt::{PluginPrompt, PolicyOnlyPrompt, TerminalPrompt};
pub use scanner::{MANIFEST_FILE, ScanContext, scan};
pub use spec_client::{
    API_DESCRIPTION_FILES, ApiClient, ApiDescription, ApiFormat, ApiInfo, BindOnlyGenerator,
    ClientGenerator,
    ClientProjectConfig, Operation, RestClient, RestClientGenerator, ServerEntry, build_client,
    find_api_description, load_api_description, parse_api_description,
};
