//! hatch-core: plugin discovery and activation for hatch
//!
//! The [`plugins`] module finds plugins on disk, decides which of them may
//! run, and turns the chosen ones into an [`ActivatedPluginSet`] the host
//! keeps in its configuration.
//!
//! # Quick Start
//!
//! ```no_run
//! use hatch_core::{PluginHost, PluginHostConfig, PluginPolicy, PolicyOnlyPrompt};
//!
//! fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     let host = PluginHost::new(PluginHostConfig::default());
//!     let policy = PluginPolicy::new(["hello"], Vec::<String>::new());
//!
//!     let plugins = host.initialize(&policy, &mut PolicyOnlyPrompt)?;
//!     for plugin in &plugins {
//!         println!("{}", plugin.summary());
//!     }
//!     Ok(())
//! }
//! ```

pub mod plugins;

pub use plugins::{
    ActivatedPlugin, ActivatedPluginSet, HostConfig, PluginCandidate, PluginHost,
    PluginHostConfig, PluginHostError, PluginPolicy, PluginPrompt, PolicyOnlyPrompt,
    TerminalPrompt, init_plugins,
};
