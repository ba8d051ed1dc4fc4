//! Activation gate - turns candidates into activated plugins

use std::panic::AssertUnwindSafe;

use super::candidate::{ApiSpecBundle, CandidateKind, Convention, PluginCandidate};
use super::loader::{LoadedPlugin, ModuleLoader};
use super::policy::PluginPolicy;
use super::prompt::PluginPrompt;

/// Outcome of the policy check for one plugin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// On the deny list
    Denied,
    /// On the allow list
    Allowed,
    /// Unlisted, operator said yes
    Confirmed,
    /// Unlisted, operator said no
    Declined,
}

impl Decision {
    pub fn is_active(self) -> bool {
        matches!(self, Decision::Allowed | Decision::Confirmed)
    }
}

/// An activated plugin, ready for the host
#[derive(Debug)]
pub enum ActivatedPlugin {
    /// Instance from a code archive; `source` is the candidate it came from
    Native { source: String, plugin: LoadedPlugin },
    /// Remote-API plugin with its bound client
    Api { name: String, bundle: ApiSpecBundle },
}

impl ActivatedPlugin {
    /// Name of the candidate this plugin was activated as
    pub fn name(&self) -> &str {
        match self {
            ActivatedPlugin::Native { source, .. } => source,
            ActivatedPlugin::Api { name, .. } => name,
        }
    }

    pub fn convention(&self) -> Convention {
        match self {
            ActivatedPlugin::Native { .. } => Convention::CodeArchive,
            ActivatedPlugin::Api { .. } => Convention::ApiSpec,
        }
    }

    pub fn can_handle_on_response(&self) -> bool {
        match self {
            ActivatedPlugin::Native { plugin, .. } => plugin.can_handle_on_response(),
            ActivatedPlugin::Api { .. } => true,
        }
    }

    pub fn on_response(&mut self, response: &str) -> String {
        match self {
            ActivatedPlugin::Native { plugin, .. } => plugin.on_response(response),
            ActivatedPlugin::Api { bundle, .. } => bundle.on_response(response),
        }
    }

    /// One-line `name: version - description` summary
    pub fn summary(&self) -> String {
        match self {
            ActivatedPlugin::Native { plugin, .. } => format!(
                "{}: {} - {}",
                plugin.name(),
                plugin.version(),
                plugin.description()
            ),
            ActivatedPlugin::Api { name, bundle } => {
                let info = &bundle.api_description.info;
                format!("{}: {} - {}", name, info.version, info.title)
            }
        }
    }
}

/// Activated plugins in activation order
#[derive(Debug, Default)]
pub struct ActivatedPluginSet {
    plugins: Vec<ActivatedPlugin>,
}

impl ActivatedPluginSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, plugin: ActivatedPlugin) {
        self.plugins.push(plugin);
    }

    /// Append another set, warning when a name already came from a
    /// different convention. Both entries are kept.
    pub fn merge(&mut self, other: ActivatedPluginSet) {
        for plugin in other.plugins {
            if self
                .plugins
                .iter()
                .any(|p| p.name() == plugin.name() && p.convention() != plugin.convention())
            {
                tracing::warn!(
                    plugin = %plugin.name(),
                    "Plugin name activated under both conventions"
                );
            }
            self.plugins.push(plugin);
        }
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    /// First plugin activated under `name`
    pub fn get(&self, name: &str) -> Option<&ActivatedPlugin> {
        self.plugins.iter().find(|p| p.name() == name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.plugins.iter().map(ActivatedPlugin::name).collect()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ActivatedPlugin> {
        self.plugins.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, ActivatedPlugin> {
        self.plugins.iter_mut()
    }

    /// Pass a response through every plugin that handles responses, in order.
    ///
    /// A plugin that panics is skipped and the response continues unchanged.
    pub fn dispatch_response(&mut self, response: &str) -> String {
        let mut current = response.to_string();

        for plugin in &mut self.plugins {
            if !plugin.can_handle_on_response() {
                continue;
            }

            let input = current.clone();
            match std::panic::catch_unwind(AssertUnwindSafe(|| plugin.on_response(&input))) {
                Ok(next) => current = next,
                Err(_) => {
                    tracing::error!(plugin = %plugin.name(), "Plugin panicked in on_response");
                }
            }
        }

        current
    }
}

impl IntoIterator for ActivatedPluginSet {
    type Item = ActivatedPlugin;
    type IntoIter = std::vec::IntoIter<ActivatedPlugin>;

    fn into_iter(self) -> Self::IntoIter {
        self.plugins.into_iter()
    }
}

impl<'a> IntoIterator for &'a ActivatedPluginSet {
    type Item = &'a ActivatedPlugin;
    type IntoIter = std::slice::Iter<'a, ActivatedPlugin>;

    fn into_iter(self) -> Self::IntoIter {
        self.plugins.iter()
    }
}

/// Applies a [`PluginPolicy`] to candidates.
///
/// The gate performs no I/O of its own; unlisted plugins are referred to the
/// supplied [`PluginPrompt`].
#[derive(Debug, Clone, Copy)]
pub struct ActivationGate<'a> {
    policy: &'a PluginPolicy,
}

impl<'a> ActivationGate<'a> {
    pub fn new(policy: &'a PluginPolicy) -> Self {
        Self { policy }
    }

    /// Decide one plugin. Deny beats allow; the prompt is only asked for
    /// names on neither list.
    pub fn decide(&self, name: &str, prompt: &mut dyn PluginPrompt) -> Decision {
        let decision = if self.policy.is_denied(name) {
            Decision::Denied
        } else if self.policy.is_allowed(name) {
            Decision::Allowed
        } else if prompt.confirm(name) {
            Decision::Confirmed
        } else {
            Decision::Declined
        };

        tracing::debug!(plugin = %name, ?decision, "Activation decision");
        decision
    }

    /// Keep the candidates that pass the gate, in input order
    pub fn select(
        &self,
        candidates: impl IntoIterator<Item = PluginCandidate>,
        prompt: &mut dyn PluginPrompt,
    ) -> Vec<PluginCandidate> {
        candidates
            .into_iter()
            .filter(|candidate| self.decide(&candidate.name, prompt).is_active())
            .collect()
    }

    /// Gate candidates and materialise the ones that pass.
    ///
    /// Remote-API bundles pass through as they are. Code archives are handed
    /// to `loader`; one archive may produce several plugins, and an archive
    /// that fails to load contributes none.
    pub fn activate(
        &self,
        candidates: impl IntoIterator<Item = PluginCandidate>,
        prompt: &mut dyn PluginPrompt,
        loader: &ModuleLoader,
    ) -> ActivatedPluginSet {
        let mut activated = ActivatedPluginSet::new();

        for candidate in self.select(candidates, prompt) {
            match candidate.kind {
                CandidateKind::ApiSpec(bundle) => {
                    activated.push(ActivatedPlugin::Api {
                        name: candidate.name,
                        bundle,
                    });
                }
                CandidateKind::CodeArchive { .. } => match loader.load_candidate(&candidate) {
                    Ok(plugins) => {
                        for plugin in plugins {
                            activated.push(ActivatedPlugin::Native {
                                source: candidate.name.clone(),
                                plugin,
                            });
                        }
                    }
                    Err(e) => {
                        tracing::warn!(plugin = %candidate.name, error = %e, "Failed to load plugin module");
                    }
                },
            }
        }

        activated
    }
}
