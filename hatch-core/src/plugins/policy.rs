//! Plugin policy - which plugins are allowed or denied

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Allow and deny lists consulted by the activation gate
///
/// Stored by the host, typically as the `[plugins]` table of its TOML
/// config. A name on both lists counts as denied.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginPolicy {
    /// Plugins activated without asking
    #[serde(default)]
    pub allow: BTreeSet<String>,
    /// Plugins never activated
    #[serde(default)]
    pub deny: BTreeSet<String>,
}

impl PluginPolicy {
    pub fn new<A, D>(allow: A, deny: D) -> Self
    where
        A: IntoIterator,
        A::Item: Into<String>,
        D: IntoIterator,
        D::Item: Into<String>,
    {
        Self {
            allow: allow.into_iter().map(Into::into).collect(),
            deny: deny.into_iter().map(Into::into).collect(),
        }
    }

    /// Check if a plugin is on the deny list
    pub fn is_denied(&self, name: &str) -> bool {
        self.deny.contains(name)
    }

    /// Check if a plugin is on the allow list
    pub fn is_allowed(&self, name: &str) -> bool {
        self.allow.contains(name)
    }

    /// Allow a plugin, taking it off the deny list
    pub fn allow(&mut self, name: &str) {
        self.deny.remove(name);
        self.allow.insert(name.to_string());
    }

    /// Deny a plugin, taking it off the allow list
    pub fn deny(&mut self, name: &str) {
        self.allow.remove(name);
        self.deny.insert(name.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_default_is_empty() {
        let policy = PluginPolicy::default();
        assert!(policy.allow.is_empty());
        assert!(policy.deny.is_empty());
    }

    #[test]
    fn test_policy_allow_deny_move_names() {
        let mut policy = PluginPolicy::default();

        policy.allow("foo");
        assert!(policy.is_allowed("foo"));
        assert!(!policy.is_denied("foo"));

        policy.deny("foo");
        assert!(policy.is_denied("foo"));
        assert!(!policy.is_allowed("foo"));
    }

    #[test]
    fn test_policy_new_keeps_overlap() {
        let policy = PluginPolicy::new(["a", "both"], ["both"]);
        assert!(policy.is_allowed("both"));
        assert!(policy.is_denied("both"));
    }

    #[test]
    fn test_policy_toml_format() {
        let policy = PluginPolicy::new(["hello"], Vec::<String>::new());

        let toml_str = toml::to_string_pretty(&policy).unwrap();
        assert!(toml_str.contains("allow"));
        assert!(toml_str.contains("hello"));

        let parsed: PluginPolicy = toml::from_str("deny = [\"x\"]").unwrap();
        assert!(parsed.allow.is_empty());
        assert!(parsed.is_denied("x"));
    }
}
