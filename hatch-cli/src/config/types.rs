use hatch_core::{ActivatedPluginSet, HostConfig, PluginPolicy};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::PathBuf;

/// Configuration as stored in TOML files (with optional fields for merging)
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawHatchConfig {
    #[serde(default)]
    pub plugins: RawPluginsConfig,
}

/// `[plugins]` as stored in TOML
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawPluginsConfig {
    /// Plugin root holding `generic/` and `openai/`
    pub dir: Option<PathBuf>,

    pub allow: Option<BTreeSet<String>>,

    pub deny: Option<BTreeSet<String>>,

    /// Ask about plugins on neither list
    pub prompt: Option<bool>,
}

/// Final configuration with defaults applied
#[derive(Debug, Serialize, Default)]
pub struct HatchConfig {
    pub plugins: PluginsConfig,

    /// Plugins activated for this run
    #[serde(skip)]
    pub activated: ActivatedPluginSet,
}

#[derive(Debug, Clone, Serialize)]
pub struct PluginsConfig {
    pub dir: PathBuf,

    #[serde(flatten)]
    pub policy: PluginPolicy,

    pub prompt: bool,
}

impl Default for PluginsConfig {
    fn default() -> Self {
        Self {
            dir: hatch_paths::plugins_dir(),
            policy: PluginPolicy::default(),
            prompt: true,
        }
    }
}

impl HostConfig for HatchConfig {
    fn plugin_policy(&self) -> &PluginPolicy {
        &self.plugins.policy
    }

    fn set_plugins(&mut self, plugins: ActivatedPluginSet) {
        self.activated = plugins;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let config = HatchConfig::default();
        assert_eq!(config.plugins.dir, hatch_paths::plugins_dir());
        assert!(config.plugins.prompt);
        assert!(config.plugins.policy.allow.is_empty());
        assert!(config.plugins.policy.deny.is_empty());
        assert!(config.activated.is_empty());
    }

    #[test]
    fn test_raw_config_parses_plugins_section() {
        let raw: RawHatchConfig = toml::from_str(
            r#"
[plugins]
dir = "/srv/plugins"
allow = ["weather"]
prompt = false
"#,
        )
        .unwrap();

        assert_eq!(raw.plugins.dir, Some(PathBuf::from("/srv/plugins")));
        assert_eq!(
            raw.plugins.allow,
            Some(BTreeSet::from(["weather".to_string()]))
        );
        assert!(raw.plugins.deny.is_none());
        assert_eq!(raw.plugins.prompt, Some(false));
    }

    #[test]
    fn test_raw_config_empty_file() {
        let raw: RawHatchConfig = toml::from_str("").unwrap();
        assert!(raw.plugins.dir.is_none());
        assert!(raw.plugins.allow.is_none());
    }

    #[test]
    fn test_config_serializes_policy_inline() {
        let mut config = HatchConfig::default();
        config.plugins.policy.allow("weather");

        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[plugins]"));
        assert!(toml_str.contains("allow"));
        assert!(toml_str.contains("weather"));
        assert!(toml_str.contains("prompt = true"));
    }
}
