use super::types::{HatchConfig, PluginsConfig, RawHatchConfig, RawPluginsConfig};
use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use hatch_core::PluginPolicy;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use toml_edit::{Array, DocumentMut};

pub struct ConfigLoader;

/// Which policy list an edit targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyList {
    Allow,
    Deny,
}

impl PolicyList {
    fn key(self) -> &'static str {
        match self {
            PolicyList::Allow => "allow",
            PolicyList::Deny => "deny",
        }
    }

    fn other(self) -> Self {
        match self {
            PolicyList::Allow => PolicyList::Deny,
            PolicyList::Deny => PolicyList::Allow,
        }
    }
}

impl ConfigLoader {
    /// Load merged configuration (user + project)
    pub fn load() -> Result<HatchConfig> {
        Self::load_from_paths(
            Self::user_config_path().as_deref(),
            &Self::project_config_path(),
        )
    }

    /// Load and merge the given layers; missing files are skipped
    pub fn load_from_paths(user: Option<&Path>, project: &Path) -> Result<HatchConfig> {
        let mut raw = RawHatchConfig::default();

        // Layer 1: User config
        if let Some(user_path) = user
            && user_path.exists()
        {
            raw = Self::merge_raw(raw, Self::read_raw(user_path)?);
        }

        // Layer 2: Project config
        if project.exists() {
            raw = Self::merge_raw(raw, Self::read_raw(project)?);
        }

        Ok(Self::finalize(raw))
    }

    fn read_raw(path: &Path) -> Result<RawHatchConfig> {
        let contents = std::fs::read_to_string(path)?;
        toml::from_str(&contents).with_context(|| format!("Invalid config file {}", path.display()))
    }

    /// Get user config path (platform-specific)
    pub fn user_config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "hatch").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Get project config path
    /// Can be overridden with HATCH_PROJECT_CONFIG_DIR env var
    pub fn project_config_path() -> PathBuf {
        if let Ok(dir) = std::env::var("HATCH_PROJECT_CONFIG_DIR") {
            PathBuf::from(dir).join("config.toml")
        } else {
            PathBuf::from(".hatch/config.toml")
        }
    }

    /// Merge two raw configs.
    ///
    /// Scalars in the overlay win when set. Allow and deny lists accumulate
    /// across layers, so a name denied anywhere stays denied.
    fn merge_raw(base: RawHatchConfig, overlay: RawHatchConfig) -> RawHatchConfig {
        RawHatchConfig {
            plugins: RawPluginsConfig {
                dir: overlay.plugins.dir.or(base.plugins.dir),
                allow: union(base.plugins.allow, overlay.plugins.allow),
                deny: union(base.plugins.deny, overlay.plugins.deny),
                prompt: overlay.plugins.prompt.or(base.plugins.prompt),
            },
        }
    }

    /// Convert raw config to final config with defaults applied
    fn finalize(raw: RawHatchConfig) -> HatchConfig {
        let defaults = PluginsConfig::default();
        HatchConfig {
            plugins: PluginsConfig {
                dir: raw.plugins.dir.unwrap_or(defaults.dir),
                policy: PluginPolicy {
                    allow: raw.plugins.allow.unwrap_or_default(),
                    deny: raw.plugins.deny.unwrap_or_default(),
                },
                prompt: raw.plugins.prompt.unwrap_or(defaults.prompt),
            },
            ..Default::default()
        }
    }

    /// Put `name` on one policy list in the config file at `path`, taking it
    /// off the other list. Formatting and unrelated keys are preserved.
    pub fn update_policy(path: &Path, name: &str, list: PolicyList) -> Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let existing = if path.exists() {
            std::fs::read_to_string(path)?
        } else {
            String::new()
        };
        let mut doc = existing
            .parse::<DocumentMut>()
            .with_context(|| format!("Invalid config file {}", path.display()))?;

        let plugins = doc
            .entry("plugins")
            .or_insert(toml_edit::table())
            .as_table_mut()
            .ok_or_else(|| anyhow!("[plugins] in {} is not a table", path.display()))?;

        policy_array(plugins, list.other().key())?.retain(|v| v.as_str() != Some(name));

        let target = policy_array(plugins, list.key())?;
        if !target.iter().any(|v| v.as_str() == Some(name)) {
            target.push(name);
        }

        std::fs::write(path, doc.to_string())?;
        Ok(())
    }
}

fn union<T: Ord>(base: Option<BTreeSet<T>>, overlay: Option<BTreeSet<T>>) -> Option<BTreeSet<T>> {
    match (base, overlay) {
        (Some(mut base), Some(overlay)) => {
            base.extend(overlay);
            Some(base)
        }
        (base, overlay) => overlay.or(base),
    }
}

fn policy_array<'a>(table: &'a mut toml_edit::Table, key: &str) -> Result<&'a mut Array> {
    table
        .entry(key)
        .or_insert(toml_edit::value(Array::new()))
        .as_array_mut()
        .ok_or_else(|| anyhow!("plugins.{key} is not an array"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    // ==================== Load Tests ====================

    #[test]
    fn test_load_nonexistent_returns_defaults() {
        let dir = TempDir::new().unwrap();
        let config = ConfigLoader::load_from_paths(
            Some(&dir.path().join("user.toml")),
            &dir.path().join("project.toml"),
        )
        .unwrap();

        assert_eq!(config.plugins.dir, hatch_paths::plugins_dir());
        assert!(config.plugins.prompt);
        assert!(config.plugins.policy.allow.is_empty());
    }

    #[test]
    fn test_load_merges_layers() {
        let dir = TempDir::new().unwrap();
        let user = write(
            &dir,
            "user.toml",
            "[plugins]\ndir = \"/user/plugins\"\nallow = [\"weather\"]\ndeny = [\"legacy\"]\n",
        );
        let project = write(
            &dir,
            "project.toml",
            "[plugins]\nallow = [\"jira\"]\nprompt = false\n",
        );

        let config = ConfigLoader::load_from_paths(Some(&user), &project).unwrap();

        assert_eq!(config.plugins.dir, PathBuf::from("/user/plugins"));
        assert!(config.plugins.policy.is_allowed("weather"));
        assert!(config.plugins.policy.is_allowed("jira"));
        assert!(config.plugins.policy.is_denied("legacy"));
        assert!(!config.plugins.prompt);
    }

    #[test]
    fn test_load_invalid_toml_returns_error() {
        let dir = TempDir::new().unwrap();
        let project = write(&dir, "project.toml", "this is not valid toml {{{{");

        let result = ConfigLoader::load_from_paths(None, &project);
        assert!(result.is_err());
    }

    #[test]
    fn test_merge_raw_none_preserves_base() {
        let base = RawHatchConfig {
            plugins: RawPluginsConfig {
                dir: Some(PathBuf::from("/base")),
                allow: None,
                deny: None,
                prompt: Some(false),
            },
        };

        let merged = ConfigLoader::merge_raw(base, RawHatchConfig::default());

        assert_eq!(merged.plugins.dir, Some(PathBuf::from("/base")));
        assert_eq!(merged.plugins.prompt, Some(false));
    }

    #[test]
    fn test_user_config_path_returns_some() {
        let path = ConfigLoader::user_config_path().unwrap();
        assert!(path.to_string_lossy().contains("hatch"));
        assert!(path.to_string_lossy().contains("config.toml"));
    }

    #[test]
    #[serial]
    fn test_project_config_path() {
        // SAFETY: Test is serialized, no concurrent env access
        unsafe { std::env::remove_var("HATCH_PROJECT_CONFIG_DIR") };
        assert_eq!(
            ConfigLoader::project_config_path(),
            PathBuf::from(".hatch/config.toml")
        );

        // SAFETY: Test is serialized, no concurrent env access
        unsafe { std::env::set_var("HATCH_PROJECT_CONFIG_DIR", "/tmp/isolated") };
        assert_eq!(
            ConfigLoader::project_config_path(),
            PathBuf::from("/tmp/isolated/config.toml")
        );

        // SAFETY: Test is serialized, no concurrent env access
        unsafe { std::env::remove_var("HATCH_PROJECT_CONFIG_DIR") };
    }

    // ==================== Policy Edit Tests ====================

    #[test]
    fn test_update_policy_creates_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/config.toml");

        ConfigLoader::update_policy(&path, "weather", PolicyList::Allow).unwrap();

        let config = ConfigLoader::load_from_paths(None, &path).unwrap();
        assert!(config.plugins.policy.is_allowed("weather"));
    }

    #[test]
    fn test_update_policy_moves_name_between_lists() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "config.toml",
            "# my settings\n[plugins]\nallow = [\"weather\", \"jira\"]\n",
        );

        ConfigLoader::update_policy(&path, "weather", PolicyList::Deny).unwrap();
        ConfigLoader::update_policy(&path, "weather", PolicyList::Deny).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("# my settings"));

        let config = ConfigLoader::load_from_paths(None, &path).unwrap();
        assert!(config.plugins.policy.is_denied("weather"));
        assert!(!config.plugins.policy.is_allowed("weather"));
        assert!(config.plugins.policy.is_allowed("jira"));
        assert_eq!(config.plugins.policy.deny.len(), 1);
    }

    #[test]
    fn test_update_policy_rejects_non_table_plugins() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "config.toml", "plugins = 3\n");

        let result = ConfigLoader::update_policy(&path, "weather", PolicyList::Allow);
        assert!(result.is_err());
    }
}
