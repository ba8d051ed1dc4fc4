//! XDG Base Directory paths for hatch.
//!
//! CLI tools should use XDG paths for cross-platform consistency,
//! not platform-native paths.

use std::path::PathBuf;

/// Get the hatch config directory.
///
/// Returns `$XDG_CONFIG_HOME/hatch` if set, otherwise `~/.config/hatch`.
/// This is where config files and the default plugin root live.
///
/// # Examples
///
/// ```
/// use hatch_paths::config_dir;
///
/// let config = config_dir();
/// let user_config = config.join("config.toml");
/// ```
pub fn config_dir() -> PathBuf {
    if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
        PathBuf::from(xdg_config).join("hatch")
    } else if let Some(home) = dirs::home_dir() {
        home.join(".config/hatch")
    } else {
        PathBuf::from(".config/hatch")
    }
}

/// Default plugin root: `<config_dir>/plugins`.
///
/// Holds one directory per packaging convention (`generic/`, `openai/`).
pub fn plugins_dir() -> PathBuf {
    config_dir().join("plugins")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_config_dir_ends_with_hatch() {
        let path = config_dir();
        assert!(path.ends_with("hatch"), "config_dir should end with 'hatch'");
    }

    #[test]
    #[serial]
    fn test_config_dir_respects_xdg_env() {
        unsafe {
            std::env::set_var("XDG_CONFIG_HOME", "/tmp/test-config");
        }
        let path = config_dir();
        assert_eq!(path, PathBuf::from("/tmp/test-config/hatch"));
        assert_eq!(plugins_dir(), PathBuf::from("/tmp/test-config/hatch/plugins"));
        unsafe {
            std::env::remove_var("XDG_CONFIG_HOME");
        }
    }
}
