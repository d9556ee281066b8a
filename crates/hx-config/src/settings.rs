//! Application settings and configuration directories.

use hx_common::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Settings file name under the configuration directory.
const SETTINGS_FILE: &str = "config.toml";

/// Preset directory name under the configuration directory.
const PRESETS_DIR: &str = "presets.d";

/// Application-level settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Preset used when a command does not name one.
    pub default_preset: Option<String>,
}

impl Settings {
    /// Load settings from the configuration directory, defaulting when
    /// the file does not exist.
    pub fn load(config_dir: &Path) -> Result<Settings> {
        let path = config_dir.join(SETTINGS_FILE);
        if !path.exists() {
            return Ok(Settings::default());
        }
        let text = fs::read_to_string(&path)?;
        toml::from_str(&text).map_err(|e| Error::Config(format!("{}: {e}", path.display())))
    }

    /// Save settings to the configuration directory.
    pub fn save(&self, config_dir: &Path) -> Result<()> {
        fs::create_dir_all(config_dir)?;
        let text = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("settings serialization: {e}")))?;
        fs::write(config_dir.join(SETTINGS_FILE), text)?;
        Ok(())
    }
}

/// Resolve the configuration directory.
///
/// Priority: explicit override, `HX_CONFIG_DIR`, then the platform
/// config dir (`~/.config/haruspex` on Linux).
pub fn config_dir(override_dir: Option<&Path>) -> PathBuf {
    if let Some(dir) = override_dir {
        return dir.to_path_buf();
    }
    if let Ok(dir) = std::env::var("HX_CONFIG_DIR") {
        if !dir.is_empty() {
            return PathBuf::from(dir);
        }
    }
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("haruspex")
}

/// The preset directory under a configuration directory.
pub fn presets_dir(config_dir: &Path) -> PathBuf {
    config_dir.join(PRESETS_DIR)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_missing_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load(dir.path()).unwrap();
        assert_eq!(settings.default_preset, None);
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings {
            default_preset: Some("router".into()),
        };
        settings.save(dir.path()).unwrap();
        let reloaded = Settings::load(dir.path()).unwrap();
        assert_eq!(reloaded.default_preset.as_deref(), Some("router"));
    }

    #[test]
    fn test_config_dir_override_wins() {
        let dir = config_dir(Some(Path::new("/tmp/hx-test")));
        assert_eq!(dir, PathBuf::from("/tmp/hx-test"));
    }

    #[test]
    fn test_presets_dir_layout() {
        assert_eq!(
            presets_dir(Path::new("/etc/haruspex")),
            PathBuf::from("/etc/haruspex/presets.d")
        );
    }
}
