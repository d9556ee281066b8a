//! Preset model.
//!
//! A preset file looks like:
//!
//! ```toml
//! [preset]
//! name = "router"
//! plugin = "wrapped-core"
//!
//! [debugger]
//! executable = "gdb"
//! search_paths = ["/usr/lib", "~/sysroots/current/lib"]
//! solib_prefix = "/usr/lib"
//!
//! [repository]
//! url = "file:///var/spool/crashes"
//! period = 60
//!
//! [hints]
//! core_pattern = '^core.+(\.gz)?'
//! version_file = 'version\.txt'
//! version_pattern = 'version=(.+)'
//! ```
//!
//! Only `[preset]` is mandatory; accessors return defaults or `Option`
//! for everything else. All accessors are read-only: a preset is
//! immutable once loaded.

use hx_common::{expand_tilde, Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Default pattern locating a core dump inside an extracted tarball.
pub const DEFAULT_CORE_PATTERN: &str = r"^core.+(\.gz)?";

/// Default repository polling period in seconds.
pub const DEFAULT_POLL_PERIOD: u64 = 60;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct PresetMeta {
    name: String,
    plugin: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct DebuggerSection {
    executable: Option<String>,
    #[serde(default)]
    search_paths: Vec<String>,
    solib_prefix: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct RepositorySection {
    url: Option<String>,
    period: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct HintsSection {
    core_pattern: Option<String>,
    version_file: Option<String>,
    version_pattern: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct PresetDoc {
    preset: PresetMeta,
    #[serde(default)]
    debugger: DebuggerSection,
    #[serde(default)]
    repository: RepositorySection,
    #[serde(default)]
    hints: HintsSection,
}

/// A named, immutable plugin configuration.
#[derive(Debug, Clone)]
pub struct Preset {
    path: PathBuf,
    doc: PresetDoc,
}

impl Preset {
    /// Load a preset from a TOML file.
    pub fn load(path: &Path) -> Result<Preset> {
        let text = fs::read_to_string(path)?;
        Self::parse(&text, path)
    }

    /// Parse a preset from TOML text, recording `path` as its origin.
    pub fn parse(text: &str, path: &Path) -> Result<Preset> {
        let doc: PresetDoc = toml::from_str(text)
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))?;
        if doc.preset.name.is_empty() {
            return Err(Error::Config(format!(
                "{}: preset name is empty",
                path.display()
            )));
        }
        if doc.preset.plugin.is_empty() {
            return Err(Error::Config(format!(
                "{}: plugin name is empty",
                path.display()
            )));
        }
        Ok(Preset {
            path: path.to_path_buf(),
            doc,
        })
    }

    /// Name of the preset.
    pub fn name(&self) -> &str {
        &self.doc.preset.name
    }

    /// Name of the plugin this preset configures.
    pub fn plugin(&self) -> &str {
        &self.doc.preset.plugin
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Debugger executable, `gdb` when unset.
    pub fn debugger_executable(&self) -> PathBuf {
        match &self.doc.debugger.executable {
            Some(exe) => expand_tilde(exe),
            None => PathBuf::from("gdb"),
        }
    }

    /// Ordered executable/shared-library search paths, tilde-expanded.
    pub fn search_paths(&self) -> Vec<PathBuf> {
        self.doc
            .debugger
            .search_paths
            .iter()
            .map(|p| expand_tilde(p))
            .collect()
    }

    /// Shared-library absolute-path prefix, if configured.
    pub fn solib_prefix(&self) -> Option<PathBuf> {
        self.doc.debugger.solib_prefix.as_deref().map(expand_tilde)
    }

    /// Crash-archive repository URL, if configured.
    pub fn repository_url(&self) -> Option<&str> {
        self.doc.repository.url.as_deref()
    }

    /// Repository polling period in seconds.
    pub fn poll_period(&self) -> u64 {
        self.doc.repository.period.unwrap_or(DEFAULT_POLL_PERIOD)
    }

    /// Pattern locating the core dump inside an extracted archive.
    pub fn core_pattern(&self) -> &str {
        self.doc
            .hints
            .core_pattern
            .as_deref()
            .unwrap_or(DEFAULT_CORE_PATTERN)
    }

    /// Pattern locating the version-marker file, if configured.
    pub fn version_file(&self) -> Option<&str> {
        self.doc.hints.version_file.as_deref()
    }

    /// Pattern extracting the version string, if configured.
    pub fn version_pattern(&self) -> Option<&str> {
        self.doc.hints.version_pattern.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = r#"
[preset]
name = "router"
plugin = "capsula"

[debugger]
executable = "arm-linux-gdb"
search_paths = ["/opt/sysroot/lib", "/some/path/@VERSION@/lib"]
solib_prefix = "/opt/sysroot"

[repository]
url = "file:///var/spool/crashes"
period = 5

[hints]
core_pattern = '^core\.\d+'
version_file = 'version\.txt'
version_pattern = 'version=(.+)'
"#;

    #[test]
    fn test_parse_full_preset() {
        let preset = Preset::parse(FULL, Path::new("router.toml")).unwrap();
        assert_eq!(preset.name(), "router");
        assert_eq!(preset.plugin(), "capsula");
        assert_eq!(preset.debugger_executable(), PathBuf::from("arm-linux-gdb"));
        assert_eq!(preset.search_paths().len(), 2);
        assert_eq!(preset.solib_prefix(), Some(PathBuf::from("/opt/sysroot")));
        assert_eq!(preset.repository_url(), Some("file:///var/spool/crashes"));
        assert_eq!(preset.poll_period(), 5);
        assert_eq!(preset.core_pattern(), r"^core\.\d+");
        assert_eq!(preset.version_file(), Some(r"version\.txt"));
        assert_eq!(preset.version_pattern(), Some("version=(.+)"));
    }

    #[test]
    fn test_parse_minimal_preset_defaults() {
        let text = "[preset]\nname = \"basic\"\nplugin = \"simple-core\"\n";
        let preset = Preset::parse(text, Path::new("basic.toml")).unwrap();
        assert_eq!(preset.debugger_executable(), PathBuf::from("gdb"));
        assert!(preset.search_paths().is_empty());
        assert_eq!(preset.solib_prefix(), None);
        assert_eq!(preset.repository_url(), None);
        assert_eq!(preset.poll_period(), DEFAULT_POLL_PERIOD);
        assert_eq!(preset.core_pattern(), DEFAULT_CORE_PATTERN);
    }

    #[test]
    fn test_parse_rejects_empty_name() {
        let text = "[preset]\nname = \"\"\nplugin = \"simple-core\"\n";
        let err = Preset::parse(text, Path::new("bad.toml")).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_parse_rejects_missing_section() {
        let err = Preset::parse("[debugger]\n", Path::new("bad.toml")).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
