//! Plugin registry and the inspection contract.
//!
//! A [`Plugin`] knows how to build a [`Haruspex`] from a preset; the
//! haruspex performs the actual divination: local inspection, and the
//! repository-backed reveal/peek/watch operations. The registry is a
//! static table; looking up an unknown name is an `Option`, not an
//! error, so callers decide how to report it.

mod capsula;
mod simple;
mod wrapped;

pub use capsula::CapsulaPlugin;
pub use simple::SimpleCorePlugin;
pub use test::TestPlugin;
pub use wrapped::WrappedCorePlugin;

use crate::analyzer::CoreDumpAnalyzer;
use crate::debugger::GdbDebugger;
use crate::repo::{Progress, RemoteEntry, Repository};
use crate::report::Report;
use hx_common::{env_flag, Error, Result};
use hx_config::Preset;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;
use tracing::info;

/// Environment override retaining downloaded archives.
pub const KEEP_DOWNLOADS_ENV: &str = "HX_KEEP_DOWNLOADS";

/// A registered inspection flavor.
pub trait Plugin: Sync {
    /// Registry name, as referenced by presets.
    fn name(&self) -> &str;

    /// One-line description for listings.
    fn description(&self) -> &str;

    /// Preset template with a `{name}` placeholder.
    fn preset_template(&self) -> &str;

    /// Build a haruspex configured by `preset`.
    fn create_haruspex(&self, preset: &Preset) -> Result<Box<dyn Haruspex>>;
}

static PLUGINS: &[&dyn Plugin] = &[
    &SimpleCorePlugin,
    &WrappedCorePlugin,
    &CapsulaPlugin,
    &TestPlugin,
];

/// All registered plugins, in listing order.
pub fn plugins() -> &'static [&'static dyn Plugin] {
    PLUGINS
}

/// Look up a plugin by name.
pub fn find_plugin(name: &str) -> Option<&'static dyn Plugin> {
    PLUGINS.iter().copied().find(|p| p.name() == name)
}

/// A configured inspector.
///
/// Implementors provide local inspection; the remote operations are
/// provided on top of the preset's repository.
pub trait Haruspex {
    /// Name of the plugin that built this haruspex.
    fn name(&self) -> &str;

    /// The preset's repository, when one is configured.
    fn repository(&self) -> Option<&Repository>;

    /// Inspect a local crash archive.
    fn inspect(&self, archive: &Path) -> Result<Report>;

    /// The repository, or a repository error when the preset has none.
    fn require_repository(&self) -> Result<&Repository> {
        self.repository()
            .ok_or_else(|| Error::Repository("preset has no repository URL".into()))
    }

    /// List the newest remote archives without downloading.
    fn peek(&self, pattern: Option<&Regex>, count: usize) -> Result<Vec<RemoteEntry>> {
        self.require_repository()?.peek(pattern, count)
    }

    /// Download a named remote archive and inspect it.
    ///
    /// The download lands in a scoped directory removed on return;
    /// `HX_KEEP_DOWNLOADS` keeps it. The report carries the remote
    /// filename, not the temporary path.
    fn inspect_remote(&self, filename: &str, progress: Option<Progress<'_>>) -> Result<Report> {
        let repository = self.require_repository()?;

        let dest_dir: PathBuf;
        let _guard: Option<TempDir>;
        let dir = tempfile::Builder::new().prefix("hx-download-").tempdir()?;
        if env_flag(KEEP_DOWNLOADS_ENV) {
            dest_dir = dir.keep();
            info!(dir = %dest_dir.display(), "retaining downloaded archive");
            _guard = None;
        } else {
            dest_dir = dir.path().to_path_buf();
            _guard = Some(dir);
        }

        let downloaded = repository.retrieve(filename, &dest_dir, progress)?;
        let mut report = self.inspect(&downloaded)?;
        report.filename = filename.to_owned();
        Ok(report)
    }

    /// Download and inspect the newest remote archive.
    fn reveal(&self, pattern: Option<&Regex>, progress: Option<Progress<'_>>) -> Result<Report> {
        let entries = self.require_repository()?.peek(pattern, 1)?;
        self.inspect_remote(&entries[0].filename, progress)
    }

    /// Poll the repository and inspect each new archive.
    fn watch(
        &self,
        pattern: Option<&Regex>,
        duration: Duration,
        on_report: &mut dyn FnMut(&Report) -> Result<()>,
    ) -> Result<()> {
        let repository = self.require_repository()?;
        repository.watch(pattern, duration, &mut |entry| {
            let report = self.inspect_remote(&entry.filename, None)?;
            on_report(&report)
        })
    }
}

/// Compile a user-supplied pattern.
pub fn compile_pattern(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|source| Error::Pattern {
        pattern: pattern.to_owned(),
        source,
    })
}

/// Build the analyzer a preset describes.
pub(crate) fn analyzer_from_preset(preset: &Preset) -> CoreDumpAnalyzer {
    let debugger = GdbDebugger::new(
        preset.debugger_executable(),
        preset.search_paths(),
        preset.solib_prefix(),
    );
    CoreDumpAnalyzer::new(Box::new(debugger), preset.search_paths())
}

/// Build the repository a preset describes, if any.
pub(crate) fn repository_from_preset(preset: &Preset) -> Result<Option<Repository>> {
    match preset.repository_url() {
        Some(url) => {
            let period = Duration::from_secs(preset.poll_period());
            Ok(Some(Repository::connect(url, period)?))
        }
        None => Ok(None),
    }
}

/// Archive basename with a trailing `.gz` removed.
pub(crate) fn stripped_basename(path: &Path) -> String {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    name.strip_suffix(".gz").map(str::to_owned).unwrap_or(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_names_are_unique() {
        let mut names: Vec<_> = plugins().iter().map(|p| p.name()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), plugins().len());
    }

    #[test]
    fn test_find_plugin() {
        assert!(find_plugin("simple-core").is_some());
        assert!(find_plugin("wrapped-core").is_some());
        assert!(find_plugin("capsula").is_some());
        assert!(find_plugin("test").is_some());
        assert!(find_plugin("nope").is_none());
    }

    #[test]
    fn test_templates_parse_with_name_substituted() {
        for plugin in plugins() {
            let text = plugin.preset_template().replace("{name}", "sample");
            let preset = Preset::parse(&text, Path::new("sample.toml")).unwrap();
            assert_eq!(preset.name(), "sample");
            assert_eq!(preset.plugin(), plugin.name());
        }
    }

    #[test]
    fn test_compile_pattern_rejects_garbage() {
        let err = compile_pattern("core(").unwrap_err();
        assert!(matches!(err, Error::Pattern { .. }));
    }

    #[test]
    fn test_stripped_basename() {
        assert_eq!(stripped_basename(Path::new("/spool/core.1.gz")), "core.1");
        assert_eq!(stripped_basename(Path::new("/spool/core.1")), "core.1");
    }
}
