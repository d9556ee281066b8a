//! The capsula plugin: versioned tarballs with per-version sysroots.
//!
//! Firmware crash archives carry a version marker next to the core
//! dump. The marker selects the matching sysroot on the host: every
//! occurrence of `@VERSION@` in the preset's search paths is replaced
//! with the extracted version before the debugger runs.

use super::{
    compile_pattern, repository_from_preset, wrapped::analyze_extracted, wrapped::find_core,
    Haruspex, Plugin,
};
use crate::analyzer::CoreDumpAnalyzer;
use crate::archive::TarballAdapter;
use crate::debugger::GdbDebugger;
use crate::repo::Repository;
use crate::report::Report;
use hx_common::{find_file_matching, find_text, Result};
use hx_config::Preset;
use regex::Regex;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

const NAME: &str = "capsula";

/// Placeholder substituted in search paths.
const VERSION_PLACEHOLDER: &str = "@VERSION@";

const TEMPLATE: &str = r#"[preset]
name = "{name}"
plugin = "capsula"

[debugger]
executable = "gdb"
search_paths = ["~/sysroots/@VERSION@/lib"]

[hints]
core_pattern = '^core.+(\.gz)?'
version_file = '^version\.txt$'
version_pattern = 'version=(.+)'

# [repository]
# url = "file:///var/spool/crashes"
# period = 60
"#;

pub struct CapsulaPlugin;

impl Plugin for CapsulaPlugin {
    fn name(&self) -> &str {
        NAME
    }

    fn description(&self) -> &str {
        "inspect a versioned crash capsule against its sysroot"
    }

    fn preset_template(&self) -> &str {
        TEMPLATE
    }

    fn create_haruspex(&self, preset: &Preset) -> Result<Box<dyn Haruspex>> {
        // Compile the hint patterns up front so a bad preset fails at
        // construction, not mid-inspection.
        let version_file = preset.version_file().map(compile_pattern).transpose()?;
        let version_pattern = preset.version_pattern().map(compile_pattern).transpose()?;
        Ok(Box::new(CapsulaHaruspex {
            preset: preset.clone(),
            repository: repository_from_preset(preset)?,
            core_pattern: compile_pattern(preset.core_pattern())?,
            version_file,
            version_pattern,
        }))
    }
}

struct CapsulaHaruspex {
    preset: Preset,
    repository: Option<Repository>,
    core_pattern: Regex,
    version_file: Option<Regex>,
    version_pattern: Option<Regex>,
}

impl CapsulaHaruspex {
    /// Extract the version marker from the unpacked tree, if the preset
    /// hints at one and the archive carries it.
    fn detect_version(&self, dir: &Path) -> Result<Option<String>> {
        let (file_pattern, text_pattern) = match (&self.version_file, &self.version_pattern) {
            (Some(f), Some(t)) => (f, t),
            _ => return Ok(None),
        };
        let marker = match find_file_matching(file_pattern, dir) {
            Some(path) => path,
            None => {
                warn!(pattern = file_pattern.as_str(), "no version marker in archive");
                return Ok(None);
            }
        };
        let version = find_text(&marker, text_pattern)?;
        if let Some(version) = &version {
            info!(version = %version, marker = %marker.display(), "archive version");
        } else {
            warn!(marker = %marker.display(), "version marker matched nothing");
        }
        Ok(version)
    }

    /// Search paths with the version substituted in.
    fn resolve_search_paths(&self, version: Option<&str>) -> Vec<PathBuf> {
        let mut resolved = Vec::new();
        for path in self.preset.search_paths() {
            let raw = path.to_string_lossy();
            let path = if raw.contains(VERSION_PLACEHOLDER) {
                match version {
                    Some(version) => PathBuf::from(raw.replace(VERSION_PLACEHOLDER, version)),
                    None => {
                        warn!(path = %raw, "skipping path, no version to substitute");
                        continue;
                    }
                }
            } else {
                path
            };
            if !path.is_dir() {
                warn!(path = %path.display(), "search path does not exist");
            }
            resolved.push(path);
        }
        resolved
    }
}

impl Haruspex for CapsulaHaruspex {
    fn name(&self) -> &str {
        NAME
    }

    fn repository(&self) -> Option<&Repository> {
        self.repository.as_ref()
    }

    fn inspect(&self, archive: &Path) -> Result<Report> {
        let adapter = TarballAdapter::open(archive)?;
        let core = find_core(&self.core_pattern, adapter.dir())?;

        let version = self.detect_version(adapter.dir())?;
        let search_paths = self.resolve_search_paths(version.as_deref());

        // The analyzer is rebuilt per archive: the sysroot depends on
        // the version this capsule was built from.
        let debugger = GdbDebugger::new(
            self.preset.debugger_executable(),
            search_paths.clone(),
            self.preset.solib_prefix(),
        );
        let analyzer = CoreDumpAnalyzer::new(Box::new(debugger), search_paths);

        let crash = analyze_extracted(&analyzer, &core)?;
        Ok(Report::from_crash_info(
            archive,
            NAME,
            crash,
            analyzer.debugger_path(),
        ))
    }
}
