//! The wrapped-core plugin: core dumps wrapped in a tarball.
//!
//! The tarball may carry logs and other diagnostics next to the core
//! dump; the preset's `core_pattern` hint picks the dump out of the
//! extracted tree. The dump itself may again be gzipped.

use super::{
    analyzer_from_preset, compile_pattern, repository_from_preset, stripped_basename, Haruspex,
    Plugin,
};
use crate::analyzer::{CoreDumpAnalyzer, ProgramCrashInfo};
use crate::archive::{is_gzip, GzipAdapter, TarballAdapter};
use crate::repo::Repository;
use crate::report::Report;
use hx_common::{find_file_matching, Error, Result};
use hx_config::Preset;
use regex::Regex;
use std::path::Path;
use tracing::debug;

const NAME: &str = "wrapped-core";

const TEMPLATE: &str = r#"[preset]
name = "{name}"
plugin = "wrapped-core"

[debugger]
executable = "gdb"
search_paths = []

[hints]
core_pattern = '^core.+(\.gz)?'

# [repository]
# url = "file:///var/spool/crashes"
# period = 60
"#;

pub struct WrappedCorePlugin;

impl Plugin for WrappedCorePlugin {
    fn name(&self) -> &str {
        NAME
    }

    fn description(&self) -> &str {
        "inspect a core dump wrapped in a tarball"
    }

    fn preset_template(&self) -> &str {
        TEMPLATE
    }

    fn create_haruspex(&self, preset: &Preset) -> Result<Box<dyn Haruspex>> {
        Ok(Box::new(WrappedCoreHaruspex {
            analyzer: analyzer_from_preset(preset),
            repository: repository_from_preset(preset)?,
            core_pattern: compile_pattern(preset.core_pattern())?,
        }))
    }
}

struct WrappedCoreHaruspex {
    analyzer: CoreDumpAnalyzer,
    repository: Option<Repository>,
    core_pattern: Regex,
}

/// Analyze an extracted core dump, transparently ungzipping it.
pub(super) fn analyze_extracted(
    analyzer: &CoreDumpAnalyzer,
    core: &Path,
) -> Result<ProgramCrashInfo> {
    if is_gzip(core)? {
        debug!(core = %core.display(), "gzipped core dump inside archive");
        let adapter = GzipAdapter::open(core)?;
        let mut crash = analyzer.analyze(adapter.path())?;
        crash.core_dump = stripped_basename(core);
        Ok(crash)
    } else {
        analyzer.analyze(core)
    }
}

/// Locate the core dump in an extracted tree.
pub(super) fn find_core(pattern: &Regex, dir: &Path) -> Result<std::path::PathBuf> {
    find_file_matching(pattern, dir).ok_or_else(|| Error::NoMatch {
        pattern: pattern.as_str().to_owned(),
    })
}

impl Haruspex for WrappedCoreHaruspex {
    fn name(&self) -> &str {
        NAME
    }

    fn repository(&self) -> Option<&Repository> {
        self.repository.as_ref()
    }

    fn inspect(&self, archive: &Path) -> Result<Report> {
        let adapter = TarballAdapter::open(archive)?;
        let core = find_core(&self.core_pattern, adapter.dir())?;
        debug!(core = %core.display(), "core dump found in archive");

        let crash = analyze_extracted(&self.analyzer, &core)?;
        Ok(Report::from_crash_info(
            archive,
            NAME,
            crash,
            self.analyzer.debugger_path(),
        ))
    }
}
