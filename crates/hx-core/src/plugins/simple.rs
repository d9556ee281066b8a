//! The simple-core plugin: bare core dumps, optionally gzipped.

use super::{analyzer_from_preset, repository_from_preset, stripped_basename, Haruspex, Plugin};
use crate::analyzer::CoreDumpAnalyzer;
use crate::archive::{is_gzip, GzipAdapter};
use crate::repo::Repository;
use crate::report::Report;
use hx_common::Result;
use hx_config::Preset;
use std::path::Path;
use tracing::debug;

const NAME: &str = "simple-core";

const TEMPLATE: &str = r#"[preset]
name = "{name}"
plugin = "simple-core"

[debugger]
executable = "gdb"
search_paths = []

# [repository]
# url = "file:///var/spool/crashes"
# period = 60
"#;

pub struct SimpleCorePlugin;

impl Plugin for SimpleCorePlugin {
    fn name(&self) -> &str {
        NAME
    }

    fn description(&self) -> &str {
        "inspect a plain core dump, gzipped or not"
    }

    fn preset_template(&self) -> &str {
        TEMPLATE
    }

    fn create_haruspex(&self, preset: &Preset) -> Result<Box<dyn Haruspex>> {
        Ok(Box::new(SimpleCoreHaruspex {
            analyzer: analyzer_from_preset(preset),
            repository: repository_from_preset(preset)?,
        }))
    }
}

struct SimpleCoreHaruspex {
    analyzer: CoreDumpAnalyzer,
    repository: Option<Repository>,
}

impl Haruspex for SimpleCoreHaruspex {
    fn name(&self) -> &str {
        NAME
    }

    fn repository(&self) -> Option<&Repository> {
        self.repository.as_ref()
    }

    fn inspect(&self, archive: &Path) -> Result<Report> {
        let crash = if is_gzip(archive)? {
            debug!(archive = %archive.display(), "gzipped core dump");
            let adapter = GzipAdapter::open(archive)?;
            let mut crash = self.analyzer.analyze(adapter.path())?;
            // The decompressed copy has a throwaway name; report the
            // archive itself, minus the compression suffix.
            crash.core_dump = stripped_basename(archive);
            crash
        } else {
            self.analyzer.analyze(archive)?
        };
        Ok(Report::from_crash_info(
            archive,
            NAME,
            crash,
            self.analyzer.debugger_path(),
        ))
    }
}
