//! Core-dump analysis: parse, locate the executable, run the debugger.

use crate::debugger::Debugger;
use crate::elf::parse_core_dump;
use hx_common::{find_executable, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

/// The analysis result consumed by report construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgramCrashInfo {
    /// Name of the crashed executable.
    pub executable: String,
    /// Basename of the analyzed core dump.
    pub core_dump: String,
    /// Backtrace lines from the debugger.
    pub backtrace: Vec<String>,
}

/// Composes the core-dump parser, executable lookup, and the debugger
/// adapter.
pub struct CoreDumpAnalyzer {
    debugger: Box<dyn Debugger>,
    search_paths: Vec<PathBuf>,
}

impl CoreDumpAnalyzer {
    pub fn new(debugger: Box<dyn Debugger>, search_paths: Vec<PathBuf>) -> CoreDumpAnalyzer {
        CoreDumpAnalyzer {
            debugger,
            search_paths,
        }
    }

    /// The configured search paths, in lookup order.
    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }

    /// Path of the debugger in use.
    pub fn debugger_path(&self) -> &Path {
        self.debugger.path()
    }

    /// Analyze a core dump file.
    ///
    /// Parses the dump for the crashed process's identity, finds a
    /// matching executable on the search paths (first match wins), and
    /// drives the debugger against the pair.
    pub fn analyze(&self, core: &Path) -> Result<ProgramCrashInfo> {
        let core_info = parse_core_dump(core)?;
        let executable = core_info.process_info.name;
        info!(executable = %executable, "core dump file generated by process");

        let reference = find_executable(&executable, &self.search_paths)?;
        info!(reference = %reference.display(), "using executable as reference");

        let backtrace = self.debugger.generate_backtrace(core, &reference)?;

        let core_dump = core
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| core.display().to_string());

        Ok(ProgramCrashInfo {
            executable,
            core_dump,
            backtrace,
        })
    }
}
