//! External debugger adapter.
//!
//! The concrete adapter drives gdb in batch mode: load the executable,
//! load the core file, print the backtrace and thread info, quit. The
//! captured output is decoded permissively and handed back as lines.

use hx_common::{Error, Result};
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info};

/// Something able to produce a backtrace from (core, executable).
pub trait Debugger {
    /// Path of the underlying debugger executable.
    fn path(&self) -> &Path;

    /// Run the debugger and return its output split into lines.
    fn generate_backtrace(&self, core: &Path, executable: &Path) -> Result<Vec<String>>;
}

/// Adapter for the GNU debugger.
#[derive(Debug, Clone)]
pub struct GdbDebugger {
    executable: PathBuf,
    solib_paths: Vec<PathBuf>,
    solib_prefix: Option<PathBuf>,
}

impl GdbDebugger {
    pub fn new(
        executable: PathBuf,
        solib_paths: Vec<PathBuf>,
        solib_prefix: Option<PathBuf>,
    ) -> GdbDebugger {
        GdbDebugger {
            executable,
            solib_paths,
            solib_prefix,
        }
    }

    fn command(&self, core: &Path, executable: &Path) -> Command {
        let mut cmd = Command::new(&self.executable);
        cmd.arg("-q");
        if !self.solib_paths.is_empty() {
            let joined = self
                .solib_paths
                .iter()
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
                .join(":");
            cmd.arg("-ex").arg(format!("set solib-search-path {joined}"));
        }
        if let Some(prefix) = &self.solib_prefix {
            cmd.arg("-ex")
                .arg(format!("set solib-absolute-prefix {}", prefix.display()));
        }
        cmd.arg("-ex").arg(format!("file {}", executable.display()));
        cmd.arg("-ex").arg(format!("core-file {}", core.display()));
        cmd.arg("-ex").arg("backtrace");
        cmd.arg("-ex").arg("info threads");
        cmd.arg("-ex").arg("quit");
        cmd
    }
}

impl Debugger for GdbDebugger {
    fn path(&self) -> &Path {
        &self.executable
    }

    fn generate_backtrace(&self, core: &Path, executable: &Path) -> Result<Vec<String>> {
        info!(
            executable = %executable.display(),
            core = %core.display(),
            "generating backtrace"
        );
        let mut cmd = self.command(core, executable);
        debug!(?cmd, "running debugger");

        let output = cmd.output().map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                Error::ExecutableNotFound {
                    name: self.executable.display().to_string(),
                }
            } else {
                Error::Io(e)
            }
        })?;

        // stdout first, then stderr; the scripted command output all
        // lands on stdout.
        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));

        if !output.status.success() {
            return Err(Error::DebuggerExecution {
                debugger: self.executable.display().to_string(),
                status: output.status.code().unwrap_or(-1),
                output: combined,
            });
        }

        Ok(combined.lines().map(str::to_owned).collect())
    }
}
