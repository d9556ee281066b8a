//! Exit codes for the hx CLI.
//!
//! Exit codes communicate the failure class without requiring output
//! parsing. Ranges:
//! - 0: clean run
//! - 10-19: user/environment errors (recoverable by user action)
//! - 20-29: internal errors

use hx_common::{Error, ErrorCategory};

/// Exit codes for hx operations.
///
/// These codes are a stable contract for automation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Success.
    Clean = 0,

    /// Invalid arguments.
    ArgsError = 10,

    /// Preset or configuration misuse.
    ConfigError = 11,

    /// No executable, archive, or pattern match found.
    NotFound = 12,

    /// A file could not be parsed as what it claims to be.
    InvalidFile = 13,

    /// The external debugger failed.
    DebuggerError = 14,

    /// The remote repository failed.
    RepositoryError = 15,

    /// I/O error.
    IoError = 20,
}

impl ExitCode {
    /// Convert to i32 for process exit.
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Whether this exit code indicates an error.
    pub fn is_error(self) -> bool {
        (self as i32) >= 10
    }

    /// Map an error to its exit code by category.
    pub fn from_error(err: &Error) -> ExitCode {
        match err.category() {
            ErrorCategory::Parse => ExitCode::InvalidFile,
            ErrorCategory::Lookup => ExitCode::NotFound,
            ErrorCategory::Debugger => ExitCode::DebuggerError,
            ErrorCategory::Repository => ExitCode::RepositoryError,
            ErrorCategory::Config => ExitCode::ConfigError,
            ErrorCategory::Io => ExitCode::IoError,
        }
    }

    /// The error code name as a string constant.
    pub fn code_name(&self) -> &'static str {
        match self {
            ExitCode::Clean => "OK_CLEAN",
            ExitCode::ArgsError => "ERR_ARGS",
            ExitCode::ConfigError => "ERR_CONFIG",
            ExitCode::NotFound => "ERR_NOT_FOUND",
            ExitCode::InvalidFile => "ERR_INVALID_FILE",
            ExitCode::DebuggerError => "ERR_DEBUGGER",
            ExitCode::RepositoryError => "ERR_REPOSITORY",
            ExitCode::IoError => "ERR_IO",
        }
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as i32
    }
}

impl std::fmt::Display for ExitCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.code_name(), self.as_i32())
    }
}
