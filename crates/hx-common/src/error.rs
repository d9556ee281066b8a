//! Error types for haruspex.
//!
//! One workspace-wide enum, grouped by category:
//! - Binary layout violations (malformed note, truncated structure)
//! - File recognition failures (not a core dump)
//! - Lookup failures (missing executable, no remote/local match)
//! - External tool failures (debugger subprocess)
//! - Preset/configuration misuse
//!
//! Every component surfaces its failure to the caller unchanged; the CLI
//! boundary maps categories to stable exit codes.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for haruspex operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error categories for grouping and exit-code mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Binary layout violated or file not recognizable.
    Parse,
    /// No executable, remote archive, or pattern match found.
    Lookup,
    /// External debugger failed.
    Debugger,
    /// Remote repository failure.
    Repository,
    /// Preset or configuration misuse.
    Config,
    /// File I/O and rendering failures.
    Io,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCategory::Parse => write!(f, "parse"),
            ErrorCategory::Lookup => write!(f, "lookup"),
            ErrorCategory::Debugger => write!(f, "debugger"),
            ErrorCategory::Repository => write!(f, "repository"),
            ErrorCategory::Config => write!(f, "config"),
            ErrorCategory::Io => write!(f, "io"),
        }
    }
}

/// Unified error type for haruspex.
#[derive(Debug, Error)]
pub enum Error {
    /// A note record declares lengths that do not fit its segment.
    #[error("malformed note at offset {offset:#x}: {reason}")]
    MalformedNote { offset: u64, reason: String },

    /// A descriptor is shorter than the structure it is supposed to hold.
    #[error("truncated {structure}: expected {expected} bytes, got {actual}")]
    TruncatedStructure {
        structure: &'static str,
        expected: usize,
        actual: usize,
    },

    /// The file is not a recognizable core dump.
    #[error("invalid file '{}': {reason}", path.display())]
    InvalidFile { path: PathBuf, reason: String },

    /// No candidate executable on the configured search paths.
    #[error("can not find '{name}' in any search path")]
    ExecutableNotFound { name: String },

    /// The external debugger exited non-zero.
    #[error("debugger '{debugger}' exited with status {status}")]
    DebuggerExecution {
        debugger: String,
        status: i32,
        output: String,
    },

    /// The remote repository has no matching archive.
    #[error("no crash archive found in repository")]
    NotFound,

    /// No file matched the configured pattern.
    #[error("no file matching '{pattern}'")]
    NoMatch { pattern: String },

    /// Network or protocol failure talking to the repository.
    #[error("repository error: {0}")]
    Repository(String),

    /// An invalid user-supplied regular expression.
    #[error("invalid pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// No plugin registered under this name.
    #[error("unknown plugin '{0}'")]
    UnknownPlugin(String),

    /// No preset stored under this name.
    #[error("preset '{0}' not found")]
    PresetNotFound(String),

    /// A preset with this name already exists.
    #[error("preset '{0}' already exists")]
    PresetExists(String),

    /// A preset or settings file is unusable.
    #[error("configuration error: {0}")]
    Config(String),

    /// Report rendering failed.
    #[error("report rendering failed: {0}")]
    Render(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Returns the error category for exit-code mapping.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::MalformedNote { .. }
            | Error::TruncatedStructure { .. }
            | Error::InvalidFile { .. } => ErrorCategory::Parse,

            Error::ExecutableNotFound { .. } | Error::NotFound | Error::NoMatch { .. } => {
                ErrorCategory::Lookup
            }

            Error::DebuggerExecution { .. } => ErrorCategory::Debugger,

            Error::Repository(_) => ErrorCategory::Repository,

            Error::Pattern { .. }
            | Error::UnknownPlugin(_)
            | Error::PresetNotFound(_)
            | Error::PresetExists(_)
            | Error::Config(_) => ErrorCategory::Config,

            Error::Render(_) | Error::Io(_) => ErrorCategory::Io,
        }
    }

    /// Convenience constructor for [`Error::InvalidFile`].
    pub fn invalid_file(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Error::InvalidFile {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Convenience constructor for [`Error::MalformedNote`].
    pub fn malformed_note(offset: u64, reason: impl Into<String>) -> Self {
        Error::MalformedNote {
            offset,
            reason: reason.into(),
        }
    }
}
