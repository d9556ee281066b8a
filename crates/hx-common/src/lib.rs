//! Shared types and helpers for the haruspex workspace.
//!
//! This crate holds what every other crate needs:
//! - The unified [`Error`] taxonomy and [`Result`] alias
//! - Search-path and file-matching helpers used by the analyzer and plugins
//! - Environment override probes for temporary-file retention

pub mod error;
pub mod fs;

pub use error::{Error, ErrorCategory, Result};
pub use fs::{env_flag, expand_tilde, find_executable, find_file_matching, find_text};
