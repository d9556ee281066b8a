//! Search-path and file-matching helpers.
//!
//! These back the analyzer's executable lookup and the tarball plugins'
//! first-match directory walks. Directory entries are sorted by name so
//! traversal order is deterministic across platforms.

use crate::error::{Error, Result};
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Search an ordered list of directories for a file with the given name.
///
/// First match wins. Fails with [`Error::ExecutableNotFound`] when no
/// directory holds the file.
pub fn find_executable(name: &str, paths: &[PathBuf]) -> Result<PathBuf> {
    for path in paths {
        let candidate = path.join(name);
        if candidate.exists() {
            return Ok(candidate);
        }
        debug!(path = %candidate.display(), "no candidate");
    }
    Err(Error::ExecutableNotFound { name: name.into() })
}

/// Walk a directory tree and return the first file whose name matches the
/// pattern.
///
/// The walk is top-down: files of a directory are considered before its
/// subdirectories, and entries are visited in name order.
pub fn find_file_matching(pattern: &Regex, root: &Path) -> Option<PathBuf> {
    let mut entries: Vec<PathBuf> = fs::read_dir(root)
        .ok()?
        .filter_map(|e| e.ok().map(|e| e.path()))
        .collect();
    entries.sort();

    for entry in entries.iter().filter(|p| p.is_file()) {
        if let Some(name) = entry.file_name().and_then(|n| n.to_str()) {
            if pattern.is_match(name) {
                return Some(entry.clone());
            }
        }
    }
    for entry in entries.iter().filter(|p| p.is_dir()) {
        if let Some(found) = find_file_matching(pattern, entry) {
            return Some(found);
        }
    }
    None
}

/// Extract the first capture group of `pattern` from the first matching
/// line of a text file.
pub fn find_text(path: &Path, pattern: &Regex) -> Result<Option<String>> {
    let contents = fs::read_to_string(path)?;
    for line in contents.lines() {
        if let Some(caps) = pattern.captures(line) {
            let text = caps
                .get(1)
                .map_or_else(|| caps[0].to_string(), |m| m.as_str().to_string());
            return Ok(Some(text));
        }
    }
    Ok(None)
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    } else if path == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    }
    PathBuf::from(path)
}

/// Check a boolean environment override (set and not "0"/"false").
pub fn env_flag(name: &str) -> bool {
    match std::env::var(name) {
        Ok(v) => !v.is_empty() && v != "0" && !v.eq_ignore_ascii_case("false"),
        Err(_) => false,
    }
}
