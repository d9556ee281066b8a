//! Directory-backed fetcher.
//!
//! Serves a local directory as a repository: listing is a directory
//! scan ordered by modification time, retrieval is a chunked copy with
//! progress reporting. Used for `file://` URLs and in tests.

use super::{Fetcher, Progress, RemoteEntry};
use chrono::{DateTime, Local};
use hx_common::{Error, Result};
use regex::Regex;
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

const COPY_CHUNK: usize = 8192;

/// Fetcher over a plain directory.
pub struct DirFetcher {
    url: String,
    root: PathBuf,
}

impl DirFetcher {
    pub fn new(url: String, root: PathBuf) -> DirFetcher {
        DirFetcher { url, root }
    }
}

impl Fetcher for DirFetcher {
    fn url(&self) -> &str {
        &self.url
    }

    fn lookup(&self, pattern: Option<&Regex>, count: usize) -> Result<Vec<RemoteEntry>> {
        let mut entries = Vec::new();
        for entry in std::fs::read_dir(&self.root)? {
            let entry = entry?;
            let metadata = entry.metadata()?;
            if !metadata.is_file() {
                continue;
            }
            let filename = entry.file_name().to_string_lossy().into_owned();
            if let Some(pattern) = pattern {
                if !pattern.is_match(&filename) {
                    continue;
                }
            }
            let modified: DateTime<Local> = metadata.modified()?.into();
            entries.push(RemoteEntry { filename, modified });
        }

        // Newest first; equal timestamps fall back to filename order so
        // repeated lookups stay stable.
        entries.sort_by(|a, b| {
            b.modified
                .cmp(&a.modified)
                .then_with(|| b.filename.cmp(&a.filename))
        });
        entries.truncate(count);

        if entries.is_empty() {
            return Err(Error::NotFound);
        }
        debug!(count = entries.len(), root = %self.root.display(), "listed archives");
        Ok(entries)
    }

    fn retrieve(
        &self,
        filename: &str,
        dest: &Path,
        mut progress: Option<Progress<'_>>,
    ) -> Result<PathBuf> {
        let source_path = self.root.join(filename);
        let mut source = File::open(&source_path)?;
        let total = source.metadata()?.len();

        let dest_path = dest.join(filename);
        let mut out = File::create(&dest_path)?;

        let mut buf = [0u8; COPY_CHUNK];
        let mut copied = 0u64;
        loop {
            let n = source.read(&mut buf)?;
            if n == 0 {
                break;
            }
            out.write_all(&buf[..n])?;
            copied += n as u64;
            if let Some(report) = progress.as_deref_mut() {
                let percent = if total == 0 {
                    100
                } else {
                    ((copied * 100) / total).min(100) as u8
                };
                report(copied, percent);
            }
        }
        debug!(filename, bytes = copied, dest = %dest_path.display(), "retrieved archive");
        Ok(dest_path)
    }
}
