//! Remote crash-archive repositories.
//!
//! A [`Fetcher`] lists and retrieves archives from one location; a
//! [`Repository`] adds the user-facing operations on top: peek at the
//! newest entries, fetch the latest archive, or watch for new arrivals
//! by polling. Watching is driven by a duration budget; there is no
//! other cancellation path.

mod dir;

pub use dir::DirFetcher;

use chrono::{DateTime, Local};
use hx_common::{Error, Result};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// One remote archive, as listed by a fetcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteEntry {
    /// Archive filename, relative to the repository root.
    pub filename: String,
    /// Last modification time.
    pub modified: DateTime<Local>,
}

/// Byte-progress callback for retrievals: cumulative bytes, percent.
pub type Progress<'a> = &'a mut dyn FnMut(u64, u8);

/// Access to one remote archive location.
pub trait Fetcher {
    /// The location this fetcher reads from, for display.
    fn url(&self) -> &str;

    /// List up to `count` archives, newest first.
    ///
    /// When `pattern` is given only matching filenames are considered.
    /// Fails with [`Error::NotFound`] when nothing qualifies.
    fn lookup(&self, pattern: Option<&Regex>, count: usize) -> Result<Vec<RemoteEntry>>;

    /// Download `filename` into `dest`, reporting progress along the way.
    ///
    /// Returns the path of the downloaded file.
    fn retrieve(&self, filename: &str, dest: &Path, progress: Option<Progress<'_>>)
        -> Result<PathBuf>;
}

impl std::fmt::Debug for dyn Fetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Fetcher").field("url", &self.url()).finish()
    }
}

/// Build a fetcher for a repository URL.
///
/// `file://` URLs and plain paths map to the directory fetcher; any
/// other scheme is rejected.
pub fn fetcher_for_url(url: &str) -> Result<Box<dyn Fetcher>> {
    if let Some(path) = url.strip_prefix("file://") {
        return Ok(Box::new(DirFetcher::new(url.to_owned(), PathBuf::from(path))));
    }
    match url.split_once("://") {
        None => Ok(Box::new(DirFetcher::new(
            url.to_owned(),
            PathBuf::from(url),
        ))),
        Some((scheme, _)) => Err(Error::Repository(format!(
            "unsupported URL scheme '{scheme}'"
        ))),
    }
}

/// A remote repository polled at a fixed period.
pub struct Repository {
    fetcher: Box<dyn Fetcher>,
    period: Duration,
}

impl Repository {
    pub fn new(fetcher: Box<dyn Fetcher>, period: Duration) -> Repository {
        Repository { fetcher, period }
    }

    /// Build a repository straight from its URL.
    pub fn connect(url: &str, period: Duration) -> Result<Repository> {
        Ok(Repository::new(fetcher_for_url(url)?, period))
    }

    /// The repository location, for display.
    pub fn url(&self) -> &str {
        self.fetcher.url()
    }

    /// The polling period.
    pub fn period(&self) -> Duration {
        self.period
    }

    /// List the newest archives without downloading anything.
    pub fn peek(&self, pattern: Option<&Regex>, count: usize) -> Result<Vec<RemoteEntry>> {
        self.fetcher.lookup(pattern, count)
    }

    /// Download the newest matching archive into `dest`.
    pub fn fetch(
        &self,
        pattern: Option<&Regex>,
        dest: &Path,
        progress: Option<Progress<'_>>,
    ) -> Result<PathBuf> {
        let entries = self.fetcher.lookup(pattern, 1)?;
        // lookup never returns an empty Ok.
        let newest = &entries[0];
        info!(filename = %newest.filename, url = self.url(), "fetching archive");
        self.fetcher.retrieve(&newest.filename, dest, progress)
    }

    /// Download a specific archive into `dest`.
    pub fn retrieve(
        &self,
        filename: &str,
        dest: &Path,
        progress: Option<Progress<'_>>,
    ) -> Result<PathBuf> {
        self.fetcher.retrieve(filename, dest, progress)
    }

    /// Poll for new archives until the duration budget runs out.
    ///
    /// The first lookup only records the current newest archive; the
    /// callback fires once per subsequent poll whose newest filename
    /// differs from the recorded one. An empty repository is not an
    /// error while watching.
    pub fn watch(
        &self,
        pattern: Option<&Regex>,
        duration: Duration,
        on_new: &mut dyn FnMut(&RemoteEntry) -> Result<()>,
    ) -> Result<()> {
        let started = Instant::now();
        let mut latest = match self.fetcher.lookup(pattern, 1) {
            Ok(entries) => entries.into_iter().next().map(|e| e.filename),
            Err(Error::NotFound) => None,
            Err(e) => return Err(e),
        };
        debug!(?latest, url = self.url(), "watching repository");

        loop {
            let elapsed = started.elapsed();
            if elapsed >= duration {
                return Ok(());
            }
            std::thread::sleep(self.period.min(duration - elapsed));

            let newest = match self.fetcher.lookup(pattern, 1) {
                Ok(entries) => match entries.into_iter().next() {
                    Some(entry) => entry,
                    None => continue,
                },
                Err(Error::NotFound) => continue,
                Err(e) => return Err(e),
            };
            if latest.as_deref() != Some(newest.filename.as_str()) {
                info!(filename = %newest.filename, "new archive in repository");
                latest = Some(newest.filename.clone());
                on_new(&newest)?;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::VecDeque;

    #[test]
    fn test_fetcher_for_url_schemes() {
        assert_eq!(fetcher_for_url("file:///srv/crashes").unwrap().url(), "file:///srv/crashes");
        assert_eq!(fetcher_for_url("/srv/crashes").unwrap().url(), "/srv/crashes");
        let err = fetcher_for_url("sftp://host/crashes").unwrap_err();
        assert!(matches!(err, Error::Repository(_)));
    }

    /// Replays a scripted sequence of newest filenames, then repeats
    /// the last one forever.
    struct ScriptedFetcher {
        script: RefCell<VecDeque<&'static str>>,
        last: RefCell<Option<&'static str>>,
    }

    impl ScriptedFetcher {
        fn new(script: &[&'static str]) -> ScriptedFetcher {
            ScriptedFetcher {
                script: RefCell::new(script.iter().copied().collect()),
                last: RefCell::new(None),
            }
        }
    }

    impl Fetcher for ScriptedFetcher {
        fn url(&self) -> &str {
            "scripted://"
        }

        fn lookup(&self, _pattern: Option<&Regex>, _count: usize) -> Result<Vec<RemoteEntry>> {
            let next = self
                .script
                .borrow_mut()
                .pop_front()
                .or(*self.last.borrow());
            match next {
                Some(name) => {
                    *self.last.borrow_mut() = Some(name);
                    Ok(vec![RemoteEntry {
                        filename: name.to_owned(),
                        modified: Local::now(),
                    }])
                }
                None => Err(Error::NotFound),
            }
        }

        fn retrieve(
            &self,
            _filename: &str,
            _dest: &Path,
            _progress: Option<Progress<'_>>,
        ) -> Result<PathBuf> {
            unreachable!("watch never retrieves")
        }
    }

    #[test]
    fn test_watch_fires_once_per_change() {
        // Seed sees A; the polls see A, B, B, C: two changes.
        let fetcher = ScriptedFetcher::new(&["a.gz", "a.gz", "b.gz", "b.gz", "c.gz"]);
        let repo = Repository::new(Box::new(fetcher), Duration::from_millis(1));

        let mut seen = Vec::new();
        repo.watch(None, Duration::from_millis(60), &mut |entry| {
            seen.push(entry.filename.clone());
            Ok(())
        })
        .unwrap();

        assert_eq!(seen, vec!["b.gz".to_string(), "c.gz".to_string()]);
    }

    #[test]
    fn test_watch_tolerates_empty_repository() {
        let fetcher = ScriptedFetcher::new(&[]);
        let repo = Repository::new(Box::new(fetcher), Duration::from_millis(1));
        let mut fired = 0;
        repo.watch(None, Duration::from_millis(10), &mut |_| {
            fired += 1;
            Ok(())
        })
        .unwrap();
        assert_eq!(fired, 0);
    }

    #[test]
    fn test_watch_returns_after_budget() {
        let fetcher = ScriptedFetcher::new(&["a.gz"]);
        let repo = Repository::new(Box::new(fetcher), Duration::from_millis(1));
        let started = Instant::now();
        repo.watch(None, Duration::from_millis(20), &mut |_| Ok(()))
            .unwrap();
        assert!(started.elapsed() >= Duration::from_millis(20));
    }
}
