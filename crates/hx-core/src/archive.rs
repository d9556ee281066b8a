//! Scoped archive unwrapping.
//!
//! Adapters acquire a private decompressed/extracted copy on
//! construction and delete it when dropped, on every exit path. Setting
//! `HX_KEEP_TEMP` keeps the temporary files around for debugging; their
//! paths are logged.

use flate2::read::GzDecoder;
use hx_common::{env_flag, Error, Result};
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};
use tempfile::{TempDir, TempPath};
use tracing::{debug, info};

/// Environment override retaining adapter temporaries.
pub const KEEP_TEMP_ENV: &str = "HX_KEEP_TEMP";

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Check the two-byte gzip magic.
pub fn is_gzip(path: &Path) -> Result<bool> {
    let mut file = File::open(path)?;
    let mut magic = [0u8; 2];
    match file.read_exact(&mut magic) {
        Ok(()) => Ok(magic == GZIP_MAGIC),
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Ok(false),
        Err(e) => Err(Error::Io(e)),
    }
}

/// A gzip archive decompressed to a temporary file.
#[derive(Debug)]
pub struct GzipAdapter {
    path: PathBuf,
    // Dropping the TempPath removes the file; None when retained.
    temp: Option<TempPath>,
}

impl GzipAdapter {
    /// Decompress `path` to a private temporary file.
    pub fn open(path: &Path) -> Result<GzipAdapter> {
        let file = File::open(path)?;
        let mut decoder = GzDecoder::new(BufReader::new(file));
        let mut temp = tempfile::Builder::new()
            .prefix("hx-core-")
            .tempfile()?;
        io::copy(&mut decoder, temp.as_file_mut())
            .map_err(|e| Error::invalid_file(path, format!("gzip decompression: {e}")))?;

        let temp_path = temp.into_temp_path();
        if env_flag(KEEP_TEMP_ENV) {
            let kept = temp_path.keep().map_err(|e| Error::Io(e.error))?;
            info!(path = %kept.display(), "retaining decompressed file");
            Ok(GzipAdapter {
                path: kept,
                temp: None,
            })
        } else {
            debug!(path = %temp_path.display(), "decompressed to temporary file");
            Ok(GzipAdapter {
                path: temp_path.to_path_buf(),
                temp: Some(temp_path),
            })
        }
    }

    /// Path of the decompressed file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the decompressed file outlives this adapter.
    pub fn retained(&self) -> bool {
        self.temp.is_none()
    }
}

/// A tarball extracted to a temporary directory.
///
/// Transparent about compression: both plain and gzip-compressed
/// tarballs are accepted.
#[derive(Debug)]
pub struct TarballAdapter {
    dir: PathBuf,
    temp: Option<TempDir>,
}

impl TarballAdapter {
    /// Extract `path` into a private temporary directory.
    pub fn open(path: &Path) -> Result<TarballAdapter> {
        let dir = tempfile::Builder::new().prefix("hx-core-").tempdir()?;

        let file = File::open(path)?;
        let result = if is_gzip(path)? {
            tar::Archive::new(GzDecoder::new(BufReader::new(file))).unpack(dir.path())
        } else {
            tar::Archive::new(BufReader::new(file)).unpack(dir.path())
        };
        result.map_err(|e| Error::invalid_file(path, format!("tar extraction: {e}")))?;

        if env_flag(KEEP_TEMP_ENV) {
            let kept = dir.keep();
            info!(dir = %kept.display(), "retaining extracted tree");
            Ok(TarballAdapter {
                dir: kept,
                temp: None,
            })
        } else {
            debug!(dir = %dir.path().display(), "extracted to temporary directory");
            Ok(TarballAdapter {
                dir: dir.path().to_path_buf(),
                temp: Some(dir),
            })
        }
    }

    /// Root of the extracted tree.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Whether the extracted tree outlives this adapter.
    pub fn retained(&self) -> bool {
        self.temp.is_none()
    }
}
