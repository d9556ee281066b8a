//! Preset discovery and lifecycle.
//!
//! The manager scans a directory for `*.toml` presets, keeps them in
//! memory, and handles creation from a plugin template, editing via
//! `$EDITOR`, and removal. Lookup returns an `Option` rather than
//! probing with errors.

use crate::preset::Preset;
use hx_common::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, warn};

/// Placeholder replaced by the preset name in plugin templates.
const NAME_PLACEHOLDER: &str = "{name}";

/// Manages the preset directory.
#[derive(Debug)]
pub struct PresetManager {
    dir: PathBuf,
    presets: Vec<Preset>,
}

impl PresetManager {
    /// Open a preset directory, creating it if needed, and scan it.
    pub fn open(dir: &Path) -> Result<PresetManager> {
        if !dir.exists() {
            fs::create_dir_all(dir)?;
        }
        let mut manager = PresetManager {
            dir: dir.to_path_buf(),
            presets: Vec::new(),
        };
        manager.scan()?;
        Ok(manager)
    }

    /// Re-scan the preset directory.
    pub fn scan(&mut self) -> Result<()> {
        self.presets.clear();
        let mut paths: Vec<PathBuf> = fs::read_dir(&self.dir)?
            .filter_map(|e| e.ok().map(|e| e.path()))
            .filter(|p| p.extension().is_some_and(|ext| ext == "toml"))
            .collect();
        paths.sort();

        for path in paths {
            match Preset::load(&path) {
                Ok(preset) => {
                    debug!(name = preset.name(), path = %path.display(), "found preset");
                    self.presets.push(preset);
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "skipping unreadable preset");
                }
            }
        }
        Ok(())
    }

    /// All loaded presets.
    pub fn presets(&self) -> &[Preset] {
        &self.presets
    }

    /// Find a preset by name.
    pub fn lookup(&self, name: &str) -> Option<&Preset> {
        self.presets.iter().find(|p| p.name() == name)
    }

    /// Create a new preset from a plugin template.
    ///
    /// The template's `{name}` placeholder is replaced by the preset
    /// name. Fails with [`Error::PresetExists`] if the name is taken.
    pub fn create(&mut self, name: &str, template: &str) -> Result<&Preset> {
        if self.lookup(name).is_some() {
            return Err(Error::PresetExists(name.into()));
        }
        let path = self.dir.join(format!("{name}.toml"));
        let text = template.replace(NAME_PLACEHOLDER, name);
        // Validate before writing so a broken template never lands on disk.
        Preset::parse(&text, &path)?;
        fs::write(&path, text)?;
        self.scan()?;
        self.lookup(name)
            .ok_or_else(|| Error::Config(format!("preset '{name}' did not survive a re-scan")))
    }

    /// Open a preset in `$EDITOR` (fallback `vi`), then reload it.
    pub fn edit(&mut self, name: &str) -> Result<()> {
        let path = self
            .lookup(name)
            .ok_or_else(|| Error::PresetNotFound(name.into()))?
            .path()
            .to_path_buf();
        let editor = std::env::var("EDITOR").unwrap_or_else(|_| "vi".into());
        let status = Command::new(&editor).arg(&path).status()?;
        if !status.success() {
            return Err(Error::Config(format!(
                "editor '{editor}' exited with status {}",
                status.code().unwrap_or(-1)
            )));
        }
        self.scan()
    }

    /// Delete a preset file.
    pub fn remove(&mut self, name: &str) -> Result<()> {
        let path = self
            .lookup(name)
            .ok_or_else(|| Error::PresetNotFound(name.into()))?
            .path()
            .to_path_buf();
        fs::remove_file(path)?;
        self.scan()
    }
}
