//! Preset and settings management for haruspex.
//!
//! A preset is a named TOML document binding a plugin to its toolchain
//! configuration (debugger, search paths, repository, hint patterns).
//! Presets live in `presets.d/` under the configuration directory;
//! application-level settings live next to them in `config.toml`.

pub mod manager;
pub mod preset;
pub mod settings;

pub use manager::PresetManager;
pub use preset::{Preset, DEFAULT_CORE_PATTERN, DEFAULT_POLL_PERIOD};
pub use settings::{config_dir, presets_dir, Settings};
