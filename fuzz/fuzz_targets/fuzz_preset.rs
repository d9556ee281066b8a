//! Fuzz target for preset parsing.

#![no_main]

use hx_config::Preset;
use libfuzzer_sys::fuzz_target;
use std::path::Path;

fuzz_target!(|data: &[u8]| {
    if let Ok(text) = std::str::from_utf8(data) {
        let _ = Preset::parse(text, Path::new("fuzz.toml"));
    }
});
