//! Fuzz target for core-dump parsing.
//!
//! Core dumps come from crashed, possibly hostile processes; parsing
//! must handle arbitrary input without panicking.

#![no_main]

use libfuzzer_sys::fuzz_target;
use std::io::Cursor;
use std::path::Path;

fuzz_target!(|data: &[u8]| {
    // Must never panic, only return an error.
    let mut cursor = Cursor::new(data);
    let _ = hx_core::elf::parse_core_dump_from(&mut cursor, Path::new("fuzz"));
});
