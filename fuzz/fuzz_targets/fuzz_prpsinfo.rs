//! Fuzz target for prpsinfo descriptor decoding.

#![no_main]

use hx_core::elf::{Architecture, Endianness};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Some((&selector, desc)) = data.split_first() else {
        return;
    };
    let arch = match selector & 0b11 {
        0 => Architecture::X86,
        1 => Architecture::X86_64,
        _ => Architecture::Generic,
    };
    let endian = if selector & 0b100 == 0 {
        Endianness::Little
    } else {
        Endianness::Big
    };
    let _ = hx_core::elf::prpsinfo::decode(desc, arch, endian);
});
