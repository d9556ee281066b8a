//! Minimal ELF reading for core-dump inspection.
//!
//! This is deliberately not a general ELF toolchain: it knows just
//! enough of the container format to find the PT_NOTE segment of a core
//! dump and decode the process-info note inside it.

pub mod core_dump;
pub mod note;
pub mod prpsinfo;

pub use core_dump::{parse_core_dump, parse_core_dump_from, CoreDumpInfo};
pub use note::{Note, NoteIter, NoteType};
pub use prpsinfo::ProcessInfo;

use hx_common::{Error, Result};

/// `e_machine` value for Intel 80386.
pub const EM_386: u16 = 3;
/// `e_machine` value for AMD x86-64.
pub const EM_X86_64: u16 = 62;

/// Machine architecture of a core dump, as far as prpsinfo layout is
/// concerned.
///
/// Unknown machines fall back to [`Architecture::Generic`], the 32-bit
/// flag/uid/gid layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Architecture {
    X86,
    X86_64,
    Generic,
}

impl Architecture {
    /// Select the architecture from an ELF `e_machine` value.
    pub fn from_machine(machine: u16) -> Architecture {
        match machine {
            EM_386 => Architecture::X86,
            EM_X86_64 => Architecture::X86_64,
            _ => Architecture::Generic,
        }
    }
}

impl std::fmt::Display for Architecture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Architecture::X86 => write!(f, "x86"),
            Architecture::X86_64 => write!(f, "x86-64"),
            Architecture::Generic => write!(f, "generic"),
        }
    }
}

/// ELF file class from `EI_CLASS`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Class {
    Elf32,
    Elf64,
}

/// Byte order from `EI_DATA`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endianness {
    Little,
    Big,
}

impl Endianness {
    pub fn read_u16(self, bytes: &[u8]) -> u16 {
        let raw = [bytes[0], bytes[1]];
        match self {
            Endianness::Little => u16::from_le_bytes(raw),
            Endianness::Big => u16::from_be_bytes(raw),
        }
    }

    pub fn read_u32(self, bytes: &[u8]) -> u32 {
        let raw = [bytes[0], bytes[1], bytes[2], bytes[3]];
        match self {
            Endianness::Little => u32::from_le_bytes(raw),
            Endianness::Big => u32::from_be_bytes(raw),
        }
    }

    pub fn read_u64(self, bytes: &[u8]) -> u64 {
        let raw = [
            bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7],
        ];
        match self {
            Endianness::Little => u64::from_le_bytes(raw),
            Endianness::Big => u64::from_be_bytes(raw),
        }
    }
}

/// Round `value` up to the next multiple of `align`.
///
/// ELF notes pad names and descriptors independently; 4-byte alignment
/// is the authoritative granularity here.
pub(crate) fn round_up(value: u64, align: u64) -> u64 {
    value.div_ceil(align) * align
}

/// Take the bytes before the first NUL and decode them permissively.
pub(crate) fn cstr_lossy(bytes: &[u8]) -> String {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..end]).into_owned()
}

pub(crate) fn invalid(path: &std::path::Path, reason: impl Into<String>) -> Error {
    Error::invalid_file(path, reason)
}

/// Read exactly `len` bytes.
pub(crate) fn read_exact_vec<R: std::io::Read>(reader: &mut R, len: usize) -> Result<Vec<u8>> {
    let mut buf = vec![0u8; len];
    reader.read_exact(&mut buf)?;
    Ok(buf)
}
