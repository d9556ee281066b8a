//! Core-dump parsing: ELF header, program headers, process-info note.

use super::note::{NoteIter, NoteType};
use super::prpsinfo::{self, ProcessInfo};
use super::{invalid, read_exact_vec, Architecture, Class, Endianness};
use hx_common::{Error, Result};
use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;
use tracing::debug;

/// Program-header type of a note segment.
const PT_NOTE: u32 = 4;

/// Name of the canonical core-note group.
const CORE_NOTE_NAME: &str = "CORE";

/// The parse result: identity of the crashed process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreDumpInfo {
    pub process_info: ProcessInfo,
}

#[derive(Debug)]
struct ElfHeader {
    class: Class,
    endian: Endianness,
    machine: u16,
    phoff: u64,
    phentsize: u16,
    phnum: u16,
}

impl ElfHeader {
    fn parse<R: Read + Seek>(reader: &mut R, path: &Path) -> Result<ElfHeader> {
        reader.seek(SeekFrom::Start(0))?;
        let mut ident = [0u8; 16];
        reader
            .read_exact(&mut ident)
            .map_err(|_| invalid(path, "shorter than an ELF identification"))?;
        if &ident[0..4] != b"\x7fELF" {
            return Err(invalid(path, "not an ELF file"));
        }
        let class = match ident[4] {
            1 => Class::Elf32,
            2 => Class::Elf64,
            other => return Err(invalid(path, format!("unknown ELF class {other}"))),
        };
        let endian = match ident[5] {
            1 => Endianness::Little,
            2 => Endianness::Big,
            other => return Err(invalid(path, format!("unknown ELF data encoding {other}"))),
        };

        // Rest of the header past e_ident, sized by class.
        let rest_len = match class {
            Class::Elf32 => 36,
            Class::Elf64 => 48,
        };
        let rest = read_exact_vec(reader, rest_len)
            .map_err(|_| invalid(path, "truncated ELF header"))?;

        let machine = endian.read_u16(&rest[2..4]);
        let (phoff, phentsize, phnum) = match class {
            Class::Elf32 => (
                u64::from(endian.read_u32(&rest[12..16])),
                endian.read_u16(&rest[26..28]),
                endian.read_u16(&rest[28..30]),
            ),
            Class::Elf64 => (
                endian.read_u64(&rest[16..24]),
                endian.read_u16(&rest[38..40]),
                endian.read_u16(&rest[40..42]),
            ),
        };

        Ok(ElfHeader {
            class,
            endian,
            machine,
            phoff,
            phentsize,
            phnum,
        })
    }
}

/// The bits of a program header this parser cares about.
#[derive(Debug, Clone, Copy)]
struct Segment {
    p_type: u32,
    offset: u64,
    filesz: u64,
}

fn parse_segment(raw: &[u8], class: Class, endian: Endianness) -> Segment {
    match class {
        Class::Elf32 => Segment {
            p_type: endian.read_u32(&raw[0..4]),
            offset: u64::from(endian.read_u32(&raw[4..8])),
            filesz: u64::from(endian.read_u32(&raw[16..20])),
        },
        Class::Elf64 => Segment {
            p_type: endian.read_u32(&raw[0..4]),
            offset: endian.read_u64(&raw[8..16]),
            filesz: endian.read_u64(&raw[32..40]),
        },
    }
}

/// Parse a core dump from any seekable stream.
///
/// `path` is only used for error reporting.
pub fn parse_core_dump_from<R: Read + Seek>(reader: &mut R, path: &Path) -> Result<CoreDumpInfo> {
    let header = ElfHeader::parse(reader, path)?;
    let arch = Architecture::from_machine(header.machine);
    debug!(%arch, machine = header.machine, "machine architecture");

    let min_entsize = match header.class {
        Class::Elf32 => 32u16,
        Class::Elf64 => 56u16,
    };
    if header.phnum > 0 && header.phentsize < min_entsize {
        return Err(invalid(
            path,
            format!("program header entry size {} too small", header.phentsize),
        ));
    }

    let mut segments = Vec::new();
    for index in 0..header.phnum {
        // phoff is untrusted; entry offsets must not wrap around.
        let at = header
            .phoff
            .checked_add(u64::from(index) * u64::from(header.phentsize))
            .ok_or_else(|| invalid(path, "program header table out of range"))?;
        reader
            .seek(SeekFrom::Start(at))
            .map_err(|_| invalid(path, "program header table out of range"))?;
        let raw = read_exact_vec(reader, usize::from(min_entsize))
            .map_err(|_| invalid(path, "truncated program header table"))?;
        segments.push(parse_segment(&raw, header.class, header.endian));
    }

    let mut saw_note_segment = false;
    for segment in segments.iter().filter(|s| s.p_type == PT_NOTE) {
        saw_note_segment = true;
        debug!(
            offset = segment.offset,
            len = segment.filesz,
            "walking note segment"
        );
        for note in NoteIter::new(reader, header.endian, segment.offset, segment.filesz) {
            let note = note?;
            if note.name == CORE_NOTE_NAME && note.note_type == NoteType::Prpsinfo {
                let process_info = prpsinfo::decode(&note.desc, arch, header.endian)?;
                return Ok(CoreDumpInfo { process_info });
            }
        }
    }

    let reason = if saw_note_segment {
        "no process-info note"
    } else {
        "no note segment"
    };
    Err(invalid(path, reason))
}

/// Parse a core dump file.
///
/// Fails with [`Error::InvalidFile`] when the file is not ELF, has no
/// note segment, or its note segments hold no process-info note. The
/// first matching note wins.
pub fn parse_core_dump(path: &Path) -> Result<CoreDumpInfo> {
    let file = File::open(path).map_err(Error::Io)?;
    let mut reader = BufReader::new(file);
    parse_core_dump_from(&mut reader, path)
}

/// Build a minimal little-endian ELF64 core with the given notes.
/// Each note is (name, type, descriptor). Test helper shared with the
/// analyzer tests.
#[cfg(test)]
pub(crate) fn build_core(machine: u16, notes: &[(&[u8], u32, Vec<u8>)]) -> Vec<u8> {
    let mut seg = Vec::new();
    for (name, note_type, desc) in notes {
        seg.extend_from_slice(&(name.len() as u32).to_le_bytes());
        seg.extend_from_slice(&(desc.len() as u32).to_le_bytes());
        seg.extend_from_slice(&note_type.to_le_bytes());
        seg.extend_from_slice(name);
        while seg.len() % 4 != 0 {
            seg.push(0);
        }
        seg.extend_from_slice(desc);
        while seg.len() % 4 != 0 {
            seg.push(0);
        }
    }

    let mut out = Vec::new();
    // ELF header.
    out.extend_from_slice(b"\x7fELF");
    out.push(2); // 64-bit
    out.push(1); // little-endian
    out.push(1); // version
    out.extend_from_slice(&[0u8; 9]); // OS ABI + padding
    out.extend_from_slice(&4u16.to_le_bytes()); // e_type = ET_CORE
    out.extend_from_slice(&machine.to_le_bytes());
    out.extend_from_slice(&1u32.to_le_bytes()); // e_version
    out.extend_from_slice(&0u64.to_le_bytes()); // e_entry
    out.extend_from_slice(&64u64.to_le_bytes()); // e_phoff
    out.extend_from_slice(&0u64.to_le_bytes()); // e_shoff
    out.extend_from_slice(&0u32.to_le_bytes()); // e_flags
    out.extend_from_slice(&64u16.to_le_bytes()); // e_ehsize
    out.extend_from_slice(&56u16.to_le_bytes()); // e_phentsize
    out.extend_from_slice(&1u16.to_le_bytes()); // e_phnum
    out.extend_from_slice(&0u16.to_le_bytes()); // e_shentsize
    out.extend_from_slice(&0u16.to_le_bytes()); // e_shnum
    out.extend_from_slice(&0u16.to_le_bytes()); // e_shstrndx

    // One PT_NOTE program header; segment data follows it.
    let data_offset = 64u64 + 56;
    out.extend_from_slice(&PT_NOTE.to_le_bytes());
    out.extend_from_slice(&4u32.to_le_bytes()); // p_flags
    out.extend_from_slice(&data_offset.to_le_bytes()); // p_offset
    out.extend_from_slice(&0u64.to_le_bytes()); // p_vaddr
    out.extend_from_slice(&0u64.to_le_bytes()); // p_paddr
    out.extend_from_slice(&(seg.len() as u64).to_le_bytes()); // p_filesz
    out.extend_from_slice(&0u64.to_le_bytes()); // p_memsz
    out.extend_from_slice(&4u64.to_le_bytes()); // p_align
    out.extend_from_slice(&seg);
    out
}
