//! Shared helpers for hx-core integration tests.
//!
//! Builds synthetic x86-64 core dumps, wraps them in the archive
//! formats the plugins accept, and fakes the debugger with a shell
//! script so inspections run without gdb installed.

#![allow(dead_code)]

use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

const EM_X86_64: u16 = 62;
const PT_NOTE: u32 = 4;

/// Size of the x86-64 prpsinfo structure.
const PRPSINFO_SIZE: usize = 136;
const PID_OFFSET: usize = 24;
const FNAME_OFFSET: usize = 40;
const FNAME_LEN: usize = 16;

/// Canned backtrace the fake debugger prints.
pub const FAKE_BACKTRACE: &[&str] = &["#0  0x0000dead in explode ()", "#1  0x0000beef in main ()"];

/// Build a little-endian ELF64 core dump whose prpsinfo names `exe`.
pub fn build_core(exe: &str, pid: u32) -> Vec<u8> {
    let mut desc = vec![0u8; PRPSINFO_SIZE];
    desc[PID_OFFSET..PID_OFFSET + 4].copy_from_slice(&pid.to_le_bytes());
    desc[FNAME_OFFSET..FNAME_OFFSET + exe.len()].copy_from_slice(exe.as_bytes());
    let args = format!("{exe} --fg");
    desc[FNAME_OFFSET + FNAME_LEN..FNAME_OFFSET + FNAME_LEN + args.len()]
        .copy_from_slice(args.as_bytes());

    let name = b"CORE\0";
    let mut seg = Vec::new();
    seg.extend_from_slice(&(name.len() as u32).to_le_bytes());
    seg.extend_from_slice(&(desc.len() as u32).to_le_bytes());
    seg.extend_from_slice(&3u32.to_le_bytes()); // NT_PRPSINFO
    seg.extend_from_slice(name);
    while seg.len() % 4 != 0 {
        seg.push(0);
    }
    seg.extend_from_slice(&desc);

    let mut out = Vec::new();
    out.extend_from_slice(b"\x7fELF");
    out.push(2); // 64-bit
    out.push(1); // little-endian
    out.push(1); // version
    out.extend_from_slice(&[0u8; 9]);
    out.extend_from_slice(&4u16.to_le_bytes()); // ET_CORE
    out.extend_from_slice(&EM_X86_64.to_le_bytes());
    out.extend_from_slice(&1u32.to_le_bytes());
    out.extend_from_slice(&0u64.to_le_bytes()); // e_entry
    out.extend_from_slice(&64u64.to_le_bytes()); // e_phoff
    out.extend_from_slice(&0u64.to_le_bytes()); // e_shoff
    out.extend_from_slice(&0u32.to_le_bytes());
    out.extend_from_slice(&64u16.to_le_bytes()); // e_ehsize
    out.extend_from_slice(&56u16.to_le_bytes()); // e_phentsize
    out.extend_from_slice(&1u16.to_le_bytes()); // e_phnum
    out.extend_from_slice(&[0u8; 6]); // section header fields

    out.extend_from_slice(&PT_NOTE.to_le_bytes());
    out.extend_from_slice(&4u32.to_le_bytes());
    out.extend_from_slice(&(64u64 + 56).to_le_bytes()); // p_offset
    out.extend_from_slice(&0u64.to_le_bytes());
    out.extend_from_slice(&0u64.to_le_bytes());
    out.extend_from_slice(&(seg.len() as u64).to_le_bytes()); // p_filesz
    out.extend_from_slice(&0u64.to_le_bytes());
    out.extend_from_slice(&4u64.to_le_bytes());
    out.extend_from_slice(&seg);
    out
}

/// Write `contents` gzip-compressed to `path`.
pub fn write_gzip(path: &Path, contents: &[u8]) {
    let file = File::create(path).unwrap();
    let mut encoder = GzEncoder::new(file, Compression::default());
    encoder.write_all(contents).unwrap();
    encoder.finish().unwrap();
}

/// Write a tarball at `path` holding the given (name, contents) entries.
pub fn write_tarball(path: &Path, entries: &[(&str, &[u8])]) {
    let file = File::create(path).unwrap();
    let mut builder = tar::Builder::new(file);
    for (name, contents) in entries {
        let mut header = tar::Header::new_gnu();
        header.set_size(contents.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder.append_data(&mut header, name, *contents).unwrap();
    }
    builder.finish().unwrap();
}

/// Install a fake gdb that prints [`FAKE_BACKTRACE`] and exits 0.
pub fn install_fake_gdb(dir: &Path) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;
    let path = dir.join("fake-gdb");
    let mut script = String::from("#!/bin/sh\n");
    for line in FAKE_BACKTRACE {
        script.push_str(&format!("echo '{line}'\n"));
    }
    std::fs::write(&path, script).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

/// Install an empty executable named `exe` so the analyzer finds it.
pub fn install_reference(dir: &Path, exe: &str) -> PathBuf {
    let path = dir.join(exe);
    std::fs::write(&path, b"").unwrap();
    path
}
