//! Decoding of the process-info (prpsinfo) note descriptor.
//!
//! The kernel's `struct elf_prpsinfo` starts with four one-byte fields
//! (state, state char, zombie flag, nice value) on every architecture.
//! What follows varies:
//!
//! - x86-64: u64 `pr_flag`, 4 alignment bytes, u32 uid/gid
//! - x86: u32 `pr_flag`, u16 uid/gid
//! - generic fallback: u32 `pr_flag`, u32 uid/gid
//!
//! then u32 pid/ppid/pgrp/sid, a 16-byte executable-name field and an
//! 80-byte argument field. The two string fields are NUL-terminated but
//! not necessarily NUL-padded; bytes after the first NUL are discarded.

use super::{cstr_lossy, Architecture, Endianness};
use hx_common::{Error, Result};
use tracing::debug;

/// Fixed width of the `pr_fname` field.
pub const PR_FNAME_LEN: usize = 16;

/// Fixed width of the `pr_psargs` field.
pub const PR_PSARGS_LEN: usize = 80;

/// Identity of the crashed process, as recorded in the core dump.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessInfo {
    /// Executable name (`pr_fname`, at most 16 bytes).
    pub name: String,
    /// Initial argument list (`pr_psargs`, at most 80 bytes).
    pub args: String,
}

/// Field widths of one prpsinfo revision.
struct Layout {
    flag_width: usize,
    flag_gap: usize,
    id_width: usize,
}

impl Layout {
    fn for_arch(arch: Architecture) -> Layout {
        match arch {
            Architecture::X86_64 => Layout {
                flag_width: 8,
                flag_gap: 4,
                id_width: 4,
            },
            Architecture::X86 => Layout {
                flag_width: 4,
                flag_gap: 0,
                id_width: 2,
            },
            Architecture::Generic => Layout {
                flag_width: 4,
                flag_gap: 0,
                id_width: 4,
            },
        }
    }

    /// Offset of the pid field.
    fn pid_offset(&self) -> usize {
        4 + self.flag_width + self.flag_gap + 2 * self.id_width
    }

    /// Offset of the `pr_fname` field.
    fn fname_offset(&self) -> usize {
        self.pid_offset() + 4 * 4
    }

    /// Total structure size.
    fn size(&self) -> usize {
        self.fname_offset() + PR_FNAME_LEN + PR_PSARGS_LEN
    }
}

/// Decode a prpsinfo descriptor for the given architecture.
///
/// Fails with [`Error::TruncatedStructure`] when the descriptor is
/// shorter than the architecture's structure; nothing is extracted in
/// that case.
pub fn decode(desc: &[u8], arch: Architecture, endian: Endianness) -> Result<ProcessInfo> {
    let layout = Layout::for_arch(arch);
    let expected = layout.size();
    if desc.len() < expected {
        return Err(Error::TruncatedStructure {
            structure: "prpsinfo",
            expected,
            actual: desc.len(),
        });
    }

    let pid_at = layout.pid_offset();
    let pid = endian.read_u32(&desc[pid_at..pid_at + 4]);

    let fname_at = layout.fname_offset();
    let name = cstr_lossy(&desc[fname_at..fname_at + PR_FNAME_LEN]);
    let args = cstr_lossy(&desc[fname_at + PR_FNAME_LEN..fname_at + PR_FNAME_LEN + PR_PSARGS_LEN]);

    debug!(%arch, pid, name = %name, "decoded process info");
    Ok(ProcessInfo { name, args })
}

/// Build a descriptor with the given name/args at the right offsets.
/// Test helper shared with the parser and analyzer tests.
#[cfg(test)]
pub(crate) fn build_desc(arch: Architecture, pid: u32, name: &[u8], args: &[u8]) -> Vec<u8> {
    let layout = Layout::for_arch(arch);
    let mut desc = vec![0u8; layout.size()];
    desc[layout.pid_offset()..layout.pid_offset() + 4].copy_from_slice(&pid.to_le_bytes());
    let fname_at = layout.fname_offset();
    desc[fname_at..fname_at + name.len()].copy_from_slice(name);
    desc[fname_at + PR_FNAME_LEN..fname_at + PR_FNAME_LEN + args.len()].copy_from_slice(args);
    desc
}
