//! Lazy iteration over the note records of one PT_NOTE segment.
//!
//! A note record is a 12-byte header (name length, descriptor length,
//! type, all u32 in the file's byte order), the name bytes, then the
//! descriptor bytes. Name and descriptor are each padded independently
//! to 4-byte alignment.

use super::{cstr_lossy, read_exact_vec, round_up, Endianness};
use hx_common::{Error, Result};
use std::io::{Read, Seek, SeekFrom};

/// Byte size of the note header.
const NOTE_HEADER_SIZE: u64 = 12;

/// Alignment granularity for name and descriptor padding.
const NOTE_ALIGN: u64 = 4;

/// Note record types found in core dumps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteType {
    Prstatus,
    Fpregset,
    Prpsinfo,
    Taskstruct,
    Platform,
    Auxv,
    Other(u32),
}

impl NoteType {
    pub fn from_raw(raw: u32) -> NoteType {
        match raw {
            1 => NoteType::Prstatus,
            2 => NoteType::Fpregset,
            3 => NoteType::Prpsinfo,
            4 => NoteType::Taskstruct,
            5 => NoteType::Platform,
            6 => NoteType::Auxv,
            other => NoteType::Other(other),
        }
    }
}

/// One note record.
#[derive(Debug, Clone)]
pub struct Note {
    pub note_type: NoteType,
    /// Note name, trimmed at the first NUL.
    pub name: String,
    /// Raw descriptor bytes.
    pub desc: Vec<u8>,
    /// File offset of the note header.
    pub offset: u64,
    /// Header plus padded name plus padded descriptor.
    pub total_size: u64,
}

/// A finite, non-restartable walk over the notes of one segment.
///
/// The iterator advances the underlying stream; it stops at the end of
/// the segment's byte range and yields [`Error::MalformedNote`] when a
/// declared length would read past it.
pub struct NoteIter<'a, R: Read + Seek> {
    stream: &'a mut R,
    endian: Endianness,
    offset: u64,
    // None when offset + len overflows; the declared range cannot exist.
    end: Option<u64>,
    failed: bool,
}

impl<'a, R: Read + Seek> NoteIter<'a, R> {
    /// Walk the segment at `[offset, offset + len)`.
    ///
    /// Both bounds come straight from a program header, so they are
    /// untrusted; a range overflowing the file-offset space yields a
    /// single [`Error::MalformedNote`].
    pub fn new(stream: &'a mut R, endian: Endianness, offset: u64, len: u64) -> Self {
        NoteIter {
            stream,
            endian,
            offset,
            end: offset.checked_add(len),
            failed: false,
        }
    }

    fn read_note(&mut self, end: u64) -> Result<Note> {
        let start = self.offset;
        if end - start < NOTE_HEADER_SIZE {
            return Err(Error::malformed_note(start, "header overruns segment"));
        }
        self.stream.seek(SeekFrom::Start(start))?;
        let header = read_exact_vec(self.stream, NOTE_HEADER_SIZE as usize)?;
        let name_len = u64::from(self.endian.read_u32(&header[0..4]));
        let desc_len = u64::from(self.endian.read_u32(&header[4..8]));
        let note_type = NoteType::from_raw(self.endian.read_u32(&header[8..12]));

        let name_start = start + NOTE_HEADER_SIZE;
        if name_len > end - name_start {
            return Err(Error::malformed_note(start, "name overruns segment"));
        }
        let name = cstr_lossy(&read_exact_vec(self.stream, name_len as usize)?);

        let desc_start = name_start
            .checked_add(round_up(name_len, NOTE_ALIGN))
            .ok_or_else(|| Error::malformed_note(start, "name overruns segment"))?;
        if desc_start > end || desc_len > end - desc_start {
            return Err(Error::malformed_note(start, "descriptor overruns segment"));
        }
        self.stream.seek(SeekFrom::Start(desc_start))?;
        let desc = read_exact_vec(self.stream, desc_len as usize)?;

        let total_size =
            NOTE_HEADER_SIZE + round_up(name_len, NOTE_ALIGN) + round_up(desc_len, NOTE_ALIGN);
        // The descriptor padding may nominally extend past a segment that
        // touches the end of the offset space; saturate so the walk stops.
        self.offset = start.saturating_add(total_size);

        Ok(Note {
            note_type,
            name,
            desc,
            offset: start,
            total_size,
        })
    }
}

impl<R: Read + Seek> Iterator for NoteIter<'_, R> {
    type Item = Result<Note>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let Some(end) = self.end else {
            self.failed = true;
            return Some(Err(Error::malformed_note(
                self.offset,
                "segment length overflows file offset",
            )));
        };
        if self.offset >= end {
            return None;
        }
        let result = self.read_note(end);
        if result.is_err() {
            self.failed = true;
        }
        Some(result)
    }
}
