//! Shared test utilities for guestramfs tests.
//!
//! Provides an in-memory recording sink, minimal hand-built ELF images for
//! resolver tests, and a reader that walks a finished newc archive back into
//! a list of entries.

#![allow(dead_code)]

use anyhow::Result;
use std::io::{Cursor, Read};

use guestramfs::archive::ArchiveSink;

// =============================================================================
// Recording sink
// =============================================================================

/// One operation the builder performed against the sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkOp {
    Mkdir { path: String, mode: u32 },
    Symlink { target: String, path: String },
    Chardev { path: String, major: u32, minor: u32, mode: u32 },
    File { path: String, body: Vec<u8>, mode: u32 },
    Finish,
}

/// An [`ArchiveSink`] that records operations instead of serializing them.
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub ops: Vec<SinkOp>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Body of the file entry at `path`, if one was written.
    pub fn file(&self, path: &str) -> Option<&[u8]> {
        self.ops.iter().find_map(|op| match op {
            SinkOp::File { path: p, body, .. } if p == path => Some(body.as_slice()),
            _ => None,
        })
    }

    /// Paths of all entries, in emission order.
    pub fn paths(&self) -> Vec<&str> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                SinkOp::Mkdir { path, .. }
                | SinkOp::Symlink { path, .. }
                | SinkOp::Chardev { path, .. }
                | SinkOp::File { path, .. } => Some(path.as_str()),
                SinkOp::Finish => None,
            })
            .collect()
    }
}

impl ArchiveSink for RecordingSink {
    fn mkdir(&mut self, path: &str, mode: u32) -> Result<()> {
        self.ops.push(SinkOp::Mkdir {
            path: path.to_string(),
            mode,
        });
        Ok(())
    }

    fn symlink(&mut self, target: &str, path: &str) -> Result<()> {
        self.ops.push(SinkOp::Symlink {
            target: target.to_string(),
            path: path.to_string(),
        });
        Ok(())
    }

    fn mkchardev(&mut self, path: &str, major: u32, minor: u32, mode: u32) -> Result<()> {
        self.ops.push(SinkOp::Chardev {
            path: path.to_string(),
            major,
            minor,
            mode,
        });
        Ok(())
    }

    fn write_file(&mut self, path: &str, body: &[u8], mode: u32) -> Result<()> {
        self.ops.push(SinkOp::File {
            path: path.to_string(),
            body: body.to_vec(),
            mode,
        });
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.ops.push(SinkOp::Finish);
        Ok(())
    }
}

// =============================================================================
// Minimal ELF images
// =============================================================================

fn push_u16(out: &mut Vec<u8>, v: u16) {
    out.extend_from_slice(&v.to_le_bytes());
}

fn push_u32(out: &mut Vec<u8>, v: u32) {
    out.extend_from_slice(&v.to_le_bytes());
}

fn push_u64(out: &mut Vec<u8>, v: u64) {
    out.extend_from_slice(&v.to_le_bytes());
}

/// ELF64 header: little-endian x86_64 executable, program headers at byte
/// 64, no section headers.
fn push_ehdr(out: &mut Vec<u8>, phnum: u16) {
    out.extend_from_slice(&[0x7f, b'E', b'L', b'F', 2, 1, 1, 0]);
    out.extend_from_slice(&[0u8; 8]);
    push_u16(out, 2); // e_type: ET_EXEC
    push_u16(out, 62); // e_machine: EM_X86_64
    push_u32(out, 1); // e_version
    push_u64(out, 0x1000); // e_entry
    push_u64(out, 64); // e_phoff
    push_u64(out, 0); // e_shoff
    push_u32(out, 0); // e_flags
    push_u16(out, 64); // e_ehsize
    push_u16(out, 56); // e_phentsize
    push_u16(out, phnum); // e_phnum
    push_u16(out, 0); // e_shentsize
    push_u16(out, 0); // e_shnum
    push_u16(out, 0); // e_shstrndx
}

/// Program header with file offset == virtual address, so address-to-offset
/// translation is the identity.
fn push_phdr(out: &mut Vec<u8>, p_type: u32, flags: u32, offset: u64, size: u64) {
    push_u32(out, p_type);
    push_u32(out, flags);
    push_u64(out, offset); // p_offset
    push_u64(out, offset); // p_vaddr
    push_u64(out, offset); // p_paddr
    push_u64(out, size); // p_filesz
    push_u64(out, size); // p_memsz
    push_u64(out, 8); // p_align
}

/// A statically linked executable: one PT_LOAD, no dynamic section.
pub fn build_static_elf() -> Vec<u8> {
    let code = [0xc3u8; 16];
    let total = (64 + 56 + code.len()) as u64;

    let mut out = Vec::new();
    push_ehdr(&mut out, 1);
    push_phdr(&mut out, 1, 5, 0, total); // PT_LOAD, R+X
    out.extend_from_slice(&code);
    out
}

/// A dynamically linked executable declaring the given libraries as
/// DT_NEEDED, in order.
pub fn build_dynamic_elf(needed: &[&str]) -> Vec<u8> {
    let dyn_off = 64 + 2 * 56;
    let dyn_len = (needed.len() + 3) * 16;
    let strtab_off = dyn_off + dyn_len;

    let mut strtab = vec![0u8];
    let mut name_offsets = Vec::new();
    for name in needed {
        name_offsets.push(strtab.len() as u64);
        strtab.extend_from_slice(name.as_bytes());
        strtab.push(0);
    }
    let total = (strtab_off + strtab.len()) as u64;

    let mut out = Vec::new();
    push_ehdr(&mut out, 2);
    push_phdr(&mut out, 1, 5, 0, total); // PT_LOAD covering the whole file
    push_phdr(&mut out, 2, 6, dyn_off as u64, dyn_len as u64); // PT_DYNAMIC

    for off in &name_offsets {
        push_u64(&mut out, 1); // DT_NEEDED
        push_u64(&mut out, *off);
    }
    push_u64(&mut out, 5); // DT_STRTAB
    push_u64(&mut out, strtab_off as u64);
    push_u64(&mut out, 10); // DT_STRSZ
    push_u64(&mut out, strtab.len() as u64);
    push_u64(&mut out, 0); // DT_NULL
    push_u64(&mut out, 0);

    out.extend_from_slice(&strtab);
    out
}

// =============================================================================
// Archive read-back
// =============================================================================

/// A decoded archive entry.
#[derive(Debug, Clone)]
pub struct ArchiveEntry {
    pub name: String,
    pub mode: u32,
    pub rdev: (u32, u32),
    pub content: Vec<u8>,
}

impl ArchiveEntry {
    pub fn file_type(&self) -> u32 {
        self.mode & 0o170000
    }

    pub fn permissions(&self) -> u32 {
        self.mode & 0o7777
    }
}

/// Decode a finished newc archive into its entries (trailer excluded).
pub fn read_archive(bytes: Vec<u8>) -> Vec<ArchiveEntry> {
    let mut cursor = Cursor::new(bytes);
    let mut entries = Vec::new();
    loop {
        let mut reader = cpio::NewcReader::new(cursor).expect("failed to read archive entry");
        if reader.entry().is_trailer() {
            break;
        }
        let name = reader.entry().name().to_string();
        let mode = reader.entry().mode();
        let rdev = (reader.entry().rdev_major(), reader.entry().rdev_minor());
        let mut content = vec![0u8; reader.entry().file_size() as usize];
        reader
            .read_exact(&mut content)
            .expect("failed to read entry content");
        entries.push(ArchiveEntry {
            name,
            mode,
            rdev,
            content,
        });
        cursor = reader.finish().expect("failed to finish archive entry");
    }
    entries
}

/// Find an entry by name, panicking with a useful message if absent.
pub fn entry<'a>(entries: &'a [ArchiveEntry], name: &str) -> &'a ArchiveEntry {
    entries
        .iter()
        .find(|e| e.name == name)
        .unwrap_or_else(|| panic!("archive has no entry named {name}"))
}
