//! Archive sink abstraction and the cpio implementation.
//!
//! The builder only ever talks to [`ArchiveSink`], a narrow capability
//! surface (directories, symlinks, character devices, regular files, one
//! final trailer). [`CpioSink`] is the production implementation, emitting a
//! newc-format cpio stream the kernel unpacks as an initramfs; tests
//! substitute an in-memory recorder.

use anyhow::{Context, Result};
use cpio::newc::{trailer, Builder, ModeFileType};
use std::io::Write;

/// The append-only entry stream an initramfs build writes into.
///
/// Entries must be emitted in dependency order (a directory before anything
/// inside it) and [`finish`](ArchiveSink::finish) exactly once, last.
pub trait ArchiveSink {
    /// Add a directory entry.
    fn mkdir(&mut self, path: &str, mode: u32) -> Result<()>;

    /// Add a symbolic link at `path` pointing to `target`.
    fn symlink(&mut self, target: &str, path: &str) -> Result<()>;

    /// Add a character device node.
    fn mkchardev(&mut self, path: &str, major: u32, minor: u32, mode: u32) -> Result<()>;

    /// Add a regular file with the given content.
    fn write_file(&mut self, path: &str, body: &[u8], mode: u32) -> Result<()>;

    /// Emit the end-of-archive trailer.
    fn finish(&mut self) -> Result<()>;
}

/// [`ArchiveSink`] that writes a newc-format cpio stream.
pub struct CpioSink<W: Write> {
    out: W,
}

impl<W: Write> CpioSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// Consume the sink, returning the underlying writer.
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> ArchiveSink for CpioSink<W> {
    fn mkdir(&mut self, path: &str, mode: u32) -> Result<()> {
        Builder::new(path)
            .mode(mode)
            .set_mode_file_type(ModeFileType::Directory)
            .write(&mut self.out, 0)
            .finish()
            .with_context(|| format!("failed to write directory entry {path}"))?;
        Ok(())
    }

    fn symlink(&mut self, target: &str, path: &str) -> Result<()> {
        let body = target.as_bytes();
        let mut writer = Builder::new(path)
            .mode(0o777)
            .set_mode_file_type(ModeFileType::Symlink)
            .write(&mut self.out, body.len() as u32);
        writer.write_all(body)?;
        writer
            .finish()
            .with_context(|| format!("failed to write symlink entry {path}"))?;
        Ok(())
    }

    fn mkchardev(&mut self, path: &str, major: u32, minor: u32, mode: u32) -> Result<()> {
        Builder::new(path)
            .mode(mode)
            .set_mode_file_type(ModeFileType::Char)
            .rdev_major(major)
            .rdev_minor(minor)
            .write(&mut self.out, 0)
            .finish()
            .with_context(|| format!("failed to write device entry {path}"))?;
        Ok(())
    }

    fn write_file(&mut self, path: &str, body: &[u8], mode: u32) -> Result<()> {
        let size = u32::try_from(body.len())
            .with_context(|| format!("{path} is too large for a newc archive"))?;
        let mut writer = Builder::new(path)
            .mode(mode)
            .set_mode_file_type(ModeFileType::Regular)
            .write(&mut self.out, size);
        writer.write_all(body)?;
        writer
            .finish()
            .with_context(|| format!("failed to write file entry {path}"))?;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        trailer(&mut self.out).context("failed to write archive trailer")?;
        Ok(())
    }
}
