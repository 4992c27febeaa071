//! Shared-library dependency resolution.
//!
//! Reads the dynamic linking metadata of an ELF executable and maps each
//! directly declared library (DT_NEEDED) to the file that will satisfy it on
//! the guest, probing an ordered list of search directories.
//!
//! Only one level of dependencies is resolved: libraries needed by the
//! libraries themselves are never inspected. The busybox binaries this is
//! used on link against libc and little else, so the direct set is the full
//! set in practice.

use anyhow::{Context, Result};
use goblin::elf::Elf;
use std::fs;
use std::path::{Path, PathBuf};

/// One resolved dependency: where it lives on the host, and where it lands
/// in the archive (host path minus the leading separator, directory
/// structure preserved).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepEntry {
    pub host_path: PathBuf,
    pub archive_path: String,
}

/// Outcome of resolving an executable's declared libraries.
///
/// `resolved` keeps DT_NEEDED declaration order. `missing` holds the names
/// that matched no search directory; policy on those is the caller's call
/// (the assembler warns and continues).
#[derive(Debug, Default)]
pub struct Resolution {
    pub resolved: Vec<DepEntry>,
    pub missing: Vec<String>,
}

/// The standard library directories, in priority order.
pub fn default_search_dirs() -> Vec<PathBuf> {
    ["/lib", "/lib64", "/usr/lib", "/usr/lib64"]
        .iter()
        .map(PathBuf::from)
        .collect()
}

/// Resolve the shared libraries `executable` declares it needs.
///
/// A statically linked executable (no dynamic section) resolves to an empty
/// result. An unreadable or non-ELF input is an error.
pub fn resolve_needed_libraries(executable: &Path, search_dirs: &[PathBuf]) -> Result<Resolution> {
    let bytes = fs::read(executable)
        .with_context(|| format!("failed to read executable {}", executable.display()))?;
    let elf = Elf::parse(&bytes)
        .with_context(|| format!("failed to parse {} as an ELF binary", executable.display()))?;

    let mut resolution = Resolution::default();
    if elf.dynamic.is_none() {
        return Ok(resolution);
    }

    for needed in &elf.libraries {
        match find_library(needed, search_dirs) {
            Some(host_path) => {
                let archive_path = host_path
                    .to_string_lossy()
                    .trim_start_matches('/')
                    .to_string();
                resolution.resolved.push(DepEntry {
                    host_path,
                    archive_path,
                });
            }
            None => resolution.missing.push((*needed).to_string()),
        }
    }

    Ok(resolution)
}

/// Probe the search directories, first hit wins.
fn find_library(name: &str, search_dirs: &[PathBuf]) -> Option<PathBuf> {
    search_dirs
        .iter()
        .map(|dir| dir.join(name))
        .find(|candidate| candidate.is_file())
}
