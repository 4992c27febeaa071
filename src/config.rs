//! Build configuration for guestramfs.
//!
//! A `Config` describes everything that goes into one initramfs image. It is
//! built once (by the CLI or by a test) and stays immutable for the duration
//! of the build.

use std::collections::BTreeMap;
use std::path::PathBuf;

/// How the guest mounts the 9p-shared host root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AccessMode {
    /// Host root is shared read-only (the default).
    #[default]
    ReadOnly,
    /// Host root is shared read-write.
    ReadWrite,
}

impl AccessMode {
    /// The mount option this mode turns into in the generated init script.
    pub fn mount_option(self) -> &'static str {
        match self {
            AccessMode::ReadOnly => "ro",
            AccessMode::ReadWrite => "rw",
        }
    }
}

/// Everything that goes into one initramfs build.
#[derive(Debug, Clone)]
pub struct Config {
    /// Kernel module files to pack under `modules/`, in load order.
    pub module_files: Vec<PathBuf>,
    /// Harness payload: archive name under `run_area/data/` -> file content.
    pub payload_data: BTreeMap<String, Vec<u8>>,
    /// Reserved: alternate init program for the guest. Accepted but not yet
    /// consumed by the init script generator.
    pub init_target_path: Option<PathBuf>,
    /// The multi-call binary installed as `bin/busybox`. Must be readable at
    /// build time; a missing file aborts the build.
    pub executable_path: PathBuf,
    /// Mount mode for the shared host root.
    pub root_access_mode: AccessMode,
}

impl Config {
    /// A configuration with the given busybox binary and everything else at
    /// its defaults: no modules, no payload, read-only root.
    pub fn new(executable_path: impl Into<PathBuf>) -> Self {
        Self {
            module_files: Vec::new(),
            payload_data: BTreeMap::new(),
            init_target_path: None,
            executable_path: executable_path.into(),
            root_access_mode: AccessMode::default(),
        }
    }
}
