//! Locating host binaries to pack.

use std::path::{Path, PathBuf};

/// Busybox names tried in order; static builds are preferred because they
/// need no library resolution at all.
pub const BUSYBOX_CANDIDATES: &[&str] = &["busybox-static", "busybox.static", "busybox"];

/// Conventional binary directories probed under a root.
const ROOT_BIN_DIRS: &[&str] = &["bin", "sbin", "usr/bin", "usr/sbin"];

/// Find the first of `names` that exists as an executable.
///
/// With `use_path` the process `PATH` decides; otherwise candidates are
/// probed under `root`'s conventional binary directories. Returns `None`
/// when nothing matches.
pub fn find_binary(names: &[&str], root: &Path, use_path: bool) -> Option<PathBuf> {
    names.iter().find_map(|name| {
        if use_path {
            which::which(name).ok()
        } else {
            ROOT_BIN_DIRS
                .iter()
                .map(|dir| root.join(dir).join(name))
                .find(|candidate| candidate.is_file())
        }
    })
}

/// Find a busybox binary for the guest image.
///
/// `is_native` means the guest runs the host's own architecture, so the
/// host `PATH` is a valid source; otherwise only `root` is searched.
pub fn find_busybox(root: &Path, is_native: bool) -> Option<PathBuf> {
    find_binary(BUSYBOX_CANDIDATES, root, is_native)
}
