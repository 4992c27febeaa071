//! Base archive layout: skeleton, device nodes, busybox, stub tooling.
//!
//! Later build steps assume everything here exists, so order matters: the
//! directory skeleton first, then device nodes, then the binaries that land
//! inside the skeleton.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use crate::archive::ArchiveSink;
use crate::deps::DepEntry;
use crate::script::ShellScript;

/// Top-level skeleton. `newroot` and `tmproot` are the mount points the init
/// script pivots through; `run_area` is handed to the guest at runtime.
const BASE_DIRS: &[&str] = &[
    "lib",
    "bin",
    "var",
    "etc",
    "newroot",
    "dev",
    "proc",
    "tmproot",
    "run_area",
    "run_area/data",
    "run_area/guesttools",
];

/// Tools the init script needs, each a symlink to the multi-call binary.
const BUSYBOX_TOOLS: &[&str] = &[
    "sh",
    "mount",
    "umount",
    "switch_root",
    "sleep",
    "mkdir",
    "mknod",
    "insmod",
    "cp",
    "cat",
];

/// Create the directory skeleton and compatibility symlinks.
pub fn make_base_layout(sink: &mut dyn ArchiveSink) -> Result<()> {
    for dir in BASE_DIRS {
        sink.mkdir(dir, 0o755)?;
    }

    sink.symlink("bin", "sbin")?;
    sink.symlink("lib", "lib64")?;
    Ok(())
}

/// Create the character devices the init script writes to before the guest
/// has a devtmpfs.
pub fn make_dev_nodes(sink: &mut dyn ArchiveSink) -> Result<()> {
    sink.mkchardev("dev/null", 1, 3, 0o666)?;
    sink.mkchardev("dev/kmsg", 1, 11, 0o666)?;
    sink.mkchardev("dev/console", 5, 1, 0o660)?;
    Ok(())
}

/// Install the multi-call binary, its resolved libraries, and the tool
/// symlinks.
///
/// `resolved` entries come from [`crate::deps::resolve_needed_libraries`],
/// which only returns files that existed at resolution time.
pub fn install_busybox(
    sink: &mut dyn ArchiveSink,
    busybox: &Path,
    resolved: &[DepEntry],
) -> Result<()> {
    copy_file(sink, busybox, "bin/busybox", 0o755)?;

    for dep in resolved {
        copy_file(sink, &dep.host_path, &dep.archive_path, 0o755)?;
    }

    for tool in BUSYBOX_TOOLS {
        sink.symlink("busybox", &format!("bin/{tool}"))?;
    }

    // Populated by the guest harness at runtime.
    sink.mkdir("bin/real_progs", 0o755)?;
    Ok(())
}

/// Install a modprobe stub that refuses loudly.
///
/// The kernel invokes modprobe for unknown module aliases; a silent failure
/// there is miserable to debug, so the stub names the module on the console
/// and exits nonzero.
pub fn install_modprobe_stub(sink: &mut dyn ArchiveSink) -> Result<()> {
    let mut script = ShellScript::new();
    script
        .line("#!/bin/sh")
        .line("echo \"guestramfs: initramfs does not have module $3\" >/dev/console")
        .line("exit 1");
    sink.write_file("bin/modprobe", script.render().as_bytes(), 0o755)
}

/// Copy a host file into the archive verbatim.
pub(crate) fn copy_file(
    sink: &mut dyn ArchiveSink,
    src: &Path,
    dst: &str,
    mode: u32,
) -> Result<()> {
    let body = fs::read(src).with_context(|| format!("failed to read {}", src.display()))?;
    sink.write_file(dst, &body, mode)
}
