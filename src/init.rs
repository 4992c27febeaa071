//! Init script generation.
//!
//! Renders the `/init` program the kernel executes as PID 1 inside the
//! guest. The script implements the root-mount protocol:
//!
//! ```text
//! 1. Load any packed kernel modules (modules/load_all.sh)
//! 2. Mount the 9p/virtio host share on /newroot (ro or rw per config)
//! 3. Probe whether /newroot can really serve as root:
//!    a. proc must be mountable on top of it (old QEMU virtfs cannot
//!       stack mounts over a 9p tree)
//!    b. it must have a /run directory
//! 4. If either probe fails: move the share to /tmproot, build a tmpfs
//!    root at /newroot, and bind-mount the share's top-level directories
//!    through it (live pass-through, not a copy)
//! 5. Expose the harness files as /run/guestramfs in the new root
//! 6. Read init= from the kernel command line and switch_root to it
//! ```
//!
//! Mount failures before a usable root exist are fatal: log, give the
//! message time to reach the console, exit 1.

use crate::config::Config;
use crate::script::{ShellScript, LOG_HELPER};

/// Render the `/init` script for this configuration.
pub fn generate_init(config: &Config) -> Vec<u8> {
    let access = config.root_access_mode.mount_option();

    let mut s = ShellScript::new();
    s.line("#!/bin/sh");
    s.blank();
    s.block(LOG_HELPER);
    s.blank();

    // Written unconditionally; when no modules were packed the file is
    // absent and the guest harness accepts the sourcing failure.
    s.line("source /modules/load_all.sh");
    s.blank();

    s.line("log 'mounting the shared host root...'");
    s.blank();
    s.line(format!(
        "if ! /bin/mount -n -t 9p -o {access},version=9p2000.L,trans=virtio,access=any /dev/root /newroot/; then"
    ));
    s.line("  log 'failed to mount the shared root, cannot continue'");
    s.line("  sleep 5");
    s.line("  exit 1");
    s.line("fi");
    s.blank();

    // Probe: QEMU 1.5 and older virtfs refuses mounts stacked on top of a
    // 9p tree, and switch_root needs a writable /run later.
    s.line("if ! mount -t proc -o nosuid,noexec,nodev proc /newroot/proc 2>/dev/null; then");
    s.line("  log 'host virtfs cannot stack mounts, using a fallback tmpfs'");
    s.line("  need_fallback_tmpfs=1");
    s.line("else");
    s.line("  umount /newroot/proc");
    s.line("fi");
    s.blank();
    s.line("if [ ! -d /newroot/run ]; then");
    s.line("  log 'shared root has no /run, using a fallback tmpfs'");
    s.line("  need_fallback_tmpfs=1");
    s.line("fi");
    s.blank();

    s.line("if [ -n \"$need_fallback_tmpfs\" ]; then");
    s.line("  mount --move /newroot /tmproot");
    s.line("  mount -t tmpfs root_workaround /newroot/");
    s.line("  cd /tmproot");
    s.line("  mkdir /newroot/proc /newroot/sys /newroot/dev /newroot/run /newroot/tmp");
    s.line("  for i in *; do");
    s.line("    if [ -d \"$i\" ] && [ ! -d \"/newroot/$i\" ]; then");
    s.line("      mkdir \"/newroot/$i\"");
    s.line("      mount --bind \"$i\" \"/newroot/$i\"");
    s.line("    fi");
    s.line("  done");
    s.line("  mknod /newroot/dev/null c 1 3");
    s.line("  mount -o remount,ro -t tmpfs root_workaround /newroot");
    s.line("  cd /");
    s.line("  umount -l /tmproot");
    s.line("fi");
    s.blank();

    s.line("mount -t tmpfs run /newroot/run");
    s.line("cp -a /run_area /newroot/run/guestramfs");
    s.blank();

    s.line("mount -t proc none /proc");
    s.line("for arg in $(cat /proc/cmdline); do");
    s.line("  if [ \"${arg%%=*}\" = \"init\" ]; then");
    s.line("    init=\"${arg#init=}\"");
    s.line("    break");
    s.line("  fi");
    s.line("done");
    s.line("umount /proc");
    s.blank();

    s.line("if [ -z \"$init\" ]; then");
    s.line("  log 'no init= argument on the kernel command line'");
    s.line("  exit 1");
    s.line("fi");
    s.blank();

    s.line("log 'switching to the real root'");
    s.line("exec /bin/switch_root /newroot \"$init\" \"$@\"");

    s.render().into_bytes()
}
