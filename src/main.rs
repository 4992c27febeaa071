//! guestramfs - build the initramfs that boots a VM into the guest-testing
//! harness.

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use guestramfs::builder::mkinitramfs;
use guestramfs::config::{AccessMode, Config};
use guestramfs::locate::find_busybox;

#[derive(Parser)]
#[command(name = "guestramfs")]
#[command(about = "Build the initramfs image that boots a VM into the guest-testing harness")]
#[command(
    after_help = "EXAMPLES:\n  guestramfs -o initramfs.img\n  guestramfs -o initramfs.img --module virtio_net.ko --data probe.sh=./probe.sh --rw"
)]
struct Cli {
    /// Output archive path
    #[arg(short, long)]
    output: PathBuf,

    /// Multi-call binary to install as /bin/busybox (default: search for one)
    #[arg(long)]
    busybox: Option<PathBuf>,

    /// Kernel module file to pack (repeatable, load order preserved)
    #[arg(long = "module", value_name = "FILE")]
    modules: Vec<PathBuf>,

    /// Payload file exposed to the guest as run_area/data/NAME (repeatable)
    #[arg(long = "data", value_name = "NAME=FILE")]
    data: Vec<String>,

    /// Share the host root read-write instead of read-only
    #[arg(long)]
    rw: bool,

    /// Filesystem root searched for busybox when --busybox is not given
    #[arg(long, default_value = "/")]
    root: PathBuf,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let is_native = cli.root == Path::new("/");
    let busybox = match cli.busybox {
        Some(path) => path,
        None => find_busybox(&cli.root, is_native)
            .context("no busybox binary found; pass one with --busybox")?,
    };

    let mut payload_data = BTreeMap::new();
    for entry in &cli.data {
        let (name, path) = entry
            .split_once('=')
            .with_context(|| format!("--data {entry} is not NAME=FILE"))?;
        let contents =
            fs::read(path).with_context(|| format!("failed to read payload file {path}"))?;
        if payload_data.insert(name.to_string(), contents).is_some() {
            bail!("duplicate payload name {name}");
        }
    }

    let config = Config {
        module_files: cli.modules,
        payload_data,
        init_target_path: None,
        executable_path: busybox,
        root_access_mode: if cli.rw {
            AccessMode::ReadWrite
        } else {
            AccessMode::ReadOnly
        },
    };

    println!("Building initramfs from {}", config.executable_path.display());
    let file = File::create(&cli.output)
        .with_context(|| format!("failed to create {}", cli.output.display()))?;
    let mut out = BufWriter::new(file);
    mkinitramfs(&mut out, &config)?;
    out.flush()
        .with_context(|| format!("failed to flush {}", cli.output.display()))?;

    let size = fs::metadata(&cli.output)?.len();
    println!("  Output: {}", cli.output.display());
    println!("  Size: {} KB", size / 1024);
    Ok(())
}
