//! Top-level assembly: one configuration in, one finished archive out.

use anyhow::Result;
use std::io::Write;
use std::path::PathBuf;

use crate::archive::{ArchiveSink, CpioSink};
use crate::config::Config;
use crate::{deps, init, layout, payload};

/// Build the initramfs archive into `out` using the standard library search
/// directories.
pub fn mkinitramfs<W: Write>(out: W, config: &Config) -> Result<()> {
    let mut sink = CpioSink::new(out);
    build_with_sink(&mut sink, config, &deps::default_search_dirs())
}

/// Build against an explicit sink and library search path.
///
/// Steps run in a fixed order because later archive content assumes earlier
/// content exists at boot time. The first failure aborts the build; a
/// partially written sink is not a valid archive and must be discarded.
pub fn build_with_sink(
    sink: &mut dyn ArchiveSink,
    config: &Config,
    search_dirs: &[PathBuf],
) -> Result<()> {
    layout::make_base_layout(sink)?;
    layout::make_dev_nodes(sink)?;

    println!(
        "Installing busybox from {}",
        config.executable_path.display()
    );
    let resolution = deps::resolve_needed_libraries(&config.executable_path, search_dirs)?;
    for name in &resolution.missing {
        println!("  Warning: library {name} not found in any search directory, skipping");
    }
    layout::install_busybox(sink, &config.executable_path, &resolution.resolved)?;
    layout::install_modprobe_stub(sink)?;

    if !config.module_files.is_empty() {
        println!("  Packing {} kernel modules", config.module_files.len());
    }
    payload::install_modules(sink, &config.module_files)?;
    payload::install_payload(sink, &config.payload_data)?;

    sink.write_file("init", &init::generate_init(config), 0o755)?;
    sink.finish()
}
