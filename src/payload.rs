//! Kernel modules and harness payload.

use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::archive::ArchiveSink;
use crate::layout::copy_file;
use crate::script::{quote, ShellScript, LOG_HELPER};

/// Pack kernel modules under `modules/` and generate the loader script.
///
/// Modules keep their input order, both in the archive and in
/// `modules/load_all.sh`; insmod has no dependency resolution, so the caller
/// is responsible for listing dependencies first. An empty module list
/// produces nothing, not even the directory.
pub fn install_modules(sink: &mut dyn ArchiveSink, module_files: &[PathBuf]) -> Result<()> {
    if module_files.is_empty() {
        return Ok(());
    }

    sink.mkdir("modules", 0o755)?;

    let mut installed = Vec::new();
    for module in module_files {
        let name = module
            .file_name()
            .and_then(|n| n.to_str())
            .with_context(|| format!("module path {} has no usable file name", module.display()))?;
        let archive_path = format!("modules/{name}");
        copy_file(sink, module, &archive_path, 0o644)?;
        installed.push((name.to_string(), archive_path));
    }

    let mut script = ShellScript::new();
    script.block(LOG_HELPER);
    for (name, archive_path) in &installed {
        script.line(format!(
            "log 'loading {name}...'; insmod {}",
            quote(archive_path)
        ));
    }
    sink.write_file("modules/load_all.sh", script.render().as_bytes(), 0o644)
}

/// Write the harness payload files under `run_area/data/`.
///
/// Everything is installed executable; the harness decides what to run and
/// what to merely read.
pub fn install_payload(
    sink: &mut dyn ArchiveSink,
    payload_data: &BTreeMap<String, Vec<u8>>,
) -> Result<()> {
    for (name, contents) in payload_data {
        sink.write_file(&format!("run_area/data/{name}"), contents, 0o755)?;
    }
    Ok(())
}
