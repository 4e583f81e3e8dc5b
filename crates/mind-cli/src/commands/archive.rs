//! Pack and unpack commands.
//!
//! Move a project directory in and out of a mind-file without opening its
//! history.

use std::path::Path;

use anyhow::{Context, Result};
use mind_ops::{archive, Config, ProjectDirectory};

/// Pack `dir` into the mind-file at `file`, replacing any existing file.
pub fn pack(config: &Config, dir: &Path, file: &Path) -> Result<()> {
    let directory = ProjectDirectory::open(dir)
        .with_context(|| format!("Failed to open project directory {}", dir.display()))?;
    let archive = directory.export(file, config.compression_level)?;

    println!(
        "📦 Packed {} into {} ({} members, {})",
        dir.display(),
        archive,
        archive.members()?.len(),
        humansize::format_size(archive.size()?, humansize::DECIMAL)
    );
    Ok(())
}

/// Unpack the mind-file at `file` into `dir`.
pub fn unpack(file: &Path, dir: &Path) -> Result<()> {
    let files = archive::import(file, dir)
        .with_context(|| format!("Failed to unpack {}", file.display()))?;

    println!("📂 Unpacked {} files into {}", files, dir.display());
    Ok(())
}
