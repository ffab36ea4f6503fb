//! Writing rendered files to disk.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::debug;

use plate_templates::RenderedFile;

use crate::commands::{is_non_empty_dir, ArgumentError};

/// Write every file under `output_dir`. A non-empty directory is refused
/// unless `force` is set.
pub fn write_files(output_dir: &Path, files: &[RenderedFile], force: bool) -> Result<Vec<PathBuf>> {
    if !force && is_non_empty_dir(output_dir)? {
        return Err(ArgumentError(format!(
            "output directory {} is not empty (use --force to overwrite)",
            output_dir.display()
        ))
        .into());
    }

    fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create {}", output_dir.display()))?;

    let mut written = Vec::with_capacity(files.len());
    for file in files {
        let target = output_dir.join(&file.path);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        fs::write(&target, &file.contents)
            .with_context(|| format!("Failed to write {}", target.display()))?;
        debug!("Wrote {}", target.display());
        written.push(target);
    }
    Ok(written)
}
