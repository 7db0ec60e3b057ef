//! Move processed source files out of the watched directory.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::PipelineError;

/// Move `source` into `archive_dir`, keeping its file name.
///
/// An existing file of the same name in the archive is replaced. A plain
/// rename is tried first; when that fails (e.g. the archive is on another
/// filesystem) the file is copied and the original removed.
pub fn archive_file(source: &Path, archive_dir: &Path) -> Result<PathBuf, PipelineError> {
    let file_name = source
        .file_name()
        .ok_or_else(|| PipelineError::archive(source, "Source path has no file name."))?;

    fs::create_dir_all(archive_dir).map_err(|e| {
        PipelineError::archive(
            source,
            format!("Failed to create archive dir '{}': {e}", archive_dir.display()),
        )
    })?;

    let destination = archive_dir.join(file_name);

    if let Err(rename_err) = fs::rename(source, &destination) {
        log::debug!(
            "rename {} -> {} failed ({rename_err}); falling back to copy",
            source.display(),
            destination.display()
        );
        fs::copy(source, &destination).map_err(|e| {
            PipelineError::archive(
                source,
                format!("Failed to move to '{}': {e}", destination.display()),
            )
        })?;
        fs::remove_file(source).map_err(|e| {
            PipelineError::archive(source, format!("Copied to archive but could not remove original: {e}"))
        })?;
    }

    Ok(destination)
}
