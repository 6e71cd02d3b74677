//! Directory size measurement.
//!
//! Walks a backup directory and sums the byte length of every entry that is
//! not a directory. Symlinks are never followed, so a symlink contributes the
//! length of the link itself and link cycles cannot stall the walk.

use crate::error::Result;
use std::path::Path;
use tracing::trace;
use walkdir::WalkDir;

/// Measure the total size in bytes of all non-directory entries under `path`.
///
/// Fails if `path` does not exist or any entry beneath it cannot be read;
/// nothing accumulated before the failure is returned.
///
/// # Examples
///
/// ```no_run
/// use ott_mongodb_backup_exporter::probe::measure;
///
/// let bytes = measure("/data/backups/2024-03-01/alpha").unwrap_or(0.0);
/// println!("{} bytes", bytes);
/// ```
pub fn measure(path: impl AsRef<Path>) -> Result<f64> {
    let path = path.as_ref();
    let mut total: u64 = 0;

    for entry in WalkDir::new(path)
        .follow_links(false)
        .follow_root_links(false)
    {
        let entry = entry?;
        if entry.file_type().is_dir() {
            continue;
        }
        total += entry.metadata()?.len();
    }

    trace!(path = %path.display(), bytes = total, "Measured directory");
    Ok(total as f64)
}
