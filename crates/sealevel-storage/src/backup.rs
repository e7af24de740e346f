//! Backups of a master product before it is overwritten.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};

use sealevel_core::errors::StorageError;

use crate::freshness::mtime_parts;

const STAMP_FORMAT: &str = "%Y-%m-%dT%H-%M-%S%.6f";

/// Local-time stamp of `path`'s modification time, as used in backup names.
pub fn mtime_stamp(path: &Path) -> Option<String> {
    let (secs, nanos) = mtime_parts(path)?;
    let utc = DateTime::from_timestamp(secs, nanos)?;
    Some(utc.with_timezone(&Local).format(STAMP_FORMAT).to_string())
}

/// Copy `master` into `backup_dir` as `<prefix>_<master mtime>.<extension>`.
/// Returns the backup path.
pub fn backup_master(
    master: &Path,
    backup_dir: &Path,
    prefix: &str,
    extension: &str,
) -> Result<PathBuf, StorageError> {
    let fail = |message: String| StorageError::BackupFailed {
        path: master.to_path_buf(),
        message,
    };

    let stamp =
        mtime_stamp(master).ok_or_else(|| fail("modification time unavailable".to_string()))?;

    std::fs::create_dir_all(backup_dir).map_err(|e| fail(e.to_string()))?;
    let backup = backup_dir.join(format!("{prefix}_{stamp}.{extension}"));
    std::fs::copy(master, &backup).map_err(|e| fail(e.to_string()))?;

    tracing::info!(
        master = %master.display(),
        backup = %backup.display(),
        "backed up master product"
    );
    Ok(backup)
}
