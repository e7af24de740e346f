//! Exclusive lock on the output tree for the duration of a run.

use std::fs::OpenOptions;
use std::path::Path;

use fd_lock::RwLock;

use sealevel_core::errors::StorageError;

/// Run `f` while holding an exclusive lock on `lock_path`. Fails with
/// `StorageError::Locked` if another process holds it.
pub fn with_exclusive_lock<T, E>(
    lock_path: &Path,
    f: impl FnOnce() -> Result<T, E>,
) -> Result<T, E>
where
    E: From<StorageError>,
{
    if let Some(parent) = lock_path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| StorageError::io(parent, e))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .truncate(false)
        .read(true)
        .write(true)
        .open(lock_path)
        .map_err(|e| StorageError::io(lock_path, e))?;

    let mut lock = RwLock::new(file);
    let _guard = lock.try_write().map_err(|_| StorageError::Locked {
        path: lock_path.to_path_buf(),
    })?;
    tracing::debug!(lock = %lock_path.display(), "acquired output lock");
    f()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lock_runs_closure_and_releases() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join(".sealevel.lock");
        let v: Result<u32, StorageError> = with_exclusive_lock(&path, || Ok(7));
        assert_eq!(v.unwrap(), 7);
        // released: a second acquisition succeeds
        let v: Result<u32, StorageError> = with_exclusive_lock(&path, || Ok(8));
        assert_eq!(v.unwrap(), 8);
    }

    #[test]
    fn nested_acquisition_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".sealevel.lock");
        let outer: Result<(), StorageError> = with_exclusive_lock(&path, || {
            let inner: Result<(), StorageError> = with_exclusive_lock(&path, || Ok(()));
            assert!(matches!(inner, Err(StorageError::Locked { .. })));
            Ok(())
        });
        outer.unwrap();
    }
}
