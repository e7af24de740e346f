//! Timestamp freshness: decides whether an artifact must be recomputed.
//!
//! Purely mtime based, no content hashing. A timestamp-preserving copy of
//! an input, or clock skew between writers, can hide a real change; a
//! truncated artifact left by a crash is still newer than its inputs.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Why an artifact is, or is not, stale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Staleness {
    /// The artifact does not exist.
    Missing,
    /// This input was modified strictly after the artifact.
    InputNewer(PathBuf),
    /// This input's modification time could not be read.
    InputUnreadable(PathBuf),
    /// Every input is at least as old as the artifact.
    Fresh,
}

impl Staleness {
    pub fn is_stale(&self) -> bool {
        !matches!(self, Self::Fresh)
    }
}

fn mtime(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path).and_then(|m| m.modified()).ok()
}

/// Classify `output` against `inputs`. Stops at the first stale input.
pub fn staleness<I, P>(output: &Path, inputs: I) -> Staleness
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    let Some(output_mtime) = mtime(output) else {
        return Staleness::Missing;
    };
    for input in inputs {
        let input = input.as_ref();
        match mtime(input) {
            Some(t) if t > output_mtime => return Staleness::InputNewer(input.to_path_buf()),
            Some(_) => {}
            None => return Staleness::InputUnreadable(input.to_path_buf()),
        }
    }
    Staleness::Fresh
}

/// True iff `output` is missing or some input is strictly newer than it.
pub fn needs_recompute<I, P>(output: &Path, inputs: I) -> bool
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    staleness(output, inputs).is_stale()
}

/// Modification time as `(seconds, nanoseconds)` since the Unix epoch.
/// `None` if the file is unreadable or dated before the epoch.
pub fn mtime_parts(path: &Path) -> Option<(i64, u32)> {
    let d = mtime(path)?.duration_since(SystemTime::UNIX_EPOCH).ok()?;
    Some((i64::try_from(d.as_secs()).ok()?, d.subsec_nanos()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::time::Duration;

    fn touch(path: &Path, at: SystemTime) {
        let file = File::options()
            .create(true)
            .truncate(false)
            .write(true)
            .open(path)
            .unwrap();
        file.set_modified(at).unwrap();
    }

    #[test]
    fn missing_output_is_stale() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        assert_eq!(staleness(&out, Vec::<PathBuf>::new()), Staleness::Missing);
    }

    #[test]
    fn equal_mtime_is_fresh() {
        let dir = tempfile::tempdir().unwrap();
        let t = SystemTime::UNIX_EPOCH + Duration::from_secs(1_000_000);
        let (out, input) = (dir.path().join("out"), dir.path().join("in"));
        touch(&out, t);
        touch(&input, t);
        assert!(!needs_recompute(&out, [&input]));
    }

    #[test]
    fn newer_input_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let t = SystemTime::UNIX_EPOCH + Duration::from_secs(1_000_000);
        let (out, old, new) = (
            dir.path().join("out"),
            dir.path().join("old"),
            dir.path().join("new"),
        );
        touch(&out, t);
        touch(&old, t - Duration::from_secs(10));
        touch(&new, t + Duration::from_secs(1));
        assert_eq!(staleness(&out, [&old, &new]), Staleness::InputNewer(new.clone()));
    }

    #[test]
    fn mtime_parts_splits_seconds_and_nanos() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("f");
        touch(&path, SystemTime::UNIX_EPOCH + Duration::new(1_234, 500_000));
        assert_eq!(mtime_parts(&path), Some((1_234, 500_000)));
        assert_eq!(mtime_parts(&dir.path().join("absent")), None);
    }

    #[test]
    fn vanished_input_is_stale() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        touch(&out, SystemTime::now());
        let gone = dir.path().join("gone");
        assert_eq!(staleness(&out, [&gone]), Staleness::InputUnreadable(gone.clone()));
    }
}
