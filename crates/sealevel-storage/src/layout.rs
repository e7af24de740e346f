//! Output artifact tree and file naming.
//!
//! ```text
//! <output>/gridded_cycles/ssha_global_half_deg_YYYYMMDD.<ext>
//! <output>/ENSO_grids/ssha_enso_YYYYMMDD.<ext>
//! <output>/indicator/daily/cycle_indicators/YYYY_MM_DD_indicator.<ext>
//! <output>/indicator/daily/cycle_globals/YYYY_MM_DD_globals.<ext>
//! <output>/indicator/daily/cycle_pattern_anoms/<p>/YYYY_MM_DD_<p>_ssha_anoms.<ext>
//! <output>/indicator/{indicators,globals,<p>_anoms}.<ext>
//! <output>/indicator/backups/indicator_<mtime>.<ext>
//! ```

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

use sealevel_core::errors::StorageError;

const GRIDDED_DIR: &str = "gridded_cycles";
const FINE_GRID_DIR: &str = "ENSO_grids";
const INDICATOR_DIR: &str = "indicator";
const LOCK_FILE: &str = ".sealevel.lock";
const LEDGER_FILE: &str = ".sealevel_runs.db";

/// Paths of every artifact under one output root.
#[derive(Debug, Clone)]
pub struct ArtifactLayout {
    root: PathBuf,
    extension: String,
    backup_dir: Option<PathBuf>,
}

impl ArtifactLayout {
    pub fn new(root: impl Into<PathBuf>, extension: &str) -> Self {
        Self {
            root: root.into(),
            extension: extension.to_string(),
            backup_dir: None,
        }
    }

    /// Override the default `<output>/indicator/backups`.
    pub fn with_backup_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.backup_dir = dir;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    fn file(&self, stem: String) -> String {
        format!("{stem}.{}", self.extension)
    }

    pub fn gridded_dir(&self) -> PathBuf {
        self.root.join(GRIDDED_DIR)
    }

    pub fn gridded_cycle(&self, center: NaiveDate) -> PathBuf {
        self.gridded_dir()
            .join(self.file(format!("ssha_global_half_deg_{}", center.format("%Y%m%d"))))
    }

    pub fn fine_grid_dir(&self) -> PathBuf {
        self.root.join(FINE_GRID_DIR)
    }

    pub fn fine_grid(&self, center: NaiveDate) -> PathBuf {
        self.fine_grid_dir()
            .join(self.file(format!("ssha_enso_{}", center.format("%Y%m%d"))))
    }

    pub fn indicator_dir(&self) -> PathBuf {
        self.root.join(INDICATOR_DIR)
    }

    fn daily_dir(&self) -> PathBuf {
        self.indicator_dir().join("daily")
    }

    pub fn cycle_indicators_dir(&self) -> PathBuf {
        self.daily_dir().join("cycle_indicators")
    }

    pub fn cycle_indicator(&self, center: NaiveDate) -> PathBuf {
        self.cycle_indicators_dir()
            .join(self.file(format!("{}_indicator", underscored(center))))
    }

    pub fn cycle_globals_dir(&self) -> PathBuf {
        self.daily_dir().join("cycle_globals")
    }

    pub fn cycle_globals(&self, center: NaiveDate) -> PathBuf {
        self.cycle_globals_dir()
            .join(self.file(format!("{}_globals", underscored(center))))
    }

    pub fn cycle_pattern_anoms_dir(&self, pattern: &str) -> PathBuf {
        self.daily_dir().join("cycle_pattern_anoms").join(pattern)
    }

    pub fn cycle_pattern_anoms(&self, pattern: &str, center: NaiveDate) -> PathBuf {
        self.cycle_pattern_anoms_dir(pattern)
            .join(self.file(format!("{}_{pattern}_ssha_anoms", underscored(center))))
    }

    pub fn indicators_master(&self) -> PathBuf {
        self.indicator_dir().join(self.file("indicators".to_string()))
    }

    pub fn globals_master(&self) -> PathBuf {
        self.indicator_dir().join(self.file("globals".to_string()))
    }

    pub fn pattern_master(&self, pattern: &str) -> PathBuf {
        self.indicator_dir().join(self.file(format!("{pattern}_anoms")))
    }

    pub fn backup_dir(&self) -> PathBuf {
        self.backup_dir
            .clone()
            .unwrap_or_else(|| self.indicator_dir().join("backups"))
    }

    pub fn lock_path(&self) -> PathBuf {
        self.root.join(LOCK_FILE)
    }

    pub fn ledger_path(&self) -> PathBuf {
        self.root.join(LEDGER_FILE)
    }

    /// Artifacts in `dir` with this layout's extension, sorted by file name.
    /// A missing directory yields an empty list.
    pub fn list(&self, dir: &Path) -> Result<Vec<PathBuf>, StorageError> {
        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StorageError::io(dir, e)),
        };
        let suffix = format!(".{}", self.extension);
        let mut files = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| StorageError::io(dir, e))?;
            let path = entry.path();
            let matches = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.ends_with(&suffix));
            if matches && path.is_file() {
                files.push(path);
            }
        }
        files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
        Ok(files)
    }
}

fn underscored(date: NaiveDate) -> String {
    date.format("%Y_%m_%d").to_string()
}

static DATE_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(\d{4})_?(\d{2})_?(\d{2})").ok());

/// File name with `extension` (no leading dot) removed.
pub fn stem_without_extension<'a>(file_name: &'a str, extension: &str) -> &'a str {
    file_name
        .strip_suffix(extension)
        .and_then(|s| s.strip_suffix('.'))
        .unwrap_or(file_name)
}

/// The last 8 characters of a granule's stem, parsed as `YYYYMMDD`.
pub fn granule_date(path: &Path, extension: &str) -> Option<NaiveDate> {
    let name = path.file_name()?.to_str()?;
    let stem = stem_without_extension(name, extension);
    let key = stem.get(stem.len().checked_sub(8)?..)?;
    sealevel_core::types::cycle::parse_date_key(key)
}

/// Date embedded in an artifact file name (`YYYYMMDD` or `YYYY_MM_DD`).
pub fn artifact_date(path: &Path) -> Option<NaiveDate> {
    let name = path.file_name()?.to_str()?;
    let caps = DATE_RE.as_ref()?.captures_iter(name).last()?;
    let y = caps.get(1)?.as_str().parse().ok()?;
    let m = caps.get(2)?.as_str().parse().ok()?;
    let d = caps.get(3)?.as_str().parse().ok()?;
    NaiveDate::from_ymd_opt(y, m, d)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn artifact_names() {
        let layout = ArtifactLayout::new("/out", "nc");
        assert_eq!(
            layout.gridded_cycle(d(1999, 10, 5)),
            PathBuf::from("/out/gridded_cycles/ssha_global_half_deg_19991005.nc")
        );
        assert_eq!(
            layout.fine_grid(d(1999, 10, 5)),
            PathBuf::from("/out/ENSO_grids/ssha_enso_19991005.nc")
        );
        assert_eq!(
            layout.cycle_indicator(d(1999, 10, 5)),
            PathBuf::from("/out/indicator/daily/cycle_indicators/1999_10_05_indicator.nc")
        );
        assert_eq!(
            layout.cycle_pattern_anoms("pdo", d(1999, 10, 5)),
            PathBuf::from(
                "/out/indicator/daily/cycle_pattern_anoms/pdo/1999_10_05_pdo_ssha_anoms.nc"
            )
        );
        assert_eq!(layout.pattern_master("iod"), PathBuf::from("/out/indicator/iod_anoms.nc"));
        assert_eq!(layout.backup_dir(), PathBuf::from("/out/indicator/backups"));
    }

    #[test]
    fn dates_from_names() {
        assert_eq!(
            granule_date(Path::new("/a/SNTNL-6A/ssh_alt_19991004.h5"), "h5"),
            Some(d(1999, 10, 4))
        );
        assert_eq!(
            granule_date(Path::new("x_20200101.json.zst"), "json.zst"),
            Some(d(2020, 1, 1))
        );
        assert_eq!(granule_date(Path::new("short.h5"), "h5"), None);
        assert_eq!(
            artifact_date(Path::new("ssha_global_half_deg_19991005.nc")),
            Some(d(1999, 10, 5))
        );
        assert_eq!(
            artifact_date(Path::new("1999_10_05_enso_ssha_anoms.nc")),
            Some(d(1999, 10, 5))
        );
    }

    #[test]
    fn listing_filters_by_extension_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b_20000102.nc", "a_20000109.nc", "notes.txt"] {
            std::fs::write(dir.path().join(name), b"").unwrap();
        }
        let layout = ArtifactLayout::new(dir.path(), "nc");
        let files = layout.list(dir.path()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["a_20000109.nc", "b_20000102.nc"]);
        assert!(layout.list(&dir.path().join("missing")).unwrap().is_empty());
    }
}
