//! Granule discovery over the along-track archive.
//!
//! The archive holds one directory per source; each granule's date is the
//! last 8 characters of its file stem.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;

use sealevel_core::errors::StorageError;
use sealevel_core::types::CycleWindow;
use sealevel_storage::layout::granule_date;

use crate::reference::ValidityWindows;

/// One along-track input file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Granule {
    pub path: PathBuf,
    /// Name of the source directory holding the file.
    pub source: String,
    pub date: NaiveDate,
    pub is_reference: bool,
}

impl Granule {
    pub fn file_name(&self) -> &str {
        self.path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
    }

    /// Other sources first, then by date, then by file name.
    pub fn sort_key(&self) -> (bool, NaiveDate, &str) {
        (self.is_reference, self.date, self.file_name())
    }
}

/// Every granule in the archive, discovered once per run.
#[derive(Debug, Clone, Default)]
pub struct GranuleCatalog {
    granules: Vec<Granule>,
}

impl GranuleCatalog {
    /// Scan `<data_dir>/*/*.<extension>`. Files without a date suffix are
    /// skipped.
    pub fn discover(
        data_dir: &Path,
        extension: &str,
        reference_mission: &str,
    ) -> Result<Self, StorageError> {
        let pattern = format!(
            "{}/*/*.{}",
            glob::Pattern::escape(&data_dir.to_string_lossy()),
            glob::Pattern::escape(extension)
        );
        let paths = glob::glob(&pattern).map_err(|e| StorageError::Codec {
            path: data_dir.to_path_buf(),
            message: format!("invalid granule pattern: {e}"),
        })?;

        let mut granules = Vec::new();
        for entry in paths {
            let path = entry.map_err(|e| {
                let path = e.path().to_path_buf();
                StorageError::io(path, e.into_error())
            })?;
            let Some(source) = path
                .parent()
                .and_then(|p| p.file_name())
                .and_then(|n| n.to_str())
                .map(str::to_string)
            else {
                continue;
            };
            let Some(date) = granule_date(&path, extension) else {
                tracing::debug!(path = %path.display(), "skipping granule without date suffix");
                continue;
            };
            granules.push(Granule {
                is_reference: source == reference_mission,
                path,
                source,
                date,
            });
        }
        tracing::info!(
            data_dir = %data_dir.display(),
            granules = granules.len(),
            "discovered granules"
        );
        Ok(Self::from_granules(granules))
    }

    pub fn from_granules(mut granules: Vec<Granule>) -> Self {
        granules.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
        Self { granules }
    }

    pub fn len(&self) -> usize {
        self.granules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.granules.is_empty()
    }

    pub fn granules(&self) -> &[Granule] {
        &self.granules
    }

    /// Latest granule date of `source`.
    pub fn last_date(&self, source: &str) -> Option<NaiveDate> {
        self.granules
            .iter()
            .filter(|g| g.source == source)
            .map(|g| g.date)
            .max()
    }

    /// Granules eligible for a cycle window, in sort-key order: reference
    /// mission granules dated in the window, plus other-source granules
    /// dated in the window and inside their source's validity window.
    pub fn collect(&self, window: &CycleWindow, validity: &ValidityWindows) -> Vec<&Granule> {
        self.granules
            .iter()
            .filter(|g| window.contains(g.date))
            .filter(|g| g.is_reference || validity.covers(&g.source, g.date))
            .collect()
    }
}
