//! Input, output, and reference locations.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Filesystem locations used by a run. Relative paths resolve against the
/// project root passed to `SealevelConfig::load`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PathsConfig {
    /// Granule archive, one sub-directory per source. Default: `alongtrack-delivery`.
    pub data_dir: Option<PathBuf>,
    /// Artifact tree root. Default: `pipeline_output`.
    pub output_dir: Option<PathBuf>,
    /// Reference datasets. Default: `ref_files`.
    pub reference_dir: Option<PathBuf>,
    /// Source validity windows (YAML). Default: `conf/datasets.yaml`.
    pub datasets_file: Option<PathBuf>,
}

impl PathsConfig {
    pub fn effective_data_dir(&self) -> PathBuf {
        self.data_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("alongtrack-delivery"))
    }

    pub fn effective_output_dir(&self) -> PathBuf {
        self.output_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("pipeline_output"))
    }

    pub fn effective_reference_dir(&self) -> PathBuf {
        self.reference_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("ref_files"))
    }

    pub fn effective_datasets_file(&self) -> PathBuf {
        self.datasets_file
            .clone()
            .unwrap_or_else(|| PathBuf::from("conf/datasets.yaml"))
    }

    /// Resolve a configured location against the project root.
    /// Absolute paths are returned unchanged.
    pub fn rooted(root: &Path, path: &Path) -> PathBuf {
        root.join(path)
    }
}
