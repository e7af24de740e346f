//! Backup configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Configuration for backups of the indicator master file.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct BackupConfig {
    /// Copy the indicator master aside before overwriting it. Default: true.
    pub enabled: Option<bool>,
    /// Custom backup directory. Default: `<output>/indicator/backups`.
    pub backup_dir: Option<PathBuf>,
}

impl BackupConfig {
    pub fn effective_enabled(&self) -> bool {
        self.enabled.unwrap_or(true)
    }
}
