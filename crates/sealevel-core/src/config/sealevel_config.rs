//! Top-level configuration with layered resolution.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::{
    BackupConfig, GriddingConfig, PathsConfig, SourcesConfig, StorageConfig, StorageFormat,
};
use crate::errors::ConfigError;

/// Top-level configuration aggregating all sub-configs.
///
/// Resolution order (highest priority first):
/// 1. CLI flags (applied via `apply_cli_overrides`)
/// 2. Environment variables (`SEALEVEL_*`)
/// 3. Project config (`sealevel.toml` in project root)
/// 4. User config (`~/.sealevel/config.toml`)
/// 5. Compiled defaults
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SealevelConfig {
    pub paths: PathsConfig,
    pub sources: SourcesConfig,
    pub gridding: GriddingConfig,
    pub storage: StorageConfig,
    pub backup: BackupConfig,
}

/// CLI override arguments that can be applied to a config.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub data_dir: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub gridding_threads: Option<usize>,
    pub gridding_neighbours: Option<usize>,
}

impl SealevelConfig {
    /// Load configuration with layered resolution rooted at `root`.
    pub fn load(root: &Path, cli_overrides: Option<&CliOverrides>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        // Layer 4 (lowest priority): user config
        if let Some(user_config_path) = Self::user_config_path() {
            if user_config_path.exists() {
                match Self::merge_toml_file(&mut config, &user_config_path) {
                    Ok(()) => {}
                    Err(ConfigError::ParseError { .. }) => {
                        return Err(ConfigError::ParseError {
                            path: user_config_path.display().to_string(),
                            message: "invalid TOML in user config".to_string(),
                        });
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "ignoring unreadable user config");
                    }
                }
            }
        }

        // Layer 3: project config
        let project_config_path = root.join("sealevel.toml");
        if project_config_path.exists() {
            Self::merge_toml_file(&mut config, &project_config_path)?;
        }

        // Layer 2: environment variables
        Self::apply_env_overrides(&mut config);

        // Layer 1 (highest priority): CLI flags
        if let Some(cli) = cli_overrides {
            Self::apply_cli_overrides(&mut config, cli);
        }

        Self::validate(&config)?;

        Ok(config)
    }

    /// Load configuration from a TOML string (for testing).
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(toml_str).map_err(|e| ConfigError::ParseError {
            path: "<string>".to_string(),
            message: e.to_string(),
        })?;
        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate the configuration values.
    pub fn validate(config: &SealevelConfig) -> Result<(), ConfigError> {
        if let Some(roi) = config.gridding.roi_m {
            if roi.is_nan() || roi <= 0.0 {
                return Err(ConfigError::ValidationFailed {
                    field: "gridding.roi_m".to_string(),
                    message: "must be greater than 0".to_string(),
                });
            }
        }
        if let Some(sigma) = config.gridding.sigma_m {
            if sigma.is_nan() || sigma <= 0.0 {
                return Err(ConfigError::ValidationFailed {
                    field: "gridding.sigma_m".to_string(),
                    message: "must be greater than 0".to_string(),
                });
            }
        }
        if config.gridding.neighbours == Some(0) {
            return Err(ConfigError::ValidationFailed {
                field: "gridding.neighbours".to_string(),
                message: "must be greater than 0".to_string(),
            });
        }
        if let Some(level) = config.storage.compression_level {
            if level > 9 {
                return Err(ConfigError::ValidationFailed {
                    field: "storage.compression_level".to_string(),
                    message: "must be between 0 and 9".to_string(),
                });
            }
        }
        Ok(())
    }

    /// Returns the user config path: `~/.sealevel/config.toml`.
    fn user_config_path() -> Option<PathBuf> {
        home_dir().map(|h| h.join(".sealevel").join("config.toml"))
    }

    /// Merge a TOML file into the existing config.
    /// Unknown keys are silently ignored (forward-compatible).
    fn merge_toml_file(config: &mut SealevelConfig, path: &Path) -> Result<(), ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
            path: path.display().to_string(),
        })?;

        let file_config: SealevelConfig =
            toml::from_str(&content).map_err(|e| ConfigError::ParseError {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;

        Self::merge(config, &file_config);
        Ok(())
    }

    /// Merge `other` into `base`, where `other` values override `base` values
    /// only when `other` has a `Some` value.
    fn merge(base: &mut SealevelConfig, other: &SealevelConfig) {
        // Paths
        if other.paths.data_dir.is_some() {
            base.paths.data_dir = other.paths.data_dir.clone();
        }
        if other.paths.output_dir.is_some() {
            base.paths.output_dir = other.paths.output_dir.clone();
        }
        if other.paths.reference_dir.is_some() {
            base.paths.reference_dir = other.paths.reference_dir.clone();
        }
        if other.paths.datasets_file.is_some() {
            base.paths.datasets_file = other.paths.datasets_file.clone();
        }

        // Sources
        if other.sources.reference_mission.is_some() {
            base.sources.reference_mission = other.sources.reference_mission.clone();
        }
        if other.sources.anchor_source.is_some() {
            base.sources.anchor_source = other.sources.anchor_source.clone();
        }
        if other.sources.corrected_source.is_some() {
            base.sources.corrected_source = other.sources.corrected_source.clone();
        }

        // Gridding
        if other.gridding.roi_m.is_some() {
            base.gridding.roi_m = other.gridding.roi_m;
        }
        if other.gridding.sigma_m.is_some() {
            base.gridding.sigma_m = other.gridding.sigma_m;
        }
        if other.gridding.neighbours.is_some() {
            base.gridding.neighbours = other.gridding.neighbours;
        }
        if other.gridding.threads.is_some() {
            base.gridding.threads = other.gridding.threads;
        }

        // Storage
        if other.storage.format.is_some() {
            base.storage.format = other.storage.format;
        }
        if other.storage.compression_level.is_some() {
            base.storage.compression_level = other.storage.compression_level;
        }
        if other.storage.granule_extension.is_some() {
            base.storage.granule_extension = other.storage.granule_extension.clone();
        }
        if other.storage.ledger.is_some() {
            base.storage.ledger = other.storage.ledger;
        }

        // Backup
        if other.backup.enabled.is_some() {
            base.backup.enabled = other.backup.enabled;
        }
        if other.backup.backup_dir.is_some() {
            base.backup.backup_dir = other.backup.backup_dir.clone();
        }
    }

    /// Apply environment variable overrides.
    /// Pattern: `SEALEVEL_OUTPUT_DIR`, `SEALEVEL_GRIDDING_NEIGHBOURS`, etc.
    fn apply_env_overrides(config: &mut SealevelConfig) {
        if let Ok(val) = std::env::var("SEALEVEL_DATA_DIR") {
            config.paths.data_dir = Some(PathBuf::from(val));
        }
        if let Ok(val) = std::env::var("SEALEVEL_OUTPUT_DIR") {
            config.paths.output_dir = Some(PathBuf::from(val));
        }
        if let Ok(val) = std::env::var("SEALEVEL_REFERENCE_DIR") {
            config.paths.reference_dir = Some(PathBuf::from(val));
        }
        if let Ok(val) = std::env::var("SEALEVEL_GRIDDING_NEIGHBOURS") {
            if let Ok(v) = val.parse::<usize>() {
                config.gridding.neighbours = Some(v);
            }
        }
        if let Ok(val) = std::env::var("SEALEVEL_GRIDDING_THREADS") {
            if let Ok(v) = val.parse::<usize>() {
                config.gridding.threads = Some(v);
            }
        }
        if let Ok(val) = std::env::var("SEALEVEL_STORAGE_FORMAT") {
            if let Ok(v) = val.parse::<StorageFormat>() {
                config.storage.format = Some(v);
            }
        }
    }

    /// Apply CLI overrides (highest priority).
    fn apply_cli_overrides(config: &mut SealevelConfig, cli: &CliOverrides) {
        if let Some(ref v) = cli.data_dir {
            config.paths.data_dir = Some(v.clone());
        }
        if let Some(ref v) = cli.output_dir {
            config.paths.output_dir = Some(v.clone());
        }
        if let Some(v) = cli.gridding_threads {
            config.gridding.threads = Some(v);
        }
        if let Some(v) = cli.gridding_neighbours {
            config.gridding.neighbours = Some(v);
        }
    }

    /// Serialize the config back to TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ParseError {
            path: "<serialization>".to_string(),
            message: e.to_string(),
        })
    }
}

/// Cross-platform home directory resolution.
fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(PathBuf::from)
}
