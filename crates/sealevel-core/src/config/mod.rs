//! Configuration system.
//! TOML-based, layered resolution: CLI > env > project > user > defaults.

pub mod backup_config;
pub mod gridding_config;
pub mod paths_config;
pub mod sealevel_config;
pub mod sources_config;
pub mod storage_config;

pub use backup_config::BackupConfig;
pub use gridding_config::GriddingConfig;
pub use paths_config::PathsConfig;
pub use sealevel_config::{CliOverrides, SealevelConfig};
pub use sources_config::SourcesConfig;
pub use storage_config::{StorageConfig, StorageFormat};
