//! Artifact storage configuration.

use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_COMPRESSION_LEVEL;

/// On-disk container format for every persisted array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageFormat {
    /// zstd-compressed self-describing JSON document.
    #[default]
    Packed,
    /// NetCDF4 (requires the `netcdf` feature of `sealevel-storage`).
    Netcdf,
}

impl StorageFormat {
    /// File extension for artifacts written in this format.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Packed => "json.zst",
            Self::Netcdf => "nc",
        }
    }

    /// Default file extension of input granules in this format.
    pub fn granule_extension(self) -> &'static str {
        match self {
            Self::Packed => "json.zst",
            Self::Netcdf => "h5",
        }
    }
}

impl std::str::FromStr for StorageFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "packed" => Ok(Self::Packed),
            "netcdf" => Ok(Self::Netcdf),
            other => Err(format!("unknown storage format '{other}'")),
        }
    }
}

/// Configuration for artifact persistence.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct StorageConfig {
    /// Container format. Default: packed.
    pub format: Option<StorageFormat>,
    /// Compression level for data variables (0-9). Default: 5.
    pub compression_level: Option<u8>,
    /// Extension of input granule files. Default depends on `format`.
    pub granule_extension: Option<String>,
    /// Record runs and per-cycle failures in a SQLite ledger. Default: true.
    pub ledger: Option<bool>,
}

impl StorageConfig {
    pub fn effective_format(&self) -> StorageFormat {
        self.format.unwrap_or_default()
    }

    pub fn effective_compression_level(&self) -> u8 {
        self.compression_level.unwrap_or(DEFAULT_COMPRESSION_LEVEL)
    }

    pub fn effective_granule_extension(&self) -> String {
        self.granule_extension
            .clone()
            .unwrap_or_else(|| self.effective_format().granule_extension().to_string())
    }

    pub fn effective_ledger(&self) -> bool {
        self.ledger.unwrap_or(true)
    }
}
