//! Storage errors.

use std::path::PathBuf;

use super::error_code::{self, SealevelErrorCode};

/// Errors that can occur while reading or writing artifacts.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Codec error on {path}: {message}")]
    Codec { path: PathBuf, message: String },

    #[error("{path} has no variable {variable}")]
    MissingVariable { path: PathBuf, variable: String },

    #[error("Backup of {path} failed: {message}")]
    BackupFailed { path: PathBuf, message: String },

    #[error("Concatenation of {product} failed: {message}")]
    ConcatenationFailed { product: String, message: String },

    #[error("SQLite error: {message}")]
    SqliteError { message: String },

    #[error("Migration to version {version} failed: {message}")]
    MigrationFailed { version: u32, message: String },

    #[error("Output directory {path} is locked by another run")]
    Locked { path: PathBuf },

    #[error("Storage format {format} is not available in this build")]
    FormatUnavailable { format: String },
}

impl StorageError {
    /// Wrap an `io::Error` with the path it occurred on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

impl SealevelErrorCode for StorageError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::BackupFailed { .. } => error_code::BACKUP_FAILED,
            Self::ConcatenationFailed { .. } => error_code::CONCAT_FAILED,
            Self::MigrationFailed { .. } => error_code::MIGRATION_FAILED,
            Self::Locked { .. } => error_code::OUTPUT_LOCKED,
            Self::FormatUnavailable { .. } => error_code::FORMAT_UNAVAILABLE,
            _ => error_code::STORAGE_ERROR,
        }
    }
}
