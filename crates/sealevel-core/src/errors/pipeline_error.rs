//! Pipeline errors and non-fatal error collection.

use super::error_code::SealevelErrorCode;
use super::{ConfigError, CycleError, FitError, ReferenceError, StorageError};

/// Errors that can occur during pipeline execution.
/// Aggregates subsystem errors via `From` conversions.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Cycle error: {0}")]
    Cycle(#[from] CycleError),

    #[error("Fit error: {0}")]
    Fit(#[from] FitError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Reference error: {0}")]
    Reference(#[from] ReferenceError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl SealevelErrorCode for PipelineError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Cycle(e) => e.error_code(),
            Self::Fit(e) => e.error_code(),
            Self::Storage(e) => e.error_code(),
            Self::Reference(e) => e.error_code(),
            Self::Config(e) => e.error_code(),
        }
    }
}

/// Result of a pipeline run that accumulates non-fatal errors.
/// Allows partial results to be returned even when some cycles fail.
#[derive(Debug, Default)]
pub struct PipelineResult<T: Default = ()> {
    /// The successful result data.
    pub data: T,
    /// Non-fatal errors collected during the run.
    pub errors: Vec<PipelineError>,
}

impl<T: Default> PipelineResult<T> {
    /// Create a new pipeline result with no errors.
    pub fn new(data: T) -> Self {
        Self {
            data,
            errors: Vec::new(),
        }
    }

    /// Add a non-fatal error to the result.
    pub fn add_error(&mut self, error: PipelineError) {
        self.errors.push(error);
    }

    /// Returns true if there are no non-fatal errors.
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    /// Returns the number of non-fatal errors.
    pub fn error_count(&self) -> usize {
        self.errors.len()
    }
}
