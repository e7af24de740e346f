//! Reference dataset errors.

use super::error_code::{self, SealevelErrorCode};

/// Errors raised while loading or validating read-only reference inputs.
#[derive(Debug, thiserror::Error)]
pub enum ReferenceError {
    #[error("Reference dataset {dataset} is missing variable {variable}")]
    MissingVariable { dataset: String, variable: String },

    #[error("Reference dataset {dataset}: expected shape {expected:?}, found {found:?}")]
    ShapeMismatch {
        dataset: String,
        expected: Vec<usize>,
        found: Vec<usize>,
    },

    #[error("Invalid reference table {path}: {message}")]
    InvalidTable { path: String, message: String },

    #[error("Reference dataset {dataset}: {variable} value {value} is not {expected}")]
    InvalidCoordinate {
        dataset: String,
        variable: String,
        value: f64,
        expected: &'static str,
    },

    #[error("Pattern {pattern} coordinate ({lat}, {lon}) is not on the global grid")]
    OutsideGrid { pattern: String, lat: f64, lon: f64 },
}

impl SealevelErrorCode for ReferenceError {
    fn error_code(&self) -> &'static str {
        error_code::REFERENCE_ERROR
    }
}
