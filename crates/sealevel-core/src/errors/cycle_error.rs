//! Per-cycle errors. Each one skips the cycle it belongs to and nothing else.

use chrono::NaiveDate;

use super::error_code::{self, SealevelErrorCode};

/// Errors that end processing of a single repeat cycle.
#[derive(Debug, thiserror::Error)]
pub enum CycleError {
    #[error("No eligible granules in the window of cycle {center}")]
    EmptyCycle { center: NaiveDate },

    #[error("No finite SSHA values in the merged point cloud of cycle {center}")]
    NoValidData { center: NaiveDate },

    #[error("Cycle {center} fails the coverage gate: mean count {mean_count:.1} <= {required:.1}")]
    QualityGate {
        center: NaiveDate,
        mean_count: f64,
        required: f64,
    },
}

impl CycleError {
    /// The cycle center date the error belongs to.
    pub fn center(&self) -> NaiveDate {
        match self {
            Self::EmptyCycle { center }
            | Self::NoValidData { center }
            | Self::QualityGate { center, .. } => *center,
        }
    }
}

impl SealevelErrorCode for CycleError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::EmptyCycle { .. } => error_code::EMPTY_CYCLE,
            Self::NoValidData { .. } => error_code::NO_VALID_DATA,
            Self::QualityGate { .. } => error_code::QUALITY_GATE,
        }
    }
}
