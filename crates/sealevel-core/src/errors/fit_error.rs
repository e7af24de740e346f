//! Regression errors.

use super::error_code::{self, SealevelErrorCode};

/// Errors raised while regressing a field against a pattern template.
#[derive(Debug, thiserror::Error)]
pub enum FitError {
    /// The normal matrix `XᵗX` cannot be inverted: the fit mask is empty
    /// or every template value under it is zero.
    #[error("Pattern {pattern} fit is degenerate ({cells} cells under the fit mask)")]
    Degenerate { pattern: String, cells: usize },
}

impl SealevelErrorCode for FitError {
    fn error_code(&self) -> &'static str {
        error_code::FIT_DEGENERATE
    }
}
