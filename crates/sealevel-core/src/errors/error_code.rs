//! SealevelErrorCode trait for structured error reporting.

/// Every error enum implements this to provide a stable code string,
/// used in log fields and in the run ledger.
pub trait SealevelErrorCode {
    /// Returns the error code string (e.g., "EMPTY_CYCLE").
    fn error_code(&self) -> &'static str;

    /// Returns the formatted error string: `[ERROR_CODE] message`.
    fn coded_string(&self) -> String
    where
        Self: std::fmt::Display,
    {
        format!("[{}] {}", self.error_code(), self)
    }
}

pub const EMPTY_CYCLE: &str = "EMPTY_CYCLE";
pub const NO_VALID_DATA: &str = "NO_VALID_DATA";
pub const QUALITY_GATE: &str = "QUALITY_GATE";
pub const FIT_DEGENERATE: &str = "FIT_DEGENERATE";
pub const BACKUP_FAILED: &str = "BACKUP_FAILED";
pub const CONCAT_FAILED: &str = "CONCAT_FAILED";
pub const STORAGE_ERROR: &str = "STORAGE_ERROR";
pub const MIGRATION_FAILED: &str = "MIGRATION_FAILED";
pub const OUTPUT_LOCKED: &str = "OUTPUT_LOCKED";
pub const FORMAT_UNAVAILABLE: &str = "FORMAT_UNAVAILABLE";
pub const REFERENCE_ERROR: &str = "REFERENCE_ERROR";
pub const CONFIG_ERROR: &str = "CONFIG_ERROR";
