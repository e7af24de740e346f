//! Error handling for the pipeline.
//! One error enum per subsystem, `thiserror` only, zero `anyhow`.

pub mod config_error;
pub mod cycle_error;
pub mod error_code;
pub mod fit_error;
pub mod pipeline_error;
pub mod reference_error;
pub mod storage_error;

pub use config_error::ConfigError;
pub use cycle_error::CycleError;
pub use error_code::SealevelErrorCode;
pub use fit_error::FitError;
pub use pipeline_error::{PipelineError, PipelineResult};
pub use reference_error::ReferenceError;
pub use storage_error::StorageError;
