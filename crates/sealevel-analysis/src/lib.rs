//! Sea level pipeline analysis: repeat-cycle assembly, Gaussian gridding,
//! the smoothed fine-grid product, climate index regression, and the
//! stage runner that ties them to the artifact store.

pub mod assembler;
pub mod fine_grid;
pub mod indicators;
pub mod pipeline;
pub mod reference;
pub mod resampler;

pub use pipeline::{Pipeline, RunReport, StageReport};
pub use reference::ReferenceData;
