//! Pipeline stage identifiers.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The three per-cycle stages of the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Granules to gridded cycle.
    Gridding,
    /// Gridded cycle to indicator records.
    Indicators,
    /// Gridded cycle to the smoothed fine-grid product.
    FineGrid,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Gridding => "gridding",
            Self::Indicators => "indicators",
            Self::FineGrid => "fine_grid",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
