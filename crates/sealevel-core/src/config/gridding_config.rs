//! Gaussian resampling configuration.

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_NEIGHBOURS, DEFAULT_ROI_M, DEFAULT_SIGMA_M};

/// Configuration for the Gaussian grid resampler.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct GriddingConfig {
    /// Radius of influence in meters. Default: 6e5.
    pub roi_m: Option<f64>,
    /// Gaussian smoothing width in meters. Default: 1e5.
    pub sigma_m: Option<f64>,
    /// Maximum contributing neighbours per cell. Default: 500.
    pub neighbours: Option<usize>,
    /// Worker threads for the resampler (0 = one per core). Default: 0.
    pub threads: Option<usize>,
}

impl GriddingConfig {
    pub fn effective_roi_m(&self) -> f64 {
        self.roi_m.unwrap_or(DEFAULT_ROI_M)
    }

    pub fn effective_sigma_m(&self) -> f64 {
        self.sigma_m.unwrap_or(DEFAULT_SIGMA_M)
    }

    pub fn effective_neighbours(&self) -> usize {
        self.neighbours.unwrap_or(DEFAULT_NEIGHBOURS)
    }

    pub fn effective_threads(&self) -> usize {
        self.threads.unwrap_or(0)
    }
}
