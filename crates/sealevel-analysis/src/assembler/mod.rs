//! Repeat-cycle assembly: select the granules of a cycle window and merge
//! them into one time-ordered point cloud.

pub mod catalog;

use chrono::NaiveDate;

use sealevel_core::errors::{CycleError, PipelineError, StorageError};
use sealevel_core::types::{CycleWindow, RepeatCycle};
use sealevel_storage::codec::ArrayCodec;

pub use catalog::{Granule, GranuleCatalog};

use crate::reference::{CorrectionTable, ValidityWindows};

/// The 9-day window `[center - 5d, center + 4d)` of the cycle at `center`.
pub fn discover_cycle_window(center: NaiveDate) -> CycleWindow {
    RepeatCycle::new(center).window()
}

/// All samples of one cycle, sorted by time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergedCycle {
    /// Seconds since 1985-01-01.
    pub time: Vec<f64>,
    pub lat: Vec<f64>,
    pub lon: Vec<f64>,
    /// Meters; `NaN` where the granule had no valid height.
    pub ssha: Vec<f64>,
    /// Distinct source names, sorted.
    pub sources: Vec<String>,
}

impl MergedCycle {
    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    pub fn finite_count(&self) -> usize {
        self.ssha.iter().filter(|v| v.is_finite()).count()
    }

    fn extend(&mut self, other: &GranuleSamples, correction: f64) {
        self.time.extend_from_slice(&other.time);
        self.lat.extend_from_slice(&other.lat);
        self.lon.extend_from_slice(&other.lon);
        self.ssha.extend(other.ssha.iter().map(|v| v + correction));
    }

    /// Stable sort of every sample by time.
    fn sort_by_time(&mut self) {
        let mut order: Vec<usize> = (0..self.len()).collect();
        order.sort_by(|&a, &b| self.time[a].total_cmp(&self.time[b]));
        let permute = |v: &[f64]| order.iter().map(|&i| v[i]).collect::<Vec<_>>();
        self.time = permute(&self.time);
        self.lat = permute(&self.lat);
        self.lon = permute(&self.lon);
        self.ssha = permute(&self.ssha);
    }
}

/// Samples read from one granule file.
#[derive(Debug, Clone, Default)]
struct GranuleSamples {
    time: Vec<f64>,
    lat: Vec<f64>,
    lon: Vec<f64>,
    ssha: Vec<f64>,
}

impl GranuleSamples {
    fn read(codec: &dyn ArrayCodec, granule: &Granule) -> Result<Self, StorageError> {
        let ds = codec.read_granule(&granule.path)?;
        let samples = Self {
            ssha: ds.require("ssh")?.values.clone(),
            lat: ds.require("lats")?.values.clone(),
            lon: ds.require("lons")?.values.clone(),
            time: ds.require("time")?.values.clone(),
        };
        let n = samples.time.len();
        if samples.ssha.len() != n || samples.lat.len() != n || samples.lon.len() != n {
            return Err(StorageError::Codec {
                path: granule.path.clone(),
                message: "ssh, lats, lons and time differ in length".to_string(),
            });
        }
        Ok(samples)
    }
}

/// Selects and merges the granules of each cycle.
pub struct CycleAssembler<'a> {
    catalog: &'a GranuleCatalog,
    validity: &'a ValidityWindows,
    corrections: &'a CorrectionTable,
    codec: &'a dyn ArrayCodec,
    corrected_source: &'a str,
}

impl<'a> CycleAssembler<'a> {
    pub fn new(
        catalog: &'a GranuleCatalog,
        validity: &'a ValidityWindows,
        corrections: &'a CorrectionTable,
        codec: &'a dyn ArrayCodec,
        corrected_source: &'a str,
    ) -> Self {
        Self {
            catalog,
            validity,
            corrections,
            codec,
            corrected_source,
        }
    }

    /// Eligible granules of `cycle`, in sort-key order.
    pub fn collect_granules(&self, cycle: &RepeatCycle) -> Result<Vec<&'a Granule>, CycleError> {
        let window = discover_cycle_window(cycle.center);
        let granules = self.catalog.collect(&window, self.validity);
        if granules.is_empty() {
            return Err(CycleError::EmptyCycle {
                center: cycle.center,
            });
        }
        Ok(granules)
    }

    /// Concatenate the samples of `granules`, add the source's bias
    /// correction, and sort by time.
    pub fn merge(&self, granules: &[&Granule]) -> Result<MergedCycle, PipelineError> {
        let mut merged = MergedCycle::default();
        for granule in granules {
            let samples = GranuleSamples::read(self.codec, granule)?;
            let correction = if granule.source == self.corrected_source {
                self.corrections.correction_for(granule.file_name())
            } else {
                0.0
            };
            if correction != 0.0 {
                tracing::debug!(
                    granule = granule.file_name(),
                    correction,
                    "applying additive correction"
                );
            }
            merged.extend(&samples, correction);
        }
        merged.sort_by_time();

        let mut sources: Vec<String> = granules.iter().map(|g| g.source.clone()).collect();
        sources.sort();
        sources.dedup();
        merged.sources = sources;
        Ok(merged)
    }
}
