//! Gaussian-weighted resampling of a cycle's point cloud onto the ocean grid.
//!
//! Every wet cell averages the samples within the radius of influence,
//! nearest first and at most `neighbours` of them, with weights
//! `exp(-d² / σ²)` on chord distance `d`. Dry cells stay missing.

pub mod index;

use chrono::NaiveDate;
use ndarray::Array2;
use rayon::prelude::*;

use sealevel_core::config::GriddingConfig;
use sealevel_core::errors::{CycleError, StorageError};
use sealevel_core::types::cycle::date_from_unix_seconds;
use sealevel_core::types::RepeatCycle;
use sealevel_storage::dataset::{Dataset, Variable, VariableEncoding};

use crate::assembler::MergedCycle;
use crate::reference::OceanGrid;

pub use index::{to_ecef, PointIndex};

const GRID_DIMS: [&str; 2] = ["latitude", "longitude"];

/// Radius, smoothing width and neighbour bound of the Gaussian kernel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResampleParams {
    pub roi_m: f64,
    pub sigma_m: f64,
    pub neighbours: usize,
}

impl ResampleParams {
    pub fn from_config(config: &GriddingConfig) -> Self {
        Self {
            roi_m: config.effective_roi_m(),
            sigma_m: config.effective_sigma_m(),
            neighbours: config.effective_neighbours(),
        }
    }
}

impl Default for ResampleParams {
    fn default() -> Self {
        Self::from_config(&GriddingConfig::default())
    }
}

/// Where a gridded cycle came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Provenance {
    pub sources: Vec<String>,
    pub params: ResampleParams,
}

/// One cycle on the ocean grid.
///
/// `counts` is `0` on wet cells no sample reached and missing on dry cells;
/// `ssha` is missing on both.
#[derive(Debug, Clone, PartialEq)]
pub struct GriddedCycle {
    pub center: NaiveDate,
    pub lats: Vec<f64>,
    pub lons: Vec<f64>,
    /// Meters.
    pub ssha: Array2<f64>,
    pub counts: Array2<f64>,
    pub wet: Array2<bool>,
    pub provenance: Option<Provenance>,
}

impl GriddedCycle {
    pub fn filled_cells(&self) -> usize {
        self.ssha.iter().filter(|v| v.is_finite()).count()
    }

    /// The gridded-cycle artifact: `SSHA`, `counts` and `mask` on
    /// `(latitude, longitude)` with a scalar `time` coordinate. Data
    /// variables are compressed at `level`.
    pub fn to_dataset(&self, level: u8) -> Result<Dataset, StorageError> {
        let mut ds = Dataset::new();
        let lat = ds.add_axis("latitude", self.lats.clone(), VariableEncoding::coordinate())?;
        lat.set_attr("long_name", "latitude")
            .set_attr("standard_name", "latitude")
            .set_attr("units", "degrees_north");
        let lon = ds.add_axis("longitude", self.lons.clone(), VariableEncoding::coordinate())?;
        lon.set_attr("long_name", "longitude")
            .set_attr("standard_name", "longitude")
            .set_attr("units", "degrees_east");

        let seconds = RepeatCycle::new(self.center).unix_seconds() as f64;
        let time = ds.add_coord("time", Variable::new(&[], vec![seconds], VariableEncoding::time()))?;
        time.set_attr("long_name", "time")
            .set_attr("standard_name", "time")
            .set_attr("units", "seconds since 1970-01-01")
            .set_attr("calendar", "proleptic_gregorian")
            .set_attr("comment", "seconds since 1970-01-01 00:00:00");

        let encoding = VariableEncoding::data(level);
        let mut ssha = Variable::new(&GRID_DIMS, self.ssha.iter().copied().collect(), encoding);
        ssha.set_attr("long_name", "sea surface height anomaly")
            .set_attr("standard_name", "sea_surface_height_above_sea_level")
            .set_attr("units", "m")
            .set_attr("summary", "Data gridded to 0.5 degree lat lon grid");
        set_range(&mut ssha);
        ds.add_var("SSHA", ssha)?;

        let mut counts = Variable::new(&GRID_DIMS, self.counts.iter().copied().collect(), encoding);
        counts
            .set_attr(
                "long_name",
                "number of data values used in weighting each element in SSHA",
            )
            .set_attr("source", "Neighbour count returned by the Gaussian resampler.");
        set_range(&mut counts);
        ds.add_var("counts", counts)?;

        let mask = self.wet.iter().map(|&w| if w { 1.0 } else { 0.0 }).collect();
        let mask = ds.add_var("mask", Variable::new(&GRID_DIMS, mask, encoding))?;
        mask.set_attr("long_name", "wet/dry boolean mask for grid cell")
            .set_attr("comment", "1 for ocean, otherwise 0");

        if let Some(provenance) = &self.provenance {
            ds.set_attr(
                "gridding_method",
                format!(
                    "Gridded using Gaussian resampling with roi={}, sigma={}, neighbours={}",
                    provenance.params.roi_m, provenance.params.sigma_m, provenance.params.neighbours
                ),
            );
            ds.set_attr(
                "source",
                format!(
                    "Combination of {} along track instruments",
                    provenance.sources.join(", ")
                ),
            );
        }
        Ok(ds)
    }

    /// Read back a gridded-cycle artifact. Provenance is not recovered.
    pub fn from_dataset(ds: &Dataset) -> Result<Self, StorageError> {
        let lats = ds.require("latitude")?.values.clone();
        let lons = ds.require("longitude")?.values.clone();
        let shape = (lats.len(), lons.len());
        let field = |name: &str| -> Result<Array2<f64>, StorageError> {
            let values = ds.require(name)?.values.clone();
            Array2::from_shape_vec(shape, values).map_err(|e| StorageError::Codec {
                path: ds.source.clone().unwrap_or_default(),
                message: format!("{name}: {e}"),
            })
        };
        let ssha = field("SSHA")?;
        let counts = field("counts")?;
        let wet = field("mask")?.mapv(|m| m > 0.0);
        let time = ds.require("time")?;
        let center = time
            .values
            .first()
            .copied()
            .and_then(date_from_unix_seconds)
            .ok_or_else(|| StorageError::Codec {
                path: ds.source.clone().unwrap_or_default(),
                message: "time coordinate is not a valid timestamp".to_string(),
            })?;
        Ok(Self {
            center,
            lats,
            lons,
            ssha,
            counts,
            wet,
            provenance: None,
        })
    }
}

fn set_range(variable: &mut Variable) {
    if let Some((lo, hi)) = variable.finite_range() {
        variable.set_attr("valid_min", lo).set_attr("valid_max", hi);
    }
}

pub struct GaussianResampler {
    params: ResampleParams,
}

impl GaussianResampler {
    pub fn new(params: ResampleParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> ResampleParams {
        self.params
    }

    /// Grid `cloud` onto `grid`. Fails with `NoValidData` when no sample has
    /// a finite height and position.
    pub fn resample(
        &self,
        center: NaiveDate,
        cloud: &MergedCycle,
        grid: &OceanGrid,
    ) -> Result<GriddedCycle, CycleError> {
        let valid: Vec<usize> = (0..cloud.len())
            .filter(|&i| {
                cloud.ssha[i].is_finite() && cloud.lat[i].is_finite() && cloud.lon[i].is_finite()
            })
            .collect();
        if valid.is_empty() {
            return Err(CycleError::NoValidData { center });
        }
        let lats: Vec<f64> = valid.iter().map(|&i| cloud.lat[i]).collect();
        let lons: Vec<f64> = valid.iter().map(|&i| cloud.lon[i]).collect();
        let values: Vec<f64> = valid.iter().map(|&i| cloud.ssha[i]).collect();
        let index = PointIndex::build(&lats, &lons);

        let (rows, cols) = grid.shape();
        let wet_cells: Vec<(usize, usize)> = grid
            .wet
            .indexed_iter()
            .filter(|(_, &w)| w)
            .map(|(ij, _)| ij)
            .collect();

        let params = self.params;
        let sigma2 = params.sigma_m * params.sigma_m;
        let cells: Vec<(f64, f64)> = wet_cells
            .par_iter()
            .map_init(Vec::new, |buffer, &(i, j)| {
                index.within(grid.lats[i], grid.lons[j], params.roi_m, buffer);
                weighted_mean(buffer, &values, params.neighbours, sigma2)
            })
            .collect();

        let mut ssha = Array2::from_elem((rows, cols), f64::NAN);
        let mut counts = Array2::from_elem((rows, cols), f64::NAN);
        for (&(i, j), &(value, count)) in wet_cells.iter().zip(&cells) {
            ssha[[i, j]] = value;
            counts[[i, j]] = count;
        }

        Ok(GriddedCycle {
            center,
            lats: grid.lats.clone(),
            lons: grid.lons.clone(),
            ssha,
            counts,
            wet: grid.wet.clone(),
            provenance: Some(Provenance {
                sources: cloud.sources.clone(),
                params,
            }),
        })
    }
}

/// Gaussian mean of the nearest `limit` neighbours and how many contributed.
fn weighted_mean(
    neighbours: &mut Vec<index::Neighbour>,
    values: &[f64],
    limit: usize,
    sigma2: f64,
) -> (f64, f64) {
    if neighbours.len() > limit {
        neighbours.select_nth_unstable_by(limit, |a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        neighbours.truncate(limit);
    }
    if neighbours.is_empty() {
        return (f64::NAN, 0.0);
    }
    let (mut sum, mut weights) = (0.0, 0.0);
    for &(d2, i) in neighbours.iter() {
        let w = (-d2 / sigma2).exp();
        sum += w * values[i as usize];
        weights += w;
    }
    let value = if weights > 0.0 { sum / weights } else { f64::NAN };
    (value, neighbours.len() as f64)
}
