//! Read-only reference datasets, loaded once per run and shared by every
//! stage through [`ReferenceData`].

pub mod climatology;
pub mod geometry;
pub mod grid;
pub mod pattern;
pub mod sources;

use std::path::Path;

use ndarray::{Array2, Array3};

use sealevel_core::constants::PATTERN_NAMES;
use sealevel_core::errors::{PipelineError, ReferenceError};
use sealevel_storage::codec::ArrayCodec;
use sealevel_storage::dataset::Dataset;

pub use climatology::SeasonalClimatology;
pub use geometry::{GridGeometry, LinearTrendField};
pub use grid::{FineMask, OceanGrid};
pub use pattern::Pattern;
pub use sources::{CorrectionTable, SourceWindow, ValidityWindows};

pub const OCEAN_GRID_FILE: &str = "UPDATED_GRID_MASK_latlon";
pub const FINE_MASK_FILE: &str = "HR_GRID_MASK_latlon";
pub const CLIMATOLOGY_FILE: &str = "trnd_seas_simple_grid";
pub const GEOMETRY_FILE: &str = "GRID_GEOMETRY_ECCO_V4r4_latlon_0p50deg";
pub const TREND_FILE: &str = "BH_offset_and_trend_v0_new_grid";
pub const ANNUAL_PATTERN_FILE: &str = "ann_pattern";
pub const CORRECTION_FILE: &str = "S6_radiometer_additive_correction.csv";

/// Every reference input of the pipeline.
#[derive(Debug, Clone)]
pub struct ReferenceData {
    pub grid: OceanGrid,
    pub fine_mask: FineMask,
    pub climatology: SeasonalClimatology,
    pub geometry: GridGeometry,
    pub trend: LinearTrendField,
    pub patterns: Vec<Pattern>,
    pub validity: ValidityWindows,
    pub corrections: CorrectionTable,
}

impl ReferenceData {
    /// Load every reference file from `dir`, validating shapes against the
    /// ocean grid.
    pub fn load(
        dir: &Path,
        datasets_file: &Path,
        codec: &dyn ArrayCodec,
    ) -> Result<Self, PipelineError> {
        let read = |name: &str| codec.read(&dir.join(format!("{name}.{}", codec.extension())));

        let grid = OceanGrid::from_dataset(&read(OCEAN_GRID_FILE)?)?;
        let fine_mask = FineMask::from_dataset(&read(FINE_MASK_FILE)?)?;
        let climatology = SeasonalClimatology::from_dataset(&read(CLIMATOLOGY_FILE)?)?;
        let geometry = GridGeometry::from_dataset(&read(GEOMETRY_FILE)?, &grid)?;
        let trend = LinearTrendField::from_dataset(&read(TREND_FILE)?, &grid)?;

        let annual = read(ANNUAL_PATTERN_FILE)?;
        let mut patterns = Vec::with_capacity(PATTERN_NAMES.len());
        for name in PATTERN_NAMES {
            let ds = read(&format!("{name}_pattern_and_index"))?;
            patterns.push(Pattern::from_datasets(name, &ds, &annual, &grid)?);
        }

        let validity = ValidityWindows::load(datasets_file)?;
        let corrections = CorrectionTable::load(&dir.join(CORRECTION_FILE))?;

        let refs = Self {
            grid,
            fine_mask,
            climatology,
            geometry,
            trend,
            patterns,
            validity,
            corrections,
        };
        refs.validate()?;
        tracing::info!(
            dir = %dir.display(),
            patterns = refs.patterns.len(),
            sources = refs.validity.len(),
            "loaded reference data"
        );
        Ok(refs)
    }

    /// Cross-dataset shape checks.
    pub fn validate(&self) -> Result<(), ReferenceError> {
        let shape = self.grid.shape();
        expect_shape(CLIMATOLOGY_FILE, shape, self.climatology.offset_cm.dim())?;
        expect_shape(CLIMATOLOGY_FILE, shape, self.climatology.slope_cm_per_year.dim())?;
        let (_, lat, lon) = self.climatology.seasonal_cm.dim();
        expect_shape(CLIMATOLOGY_FILE, shape, (lat, lon))?;
        expect_shape(GEOMETRY_FILE, shape, self.geometry.area.dim())?;
        expect_shape(TREND_FILE, shape, self.trend.offset_m.dim())?;
        Ok(())
    }

    pub fn pattern(&self, name: &str) -> Option<&Pattern> {
        self.patterns.iter().find(|p| p.name == name)
    }
}

pub(crate) fn expect_shape(
    dataset: &str,
    expected: (usize, usize),
    found: (usize, usize),
) -> Result<(), ReferenceError> {
    if expected == found {
        Ok(())
    } else {
        Err(ReferenceError::ShapeMismatch {
            dataset: dataset.to_string(),
            expected: vec![expected.0, expected.1],
            found: vec![found.0, found.1],
        })
    }
}

fn missing(ds: &Dataset, name: &str) -> ReferenceError {
    ReferenceError::MissingVariable {
        dataset: label(ds),
        variable: name.to_string(),
    }
}

pub(crate) fn label(ds: &Dataset) -> String {
    ds.source
        .as_ref()
        .and_then(|p| p.file_name())
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "<memory>".to_string())
}

/// First of `names` present as a coordinate or variable.
pub(crate) fn axis(ds: &Dataset, names: &[&str]) -> Result<Vec<f64>, ReferenceError> {
    names
        .iter()
        .find_map(|n| ds.get(n))
        .map(|v| v.values.clone())
        .ok_or_else(|| missing(ds, names[0]))
}

/// Shape of `name` with leading singleton dimensions (e.g. depth `Z`) dropped.
fn squeezed_shape(ds: &Dataset, name: &str) -> Result<(Vec<usize>, Vec<f64>), ReferenceError> {
    let var = ds.get(name).ok_or_else(|| missing(ds, name))?;
    let mut shape = ds.shape(&var.dims).map_err(|_| missing(ds, name))?;
    while shape.len() > 2 && shape[0] == 1 {
        shape.remove(0);
    }
    Ok((shape, var.values.clone()))
}

/// A 2-D field, taking the first level of a leading singleton axis.
pub(crate) fn field2(ds: &Dataset, name: &str) -> Result<Array2<f64>, ReferenceError> {
    let (shape, values) = squeezed_shape(ds, name)?;
    let mismatch = |found: Vec<usize>| ReferenceError::ShapeMismatch {
        dataset: label(ds),
        expected: vec![0, 0],
        found,
    };
    match shape.as_slice() {
        [rows, cols] => Array2::from_shape_vec((*rows, *cols), values)
            .map_err(|_| mismatch(shape.clone())),
        _ => Err(mismatch(shape)),
    }
}

/// A 3-D field such as a monthly climatology.
pub(crate) fn field3(ds: &Dataset, name: &str) -> Result<Array3<f64>, ReferenceError> {
    let (shape, values) = squeezed_shape(ds, name)?;
    let mismatch = |found: Vec<usize>| ReferenceError::ShapeMismatch {
        dataset: label(ds),
        expected: vec![0, 0, 0],
        found,
    };
    match shape.as_slice() {
        [a, b, c] => Array3::from_shape_vec((*a, *b, *c), values)
            .map_err(|_| mismatch(shape.clone())),
        _ => Err(mismatch(shape)),
    }
}

/// Index of `value` in `axis`, within a small tolerance.
pub(crate) fn find_index(axis: &[f64], value: f64) -> Option<usize> {
    axis.iter().position(|a| (a - value).abs() < 1e-6)
}

/// Wrap a longitude into `[-180, 180)`.
pub fn wrap_lon(lon: f64) -> f64 {
    (lon + 180.0).rem_euclid(360.0) - 180.0
}
