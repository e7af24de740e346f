//! Fine-grid ("ENSO") product: a gridded cycle with its seasonal cycle and
//! long-term trend removed, regridded to 0.25°, boxcar smoothed, and
//! masked by land and sample count. Millimeters.

pub mod boxcar;
pub mod interp;

use chrono::{Datelike, NaiveDate};
use ndarray::{Array2, Zip};

use sealevel_core::constants::{
    CM_TO_MM, FINE_GRID_BOXCAR, FINE_GRID_LAT_LIMIT, FINE_GRID_LAT_START, FINE_GRID_LAT_STOP,
    FINE_GRID_LON_START, FINE_GRID_LON_STOP, FINE_GRID_MIN_COUNT, FINE_GRID_PAD_DEG,
    FINE_GRID_STEP_DEG, M_TO_MM,
};
use sealevel_core::errors::{ReferenceError, StorageError};
use sealevel_core::types::cycle::decimal_year;
use sealevel_core::types::RepeatCycle;
use sealevel_storage::dataset::{Dataset, Variable, VariableEncoding};

use crate::reference::{FineMask, SeasonalClimatology};
use crate::resampler::GriddedCycle;

pub use boxcar::boxcar_mean;
pub use interp::{bilinear, pad_longitudes, trim_latitudes, trim_longitudes, wrap_columns};

/// `start, start + step, ...` strictly below `stop`.
pub fn arange(start: f64, stop: f64, step: f64) -> Vec<f64> {
    let n = ((stop - start) / step).ceil().max(0.0) as usize;
    (0..n).map(|i| start + step * i as f64).collect()
}

/// Target axes and thresholds of the fine grid.
#[derive(Debug, Clone, PartialEq)]
pub struct FineGridSpec {
    pub lats: Vec<f64>,
    /// Padded longitude axis, spanning past both edges of `[0, 360)`.
    pub lons: Vec<f64>,
    pub pad_deg: f64,
    /// `(longitude cells, latitude cells)`.
    pub boxcar: (usize, usize),
    pub min_count: f64,
    pub lat_limit: f64,
}

impl FineGridSpec {
    /// The production 0.25° grid.
    pub fn standard() -> Self {
        Self {
            lats: arange(FINE_GRID_LAT_START, FINE_GRID_LAT_STOP, FINE_GRID_STEP_DEG),
            lons: arange(FINE_GRID_LON_START, FINE_GRID_LON_STOP, FINE_GRID_STEP_DEG),
            pad_deg: FINE_GRID_PAD_DEG,
            boxcar: FINE_GRID_BOXCAR,
            min_count: FINE_GRID_MIN_COUNT,
            lat_limit: FINE_GRID_LAT_LIMIT,
        }
    }

    /// Shape of the fine field after trimming to `[0, 360]`, before the
    /// latitude band: the shape the fine land mask must have.
    pub fn mask_shape(&self) -> (usize, usize) {
        let cols = self.lons.iter().filter(|l| (0.0..=360.0).contains(*l)).count();
        (self.lats.len(), cols)
    }
}

impl Default for FineGridSpec {
    fn default() -> Self {
        Self::standard()
    }
}

/// One fine-grid cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct FineGrid {
    pub center: NaiveDate,
    pub lats: Vec<f64>,
    pub lons: Vec<f64>,
    pub ssha_mm: Array2<f64>,
}

impl FineGrid {
    pub fn to_dataset(&self, level: u8) -> Result<Dataset, StorageError> {
        let mut ds = Dataset::new();
        ds.add_axis("latitude", self.lats.clone(), VariableEncoding::coordinate())?
            .set_attr("long_name", "latitude")
            .set_attr("standard_name", "latitude");
        ds.add_axis("longitude", self.lons.clone(), VariableEncoding::coordinate())?
            .set_attr("long_name", "longitude")
            .set_attr("standard_name", "longitude");
        let seconds = RepeatCycle::new(self.center).unix_seconds() as f64;
        ds.add_coord("time", Variable::new(&[], vec![seconds], VariableEncoding::time()))?
            .set_attr("long_name", "time")
            .set_attr("standard_name", "time");

        let mut ssha = Variable::new(
            &["latitude", "longitude"],
            self.ssha_mm.iter().copied().collect(),
            VariableEncoding::data(level),
        );
        ssha.set_attr("long_name", "sea surface height anomaly")
            .set_attr("standard_name", "sea_surface_height_above_sea_level")
            .set_attr("units", "mm")
            .set_attr(
                "summary",
                "Data gridded to 0.25 degree grid with boxcar smoothing applied",
            );
        if let Some((lo, hi)) = ssha.finite_range() {
            ssha.set_attr("valid_min", lo).set_attr("valid_max", hi);
        }
        ds.add_var("SSHA", ssha)?;
        Ok(ds)
    }
}

fn mask_where(field: &mut Array2<f64>, drop: &Array2<bool>) {
    Zip::from(field).and(drop).for_each(|v, &d| {
        if d {
            *v = f64::NAN;
        }
    });
}

/// Build the fine-grid product of one gridded cycle.
pub fn make_fine_grid(
    gridded: &GriddedCycle,
    climatology: &SeasonalClimatology,
    mask: &FineMask,
    spec: &FineGridSpec,
) -> Result<FineGrid, ReferenceError> {
    let (lons, mut fields) = wrap_columns(&gridded.lons, &[&gridded.ssha, &gridded.counts]);
    let mut counts = fields.pop().unwrap_or_default();
    let mut ssha = fields.pop().unwrap_or_default().mapv(|v| v * M_TO_MM);

    // Cells without enough samples are dropped before anything else.
    let sparse = counts.mapv(|c| !(c > spec.min_count));
    mask_where(&mut ssha, &sparse);
    mask_where(&mut counts, &sparse);

    let shape = ssha.dim();
    for found in [climatology.offset_cm.dim(), climatology.slope_cm_per_year.dim()] {
        if found != shape {
            return Err(ReferenceError::ShapeMismatch {
                dataset: "seasonal climatology".to_string(),
                expected: vec![shape.0, shape.1],
                found: vec![found.0, found.1],
            });
        }
    }
    let year = decimal_year(gridded.center);
    let fraction = year - gridded.center.year() as f64;
    let seasonal = climatology.seasonal_at(fraction);
    let trend = climatology.trend_at(year);
    Zip::from(&mut ssha)
        .and(&seasonal)
        .and(&trend)
        .for_each(|v, &s, &t| *v -= (s + t) * CM_TO_MM);

    let (padded_lons, padded_ssha) = pad_longitudes(&lons, &ssha, spec.pad_deg);
    let (_, padded_counts) = pad_longitudes(&lons, &counts, spec.pad_deg);

    let fine_ssha = bilinear(&gridded.lats, &padded_lons, &padded_ssha, &spec.lats, &spec.lons);
    let fine_counts = bilinear(&gridded.lats, &padded_lons, &padded_counts, &spec.lats, &spec.lons);

    let window = (spec.boxcar.1, spec.boxcar.0);
    let smooth_ssha = boxcar_mean(&fine_ssha, window);
    let smooth_counts = boxcar_mean(&fine_counts, window);

    let (fine_lons, mut ssha) = trim_longitudes(&spec.lons, &smooth_ssha, 0.0, 360.0);
    let (_, counts) = trim_longitudes(&spec.lons, &smooth_counts, 0.0, 360.0);

    if mask.ocean.dim() != ssha.dim() {
        let (expected, found) = (ssha.dim(), mask.ocean.dim());
        return Err(ReferenceError::ShapeMismatch {
            dataset: "fine grid mask".to_string(),
            expected: vec![expected.0, expected.1],
            found: vec![found.0, found.1],
        });
    }
    let land = mask.ocean.mapv(|o| !o);
    mask_where(&mut ssha, &land);
    mask_where(&mut ssha, &counts.mapv(|c| !(c > spec.min_count)));

    let (lats, ssha_mm) = trim_latitudes(&spec.lats, &ssha, spec.lat_limit);
    Ok(FineGrid {
        center: gridded.center,
        lats,
        lons: fine_lons,
        ssha_mm,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array3;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    /// 1° coarse grid over a narrow band, longitudes in -180..180.
    fn gridded(value_m: f64, count: f64) -> GriddedCycle {
        let lats: Vec<f64> = (0..6).map(|i| -2.5 + i as f64).collect();
        let lons: Vec<f64> = (0..360).map(|j| -179.5 + j as f64).collect();
        let shape = (lats.len(), lons.len());
        GriddedCycle {
            center: d(2000, 7, 2),
            lats,
            lons,
            ssha: Array2::from_elem(shape, value_m),
            counts: Array2::from_elem(shape, count),
            wet: Array2::from_elem(shape, true),
            provenance: None,
        }
    }

    fn climatology(seasonal_cm: f64, offset_cm: f64) -> SeasonalClimatology {
        let lats: Vec<f64> = (0..6).map(|i| -2.5 + i as f64).collect();
        let lons: Vec<f64> = (0..360).map(|j| 0.5 + j as f64).collect();
        SeasonalClimatology {
            month_grid: vec![0.25, 0.75],
            seasonal_cm: Array3::from_elem((2, 6, 360), seasonal_cm),
            slope_cm_per_year: Array2::zeros((6, 360)),
            offset_cm: Array2::from_elem((6, 360), offset_cm),
            lats,
            lons,
        }
    }

    fn spec() -> FineGridSpec {
        FineGridSpec {
            lats: arange(-1.875, 2.0, 0.25),
            lons: arange(-9.825, 369.825, 0.25),
            pad_deg: 10.0,
            boxcar: (8, 4),
            min_count: 475.0,
            lat_limit: 1.0,
        }
    }

    #[test]
    fn standard_axes_have_expected_sizes() {
        let spec = FineGridSpec::standard();
        assert_eq!(spec.lats.len(), 720);
        assert_eq!(spec.lons.len(), 1519);
        assert_eq!(spec.mask_shape(), (720, 1440));
        assert!((spec.lons[0] + 9.825).abs() < 1e-12);
    }

    #[test]
    fn uniform_field_loses_climatology_and_converts_to_mm() {
        let spec = spec();
        let mask = FineMask::all_ocean(spec.mask_shape());
        let fine = make_fine_grid(&gridded(0.1, 500.0), &climatology(2.0, 3.0), &mask, &spec)
            .unwrap();
        assert_eq!(fine.lons.len(), 1440);
        assert!((fine.lons[0] - 0.175).abs() < 1e-9);
        assert!(fine.lats.iter().all(|l| l.abs() <= 1.0));
        // 100 mm - (2 cm + 3 cm) * 10.
        for v in fine.ssha_mm.iter() {
            assert!((v - 50.0).abs() < 1e-9, "{v}");
        }
    }

    #[test]
    fn sparse_cycle_is_entirely_missing() {
        let spec = spec();
        let mask = FineMask::all_ocean(spec.mask_shape());
        let fine = make_fine_grid(&gridded(0.1, 475.0), &climatology(0.0, 0.0), &mask, &spec)
            .unwrap();
        assert!(fine.ssha_mm.iter().all(|v| v.is_nan()));
    }

    #[test]
    fn land_mask_is_applied_after_smoothing() {
        let spec = spec();
        let mut mask = FineMask::all_ocean(spec.mask_shape());
        mask.ocean.column_mut(100).fill(false);
        let fine = make_fine_grid(&gridded(0.1, 600.0), &climatology(0.0, 0.0), &mask, &spec)
            .unwrap();
        assert!(fine.ssha_mm.column(100).iter().all(|v| v.is_nan()));
        assert!(fine.ssha_mm.column(101).iter().all(|v| (v - 100.0).abs() < 1e-9));
    }

    #[test]
    fn mask_shape_mismatch_is_reported() {
        let spec = spec();
        let mask = FineMask::all_ocean((3, 3));
        let err = make_fine_grid(&gridded(0.1, 600.0), &climatology(0.0, 0.0), &mask, &spec)
            .unwrap_err();
        assert!(matches!(err, ReferenceError::ShapeMismatch { .. }));
    }

    #[test]
    fn dataset_carries_units_and_summary() {
        let fine = FineGrid {
            center: d(2000, 7, 2),
            lats: vec![0.125],
            lons: vec![0.175, 0.425],
            ssha_mm: Array2::from_elem((1, 2), 12.0),
        };
        let ds = fine.to_dataset(5).unwrap();
        let ssha = ds.var("SSHA").unwrap();
        assert_eq!(ssha.attr("units").and_then(|a| a.as_text()), Some("mm"));
        assert_eq!(ssha.attr("valid_max").and_then(|a| a.as_number()), Some(12.0));
        assert!(ds.coord("time").is_some());
    }
}
