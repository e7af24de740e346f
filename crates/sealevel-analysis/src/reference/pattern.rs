//! Climate-oscillation patterns and their monthly climatology, mapped onto
//! the global ocean grid once at load time.

use ndarray::{Array2, Array3, ArrayView2, Axis};

use sealevel_core::constants::PATTERN_MM_TO_M;
use sealevel_core::errors::ReferenceError;
use sealevel_storage::dataset::Dataset;

use super::{axis, field2, field3, find_index, label, wrap_lon, OceanGrid};

#[derive(Debug, Clone)]
pub struct Pattern {
    pub name: String,
    pub lats: Vec<f64>,
    /// Longitudes wrapped to `[-180, 180)`.
    pub lons: Vec<f64>,
    /// Spatial template in millimeters; `NaN` outside the fit region.
    pub template_mm: Array2<f64>,
    /// Calendar month (1-12) of each climatology slice.
    pub months: Vec<u32>,
    /// `(month, lat, lon)` in millimeters.
    pub climatology_mm: Array3<f64>,
    /// Global grid row of each pattern latitude.
    pub rows: Vec<usize>,
    /// Global grid column of each pattern longitude.
    pub cols: Vec<usize>,
}

impl Pattern {
    /// Map a pattern onto `grid`. Every pattern coordinate must be a grid
    /// cell center.
    pub fn new(
        name: &str,
        lats: Vec<f64>,
        lons: Vec<f64>,
        template_mm: Array2<f64>,
        months: Vec<u32>,
        climatology_mm: Array3<f64>,
        grid: &OceanGrid,
    ) -> Result<Self, ReferenceError> {
        let outside = |lat: f64, lon: f64| ReferenceError::OutsideGrid {
            pattern: name.to_string(),
            lat,
            lon,
        };
        let rows = lats
            .iter()
            .map(|&lat| {
                grid.lat_index(lat)
                    .ok_or_else(|| outside(lat, lons.first().copied().unwrap_or(f64::NAN)))
            })
            .collect::<Result<Vec<_>, _>>()?;
        let lons: Vec<f64> = lons.into_iter().map(wrap_lon).collect();
        let cols = lons
            .iter()
            .map(|&lon| {
                grid.lon_index(lon)
                    .or_else(|| grid.lon_index(lon.rem_euclid(360.0)))
                    .ok_or_else(|| outside(lats.first().copied().unwrap_or(f64::NAN), lon))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let shape = (lats.len(), lons.len());
        for found in [template_mm.dim(), (climatology_mm.dim().1, climatology_mm.dim().2)] {
            if found != shape {
                return Err(ReferenceError::ShapeMismatch {
                    dataset: format!("{name} pattern"),
                    expected: vec![shape.0, shape.1],
                    found: vec![found.0, found.1],
                });
            }
        }

        Ok(Self {
            name: name.to_string(),
            lats,
            lons,
            template_mm,
            months,
            climatology_mm,
            rows,
            cols,
        })
    }

    /// Reads `{name}_pattern` on `Latitude`/`Longitude` and slices the global
    /// monthly climatology `ann_pattern` to the pattern's bounding box.
    pub fn from_datasets(
        name: &str,
        pattern: &Dataset,
        annual: &Dataset,
        grid: &OceanGrid,
    ) -> Result<Self, ReferenceError> {
        let lats = axis(pattern, &["Latitude", "latitude"])?;
        let lons = axis(pattern, &["Longitude", "longitude"])?;
        let template = field2(pattern, &format!("{name}_pattern"))?;

        let ann_lats = axis(annual, &["Latitude", "latitude"])?;
        let ann_lons = axis(annual, &["Longitude", "longitude"])?;
        let months = axis(annual, &["month"])?
            .into_iter()
            .map(|m| calendar_month(annual, m))
            .collect::<Result<Vec<_>, _>>()?;
        let ann = field3(annual, "ann_pattern")?;

        let (Some(&lat0), Some(&lat1), Some(&lon0), Some(&lon1)) =
            (lats.first(), lats.last(), lons.first(), lons.last())
        else {
            return Err(ReferenceError::ShapeMismatch {
                dataset: label(pattern),
                expected: vec![1, 1],
                found: vec![lats.len(), lons.len()],
            });
        };
        let rows = within(&ann_lats, lat0, lat1);
        let cols = within(&ann_lons, lon0, lon1);
        let climatology = ann.select(Axis(1), &rows).select(Axis(2), &cols);

        Self::new(name, lats, lons, template, months, climatology, grid)
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.lats.len(), self.lons.len())
    }

    /// Gather the pattern's cells out of a global-grid field.
    pub fn extract(&self, field: &Array2<f64>) -> Array2<f64> {
        Array2::from_shape_fn(self.shape(), |(i, j)| field[[self.rows[i], self.cols[j]]])
    }

    /// Climatology slice for calendar `month`, in meters.
    pub fn monthly_m(&self, month: u32) -> Option<Array2<f64>> {
        let slot = self.months.iter().position(|&m| m == month)?;
        let slice: ArrayView2<f64> = self.climatology_mm.index_axis(Axis(0), slot);
        Some(slice.mapv(|v| v / PATTERN_MM_TO_M))
    }
}

/// A `month` coordinate value as a calendar month in `1..=12`.
fn calendar_month(ds: &Dataset, value: f64) -> Result<u32, ReferenceError> {
    if value.fract() == 0.0 && (1.0..=12.0).contains(&value) {
        Ok(value as u32)
    } else {
        Err(ReferenceError::InvalidCoordinate {
            dataset: label(ds),
            variable: "month".to_string(),
            value,
            expected: "a calendar month (1-12)",
        })
    }
}

/// Indices of `axis` between `a` and `b` inclusive, in axis order.
fn within(axis: &[f64], a: f64, b: f64) -> Vec<usize> {
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    axis.iter()
        .enumerate()
        .filter(|(_, v)| **v >= lo - 1e-9 && **v <= hi + 1e-9)
        .map(|(i, _)| i)
        .collect()
}
