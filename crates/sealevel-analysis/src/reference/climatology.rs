//! Seasonal cycle and long-term trend fields removed from the fine-grid
//! product. Stored in centimeters.

use ndarray::{Array2, Array3, Axis};

use sealevel_core::errors::ReferenceError;
use sealevel_storage::dataset::Dataset;

use super::{axis, field2, field3, label};

#[derive(Debug, Clone)]
pub struct SeasonalClimatology {
    pub lats: Vec<f64>,
    /// Longitudes in `[0, 360)`, ascending.
    pub lons: Vec<f64>,
    /// Fraction-of-year position of each seasonal slice.
    pub month_grid: Vec<f64>,
    /// `(month, lat, lon)`.
    pub seasonal_cm: Array3<f64>,
    pub slope_cm_per_year: Array2<f64>,
    pub offset_cm: Array2<f64>,
}

impl SeasonalClimatology {
    /// Reads `Seasonal_SSH`, `SSH_Slope` and `SSH_Offset`, re-ordering the
    /// longitude axis into ascending `[0, 360)`.
    pub fn from_dataset(ds: &Dataset) -> Result<Self, ReferenceError> {
        let lats = axis(ds, &["Latitude", "latitude"])?;
        let raw_lons = axis(ds, &["Longitude", "longitude"])?;
        let month_grid = axis(ds, &["Month_grid"])?;
        let seasonal = field3(ds, "Seasonal_SSH")?;
        let slope = field2(ds, "SSH_Slope")?;
        let offset = field2(ds, "SSH_Offset")?;

        let expected = (month_grid.len(), lats.len(), raw_lons.len());
        if seasonal.dim() != expected {
            let (a, b, c) = seasonal.dim();
            return Err(ReferenceError::ShapeMismatch {
                dataset: label(ds),
                expected: vec![expected.0, expected.1, expected.2],
                found: vec![a, b, c],
            });
        }

        let mut order: Vec<usize> = (0..raw_lons.len()).collect();
        let wrapped: Vec<f64> = raw_lons.iter().map(|l| l.rem_euclid(360.0)).collect();
        order.sort_by(|&a, &b| wrapped[a].total_cmp(&wrapped[b]));
        let lons = order.iter().map(|&i| wrapped[i]).collect();

        Ok(Self {
            lats,
            lons,
            month_grid,
            seasonal_cm: seasonal.select(Axis(2), &order),
            slope_cm_per_year: slope.select(Axis(1), &order),
            offset_cm: offset.select(Axis(1), &order),
        })
    }

    /// Seasonal field at `year_fraction`, linearly interpolated along a
    /// month axis padded with the last slice (shifted back one year) in
    /// front and the first slice (shifted forward one year) behind.
    /// Positions outside the padded axis give an all-missing field.
    pub fn seasonal_at(&self, year_fraction: f64) -> Array2<f64> {
        let (months, rows, cols) = self.seasonal_cm.dim();
        let missing = Array2::from_elem((rows, cols), f64::NAN);
        if months == 0 {
            return missing;
        }

        // Padded positions index into the real slices modulo `months`.
        let mut knots = Vec::with_capacity(months + 2);
        knots.push((self.month_grid[months - 1] - 1.0, months - 1));
        knots.extend(self.month_grid.iter().copied().zip(0..months));
        knots.push((self.month_grid[0] + 1.0, 0));

        for pair in knots.windows(2) {
            let ((x0, i0), (x1, i1)) = (pair[0], pair[1]);
            if year_fraction < x0 || year_fraction > x1 {
                continue;
            }
            let t = if x1 > x0 {
                (year_fraction - x0) / (x1 - x0)
            } else {
                0.0
            };
            let a = self.seasonal_cm.index_axis(Axis(0), i0);
            let b = self.seasonal_cm.index_axis(Axis(0), i1);
            let mut out = &a * (1.0 - t);
            out.scaled_add(t, &b);
            return out;
        }
        missing
    }

    /// `decimal_year * slope + offset`, in centimeters.
    pub fn trend_at(&self, decimal_year: f64) -> Array2<f64> {
        &self.slope_cm_per_year * decimal_year + &self.offset_cm
    }
}
