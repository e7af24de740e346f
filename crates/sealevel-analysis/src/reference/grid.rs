//! The fixed global ocean grid and its wet/dry masks.

use ndarray::Array2;

use sealevel_core::errors::ReferenceError;
use sealevel_storage::dataset::Dataset;

use super::{axis, expect_shape, field2, find_index, label};

/// Target grid of the resampler: cell-center axes plus the static wet mask.
#[derive(Debug, Clone, PartialEq)]
pub struct OceanGrid {
    pub lats: Vec<f64>,
    pub lons: Vec<f64>,
    pub wet: Array2<bool>,
}

impl OceanGrid {
    pub fn new(lats: Vec<f64>, lons: Vec<f64>, wet: Array2<bool>) -> Result<Self, ReferenceError> {
        expect_shape("ocean grid", (lats.len(), lons.len()), wet.dim())?;
        Ok(Self { lats, lons, wet })
    }

    /// Every cell wet. Used by synthetic runs.
    pub fn all_wet(lats: Vec<f64>, lons: Vec<f64>) -> Self {
        let wet = Array2::from_elem((lats.len(), lons.len()), true);
        Self { lats, lons, wet }
    }

    /// `latitude`/`longitude` axes and `maskC`; a cell is wet where the
    /// first depth level of `maskC` is positive.
    pub fn from_dataset(ds: &Dataset) -> Result<Self, ReferenceError> {
        let lats = axis(ds, &["latitude", "Latitude", "lat"])?;
        let lons = axis(ds, &["longitude", "Longitude", "lon"])?;
        let mask = field2(ds, "maskC")?;
        expect_shape(&label(ds), (lats.len(), lons.len()), mask.dim())?;
        Ok(Self {
            lats,
            lons,
            wet: mask.mapv(|m| m > 0.0),
        })
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.lats.len(), self.lons.len())
    }

    pub fn wet_count(&self) -> usize {
        self.wet.iter().filter(|w| **w).count()
    }

    /// Rows whose latitude lies within `[-limit, limit]`.
    pub fn band_rows(&self, limit: f64) -> Vec<usize> {
        self.lats
            .iter()
            .enumerate()
            .filter(|(_, lat)| lat.abs() <= limit)
            .map(|(i, _)| i)
            .collect()
    }

    pub fn lat_index(&self, lat: f64) -> Option<usize> {
        find_index(&self.lats, lat)
    }

    pub fn lon_index(&self, lon: f64) -> Option<usize> {
        find_index(&self.lons, lon)
    }

    /// The wet mask as 1/0 values, row-major.
    pub fn mask_values(&self) -> Vec<f64> {
        self.wet.iter().map(|&w| if w { 1.0 } else { 0.0 }).collect()
    }
}

/// Land/ocean mask of the fine grid, applied positionally to the trimmed
/// `[0, 360)` fine field.
#[derive(Debug, Clone, PartialEq)]
pub struct FineMask {
    pub ocean: Array2<bool>,
}

impl FineMask {
    pub fn from_dataset(ds: &Dataset) -> Result<Self, ReferenceError> {
        let mask = field2(ds, "maskC")?;
        Ok(Self {
            ocean: mask.mapv(|m| m != 0.0),
        })
    }

    pub fn all_ocean(shape: (usize, usize)) -> Self {
        Self {
            ocean: Array2::from_elem(shape, true),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sealevel_storage::dataset::{Variable, VariableEncoding};

    fn mask_dataset(with_depth: bool) -> Dataset {
        let mut ds = Dataset::new();
        ds.add_axis("latitude", vec![-60.0, 0.0, 70.0], VariableEncoding::coordinate())
            .unwrap();
        ds.add_axis("longitude", vec![10.0, 20.0], VariableEncoding::coordinate())
            .unwrap();
        let values = vec![1.0, 0.0, 1.0, 1.0, 0.0, 0.0];
        let var = if with_depth {
            ds.add_dim("Z", 1).unwrap();
            Variable::new(&["Z", "latitude", "longitude"], values, VariableEncoding::data(5))
        } else {
            Variable::new(&["latitude", "longitude"], values, VariableEncoding::data(5))
        };
        ds.add_var("maskC", var).unwrap();
        ds
    }

    #[test]
    fn wet_mask_drops_leading_depth_axis() {
        for with_depth in [true, false] {
            let grid = OceanGrid::from_dataset(&mask_dataset(with_depth)).unwrap();
            assert_eq!(grid.shape(), (3, 2));
            assert_eq!(grid.wet_count(), 3);
            assert!(grid.wet[[0, 0]]);
            assert!(!grid.wet[[0, 1]]);
        }
    }

    #[test]
    fn band_rows_is_inclusive() {
        let grid = OceanGrid::from_dataset(&mask_dataset(true)).unwrap();
        assert_eq!(grid.band_rows(66.0), vec![0, 1]);
        assert_eq!(grid.band_rows(60.0), vec![0, 1]);
        assert_eq!(grid.band_rows(90.0), vec![0, 1, 2]);
    }

    #[test]
    fn mismatched_mask_is_rejected() {
        let wet = Array2::from_elem((2, 2), true);
        assert!(OceanGrid::new(vec![0.0], vec![0.0, 1.0], wet).is_err());
    }
}
