//! Cell areas and the per-cell linear sea level trend on the ocean grid.

use chrono::NaiveDate;
use ndarray::Array2;

use sealevel_core::constants::TREND_EPOCH;
use sealevel_core::errors::ReferenceError;
use sealevel_core::types::cycle::seconds_since;
use sealevel_storage::dataset::Dataset;

use super::{expect_shape, field2, label, OceanGrid};

#[derive(Debug, Clone)]
pub struct GridGeometry {
    /// Cell area in square meters.
    pub area: Array2<f64>,
    /// Cells whose first-level `maskC` is positive.
    pub ocean: Array2<bool>,
}

impl GridGeometry {
    pub fn from_dataset(ds: &Dataset, grid: &OceanGrid) -> Result<Self, ReferenceError> {
        let area = field2(ds, "area")?;
        let mask = field2(ds, "maskC")?;
        expect_shape(&label(ds), grid.shape(), area.dim())?;
        expect_shape(&label(ds), grid.shape(), mask.dim())?;
        Ok(Self {
            area,
            ocean: mask.mapv(|m| m > 0.0),
        })
    }

    /// Equal-area, all-ocean geometry for synthetic grids.
    pub fn uniform(shape: (usize, usize)) -> Self {
        Self {
            area: Array2::from_elem(shape, 1.0),
            ocean: Array2::from_elem(shape, true),
        }
    }
}

/// `offset + slope * seconds since 1992-10-02`, in meters.
#[derive(Debug, Clone)]
pub struct LinearTrendField {
    pub offset_m: Array2<f64>,
    pub slope_m_per_s: Array2<f64>,
}

impl LinearTrendField {
    pub fn from_dataset(ds: &Dataset, grid: &OceanGrid) -> Result<Self, ReferenceError> {
        let offset_m = field2(ds, "BH_sea_level_offset_meters")?;
        let slope_m_per_s = field2(ds, "BH_sea_level_trend_meters_per_second")?;
        expect_shape(&label(ds), grid.shape(), offset_m.dim())?;
        expect_shape(&label(ds), grid.shape(), slope_m_per_s.dim())?;
        Ok(Self {
            offset_m,
            slope_m_per_s,
        })
    }

    pub fn zero(shape: (usize, usize)) -> Self {
        Self {
            offset_m: Array2::zeros(shape),
            slope_m_per_s: Array2::zeros(shape),
        }
    }

    /// Trend at midnight of `date`; whole days since the epoch.
    pub fn trend_at(&self, date: NaiveDate) -> Array2<f64> {
        let elapsed = seconds_since(date, TREND_EPOCH);
        &self.slope_m_per_s * elapsed + &self.offset_m
    }
}
