//! Coverage gate, land-masked global field and area-weighted spatial mean.

use ndarray::{Array2, Zip};

use sealevel_core::constants::{EXPECTED_CELL_COUNT, INDICATOR_LAT_LIMIT, QUALITY_GATE_FRACTION};
use sealevel_core::errors::CycleError;

use crate::reference::{GridGeometry, OceanGrid};
use crate::resampler::GriddedCycle;

/// Mean of the finite counts in rows within `±lat_limit`; `NaN` if none.
pub fn mean_count(gridded: &GriddedCycle, lat_limit: f64) -> f64 {
    let (mut sum, mut n) = (0.0, 0usize);
    for (i, lat) in gridded.lats.iter().enumerate() {
        if lat.abs() > lat_limit {
            continue;
        }
        for &c in gridded.counts.row(i) {
            if c.is_finite() {
                sum += c;
                n += 1;
            }
        }
    }
    if n == 0 {
        f64::NAN
    } else {
        sum / n as f64
    }
}

/// Reject cycles whose mean count within ±66° is not above 90% of the
/// expected per-cell count. Returns the mean count on success.
pub fn quality_gate(gridded: &GriddedCycle) -> Result<f64, CycleError> {
    let mean = mean_count(gridded, INDICATOR_LAT_LIMIT);
    let required = QUALITY_GATE_FRACTION * EXPECTED_CELL_COUNT;
    if mean > required {
        Ok(mean)
    } else {
        Err(CycleError::QualityGate {
            center: gridded.center,
            mean_count: mean,
            required,
        })
    }
}

/// SSHA on geometry ocean cells; land and exact zeros are missing.
pub fn global_field(ssha: &Array2<f64>, geometry: &GridGeometry) -> Array2<f64> {
    let mut out = ssha.clone();
    Zip::from(&mut out).and(&geometry.ocean).for_each(|v, &ocean| {
        if !ocean || *v == 0.0 {
            *v = f64::NAN;
        }
    });
    out
}

/// Area-weighted mean of the finite cells of `field` within `±lat_limit`.
pub fn spatial_mean(field: &Array2<f64>, area: &Array2<f64>, grid: &OceanGrid, lat_limit: f64) -> f64 {
    let (mut weighted, mut total) = (0.0, 0.0);
    for i in grid.band_rows(lat_limit) {
        for (v, a) in field.row(i).iter().zip(area.row(i)) {
            if v.is_finite() && a.is_finite() {
                weighted += v * a;
                total += a;
            }
        }
    }
    if total > 0.0 {
        weighted / total
    } else {
        f64::NAN
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use ndarray::array;

    fn cycle(counts: Array2<f64>) -> GriddedCycle {
        let shape = counts.dim();
        GriddedCycle {
            center: NaiveDate::from_ymd_opt(2001, 1, 1).unwrap(),
            lats: vec![-70.0, 0.0, 60.0],
            lons: vec![0.0, 1.0],
            ssha: Array2::zeros(shape),
            counts,
            wet: Array2::from_elem(shape, true),
            provenance: None,
        }
    }

    #[test]
    fn gate_ignores_polar_rows_and_missing_cells() {
        let passing = cycle(array![[0.0, 0.0], [460.0, f64::NAN], [452.0, 450.0]]);
        let mean = quality_gate(&passing).unwrap();
        assert!((mean - 454.0).abs() < 1e-12);

        let failing = cycle(array![[900.0, 900.0], [450.0, 450.0], [450.0, 450.0]]);
        assert!(matches!(quality_gate(&failing), Err(CycleError::QualityGate { .. })));
    }

    #[test]
    fn gate_fails_on_all_missing_band() {
        let empty = cycle(Array2::from_elem((3, 2), f64::NAN));
        match quality_gate(&empty) {
            Err(CycleError::QualityGate { mean_count, .. }) => assert!(mean_count.is_nan()),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn global_field_masks_land_and_exact_zero() {
        let geometry = GridGeometry {
            area: Array2::from_elem((1, 3), 1.0),
            ocean: array![[true, false, true]],
        };
        let out = global_field(&array![[0.2, 0.3, 0.0]], &geometry);
        assert_eq!(out[[0, 0]], 0.2);
        assert!(out[[0, 1]].is_nan());
        assert!(out[[0, 2]].is_nan());
    }

    #[test]
    fn spatial_mean_weights_by_area_over_finite_cells() {
        let grid = OceanGrid::all_wet(vec![-80.0, 10.0], vec![0.0, 1.0, 2.0]);
        let field = array![[100.0, 100.0, 100.0], [1.0, 4.0, f64::NAN]];
        let area = array![[1.0, 1.0, 1.0], [3.0, 1.0, 5.0]];
        let mean = spatial_mean(&field, &area, &grid, 66.0);
        assert!((mean - 7.0 / 4.0).abs() < 1e-12);
        let none = Array2::from_elem((2, 3), f64::NAN);
        assert!(spatial_mean(&none, &area, &grid, 66.0).is_nan());
    }
}
