//! Boxcar smoother properties.

use ndarray::Array2;
use proptest::prelude::*;
use sealevel_analysis::fine_grid::boxcar::boxcar_mean;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn constant_field_is_unchanged(
        rows in 1usize..12,
        cols in 1usize..12,
        wr in 1usize..6,
        wc in 1usize..6,
        value in -500.0f64..500.0,
    ) {
        let field = Array2::from_elem((rows, cols), value);
        let smoothed = boxcar_mean(&field, (wr, wc));
        for v in smoothed.iter() {
            prop_assert!((v - value).abs() < 1e-9);
        }
    }

    #[test]
    fn output_stays_within_input_range(
        values in proptest::collection::vec(prop_oneof![Just(f64::NAN), -100.0f64..100.0], 30),
        wr in 1usize..5,
        wc in 1usize..5,
    ) {
        let field = Array2::from_shape_vec((5, 6), values).unwrap();
        let finite: Vec<f64> = field.iter().copied().filter(|v| v.is_finite()).collect();
        let smoothed = boxcar_mean(&field, (wr, wc));
        if finite.is_empty() {
            prop_assert!(smoothed.iter().all(|v| v.is_nan()));
        } else {
            let lo = finite.iter().copied().fold(f64::INFINITY, f64::min);
            let hi = finite.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            for v in smoothed.iter().filter(|v| v.is_finite()) {
                prop_assert!(*v >= lo - 1e-9 && *v <= hi + 1e-9);
            }
        }
    }
}
