//! Single-predictor least squares of a field against a pattern template.

use ndarray::{Array2, Zip};

use sealevel_core::constants::PATTERN_MM_TO_M;
use sealevel_core::errors::FitError;

use crate::reference::Pattern;

/// Indices fitted against the deseasonalized anomaly (`index`) and against
/// the detrended field itself (`raw_index`). Offsets are always zero: the
/// model has no intercept.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PatternFit {
    pub index: f64,
    pub offset: f64,
    pub raw_index: f64,
    pub raw_offset: f64,
    /// Cells under the fit mask.
    pub cells: usize,
}

/// `(XᵗX)⁻¹ Xᵗy` for a single column `x`. `None` when `XᵗX` is singular.
pub fn least_squares(x: &[f64], y: &[f64]) -> Option<f64> {
    let xtx: f64 = x.iter().map(|v| v * v).sum();
    if xtx == 0.0 || !xtx.is_finite() {
        return None;
    }
    let xty: f64 = x.iter().zip(y).map(|(a, b)| a * b).sum();
    Some(xty / xtx)
}

/// The pattern region of a detrended global field and its anomaly against
/// the pattern's monthly climatology.
#[derive(Debug, Clone, PartialEq)]
pub struct PatternAnomaly {
    /// Meters.
    pub detrended: Array2<f64>,
    /// Meters; missing wherever the template is.
    pub anomaly: Array2<f64>,
}

impl PatternAnomaly {
    /// A missing climatology month leaves the anomaly entirely missing.
    pub fn new(pattern: &Pattern, detrended_global: &Array2<f64>, month: u32) -> Self {
        let detrended = pattern.extract(detrended_global);
        let climatology = pattern
            .monthly_m(month)
            .unwrap_or_else(|| Array2::from_elem(detrended.dim(), f64::NAN));
        let mut anomaly = &detrended - &climatology;
        Zip::from(&mut anomaly)
            .and(&pattern.template_mm)
            .for_each(|a, &t| {
                if t.is_nan() {
                    *a = f64::NAN;
                }
            });
        Self { detrended, anomaly }
    }

    /// Fit the template over the cells where the anomaly is finite.
    pub fn fit(&self, pattern: &Pattern) -> Result<PatternFit, FitError> {
        let mut x = Vec::new();
        let mut y = Vec::new();
        let mut raw = Vec::new();
        Zip::from(&self.anomaly)
            .and(&self.detrended)
            .and(&pattern.template_mm)
            .for_each(|&a, &d, &t| {
                if a.is_finite() {
                    x.push(t / PATTERN_MM_TO_M);
                    y.push(a);
                    raw.push(d);
                }
            });

        let degenerate = || FitError::Degenerate {
            pattern: pattern.name.clone(),
            cells: x.len(),
        };
        let index = least_squares(&x, &y).ok_or_else(degenerate)?;
        let raw_index = least_squares(&x, &raw).ok_or_else(degenerate)?;
        Ok(PatternFit {
            index,
            offset: 0.0,
            raw_index,
            raw_offset: 0.0,
            cells: x.len(),
        })
    }
}
