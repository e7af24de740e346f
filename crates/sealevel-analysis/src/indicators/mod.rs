//! Per-cycle climate indicators: the coverage gate, land-masked global
//! fields, the area-weighted spatial mean, trend removal and the pattern
//! regressions, plus the three per-cycle artifacts built from them.

pub mod regression;
pub mod spatial;

use chrono::{Datelike, NaiveDate};
use ndarray::Array2;

use sealevel_core::constants::INDICATOR_LAT_LIMIT;
use sealevel_core::errors::{
    FitError, PipelineError, PipelineResult, ReferenceError, SealevelErrorCode, StorageError,
};
use sealevel_core::types::RepeatCycle;
use sealevel_storage::dataset::{Dataset, Variable, VariableEncoding};

use crate::reference::{Pattern, ReferenceData};
use crate::resampler::GriddedCycle;

pub use regression::{least_squares, PatternAnomaly, PatternFit};
pub use spatial::{global_field, mean_count, quality_gate, spatial_mean};

const GRID_DIMS: [&str; 2] = ["latitude", "longitude"];

/// The global fields of one cycle, all in meters on the ocean grid.
#[derive(Debug, Clone, PartialEq)]
pub struct GlobalFields {
    pub ssha: Array2<f64>,
    pub removed_mean: Array2<f64>,
    pub trend: Array2<f64>,
    pub detrended: Array2<f64>,
}

/// One pattern's regional fields and, unless degenerate, its fit.
#[derive(Debug, Clone, PartialEq)]
pub struct PatternProducts {
    pub name: String,
    pub lats: Vec<f64>,
    pub lons: Vec<f64>,
    pub fields: PatternAnomaly,
    pub fit: Option<PatternFit>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CycleIndicators {
    pub center: Option<NaiveDate>,
    pub lats: Vec<f64>,
    pub lons: Vec<f64>,
    pub spatial_mean: f64,
    pub globals: Option<GlobalFields>,
    pub patterns: Vec<PatternProducts>,
}

impl CycleIndicators {
    fn time_seconds(&self) -> Result<f64, StorageError> {
        self.center
            .map(|c| RepeatCycle::new(c).unix_seconds() as f64)
            .ok_or_else(|| StorageError::Codec {
                path: "<memory>".into(),
                message: "indicator record has no cycle center".to_string(),
            })
    }

    /// One-record indicator table: per-pattern indices and offsets plus the
    /// spatial mean, on a length-1 `time` axis.
    pub fn indicator_dataset(&self, level: u8) -> Result<Dataset, StorageError> {
        let mut ds = Dataset::new();
        let encoding = VariableEncoding::data(level);
        for p in &self.patterns {
            let (index, offset, raw_index, raw_offset) = match p.fit {
                Some(fit) => (fit.index, fit.offset, fit.raw_index, fit.raw_offset),
                None => (f64::NAN, f64::NAN, f64::NAN, f64::NAN),
            };
            for (suffix, value) in [
                ("index", index),
                ("offset", offset),
                ("raw_index", raw_index),
                ("raw_offset", raw_offset),
            ] {
                ds.add_var(
                    &format!("{}_{suffix}", p.name),
                    Variable::new(&[], vec![value], encoding),
                )?;
            }
        }
        ds.add_var(
            "spatial_mean",
            Variable::new(&[], vec![self.spatial_mean], encoding),
        )?
        .set_attr("comment", "Global SSHA spatial mean")
        .set_attr("units", "m");
        stamp_time(ds, self.time_seconds()?)
    }

    /// Land-masked global SSHA, its mean-removed and detrended variants and
    /// the trend itself.
    pub fn globals_dataset(&self, level: u8) -> Result<Dataset, StorageError> {
        let globals = self.globals.as_ref().ok_or_else(|| StorageError::Codec {
            path: "<memory>".into(),
            message: "indicator record has no global fields".to_string(),
        })?;
        let mut ds = grid_axes(self.lats.clone(), self.lons.clone())?;
        let encoding = VariableEncoding::data(level);
        for (name, field, comment) in [
            ("SSHA_GLOBAL", &globals.ssha, Some("Global SSHA land masked")),
            (
                "SSHA_GLOBAL_removed_global_spatial_mean",
                &globals.removed_mean,
                Some("Global SSHA with global spatial mean removed"),
            ),
            ("SSHA_GLOBAL_linear_trend", &globals.trend, None),
            (
                "SSHA_GLOBAL_removed_linear_trend",
                &globals.detrended,
                Some("Global SSHA with linear trend removed"),
            ),
        ] {
            let var = ds.add_var(
                name,
                Variable::new(&GRID_DIMS, field.iter().copied().collect(), encoding),
            )?;
            var.set_attr("units", "m");
            if let Some(comment) = comment {
                var.set_attr("comment", comment);
            }
        }
        stamp_time(ds, self.time_seconds()?)
    }

    /// A pattern's region of the detrended field and its deseasonalized
    /// anomaly.
    pub fn pattern_dataset(&self, p: &PatternProducts, level: u8) -> Result<Dataset, StorageError> {
        let mut ds = grid_axes(p.lats.clone(), p.lons.clone())?;
        let encoding = VariableEncoding::data(level);
        ds.add_var(
            &format!("SSHA_{}_removed_global_linear_trend", p.name),
            Variable::new(&GRID_DIMS, p.fields.detrended.iter().copied().collect(), encoding),
        )?
        .set_attr("units", "m");
        ds.add_var(
            &format!("SSHA_{}_removed_global_linear_trend_and_seasonal_cycle", p.name),
            Variable::new(&GRID_DIMS, p.fields.anomaly.iter().copied().collect(), encoding),
        )?
        .set_attr("units", "m");
        stamp_time(ds, self.time_seconds()?)
    }
}

fn grid_axes(lats: Vec<f64>, lons: Vec<f64>) -> Result<Dataset, StorageError> {
    let mut ds = Dataset::new();
    ds.add_axis("latitude", lats, VariableEncoding::indicator_coordinate())?
        .set_attr("standard_name", "latitude")
        .set_attr("units", "degrees_north");
    ds.add_axis("longitude", lons, VariableEncoding::indicator_coordinate())?
        .set_attr("standard_name", "longitude")
        .set_attr("units", "degrees_east");
    Ok(ds)
}

fn stamp_time(ds: Dataset, seconds: f64) -> Result<Dataset, StorageError> {
    let mut ds = ds.expand_time(seconds, VariableEncoding::time())?;
    if let Some(time) = ds.coords.get_mut("time") {
        time.set_attr("standard_name", "time")
            .set_attr("units", "seconds since 1970-01-01");
    }
    Ok(ds)
}

/// Computes indicator records against one set of reference data.
pub struct IndicatorEngine<'a> {
    refs: &'a ReferenceData,
}

impl<'a> IndicatorEngine<'a> {
    pub fn new(refs: &'a ReferenceData) -> Self {
        Self { refs }
    }

    /// Gate, detrend and regress one gridded cycle. A cycle failing the
    /// coverage gate is an error; a degenerate pattern fit is collected and
    /// leaves that pattern's indices missing.
    pub fn compute(
        &self,
        gridded: &GriddedCycle,
    ) -> Result<PipelineResult<CycleIndicators>, PipelineError> {
        let refs = self.refs;
        let shape = refs.grid.shape();
        if gridded.ssha.dim() != shape {
            let (rows, cols) = gridded.ssha.dim();
            return Err(ReferenceError::ShapeMismatch {
                dataset: format!("gridded cycle {}", gridded.center),
                expected: vec![shape.0, shape.1],
                found: vec![rows, cols],
            }
            .into());
        }

        let mean_count = quality_gate(gridded)?;
        tracing::debug!(center = %gridded.center, mean_count, "coverage gate passed");

        let ssha = global_field(&gridded.ssha, &refs.geometry);
        let mean = spatial_mean(&ssha, &refs.geometry.area, &refs.grid, INDICATOR_LAT_LIMIT);
        let removed_mean = ssha.mapv(|v| v - mean);
        let trend = refs.trend.trend_at(gridded.center);
        let detrended = &ssha - &trend;

        let month = gridded.center.month();
        let mut result = PipelineResult::new(CycleIndicators {
            center: Some(gridded.center),
            lats: refs.grid.lats.clone(),
            lons: refs.grid.lons.clone(),
            spatial_mean: mean,
            globals: None,
            patterns: Vec::with_capacity(refs.patterns.len()),
        });
        for pattern in &refs.patterns {
            let (products, failure) = self.regress(pattern, &detrended, month, gridded.center);
            result.data.patterns.push(products);
            if let Some(e) = failure {
                result.add_error(e.into());
            }
        }
        result.data.globals = Some(GlobalFields {
            ssha,
            removed_mean,
            trend,
            detrended,
        });
        Ok(result)
    }

    fn regress(
        &self,
        pattern: &Pattern,
        detrended: &Array2<f64>,
        month: u32,
        center: NaiveDate,
    ) -> (PatternProducts, Option<FitError>) {
        let fields = PatternAnomaly::new(pattern, detrended, month);
        let fit = fields.fit(pattern);
        let mut products = PatternProducts {
            name: pattern.name.clone(),
            lats: pattern.lats.clone(),
            lons: pattern.lons.clone(),
            fields,
            fit: None,
        };
        match fit {
            Ok(fit) => {
                tracing::debug!(
                    pattern = %pattern.name,
                    %center,
                    index = fit.index,
                    raw_index = fit.raw_index,
                    cells = fit.cells,
                    "pattern fitted"
                );
                products.fit = Some(fit);
                (products, None)
            }
            Err(e) => {
                tracing::warn!(
                    pattern = %pattern.name,
                    %center,
                    error_code = e.error_code(),
                    error = %e,
                    "pattern fit degenerate, index left missing"
                );
                (products, Some(e))
            }
        }
    }
}
