//! Per-variable storage encodings.

use serde::{Deserialize, Serialize};

use sealevel_core::constants::{FILL_VALUE_F64, INDICATOR_COORD_COMPRESSION_LEVEL};

/// Storage precision of a variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DType {
    F32,
    F64,
}

/// How a variable is written: packed precision, fill sentinel, compression.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VariableEncoding {
    pub dtype: DType,
    /// Sentinel written in place of missing values. `None` on coordinate axes.
    pub fill_value: Option<f64>,
    /// Deflate level, `None` for uncompressed.
    pub compression_level: Option<u8>,
    pub shuffle: bool,
}

impl VariableEncoding {
    /// Data variables: `float32`, zlib at `level`, shuffle, default `f8` fill.
    pub fn data(level: u8) -> Self {
        Self {
            dtype: DType::F32,
            fill_value: Some(FILL_VALUE_F64),
            compression_level: Some(level),
            shuffle: true,
        }
    }

    /// Latitude/longitude axes: `float32`, no fill value.
    pub fn coordinate() -> Self {
        Self {
            dtype: DType::F32,
            fill_value: None,
            compression_level: None,
            shuffle: false,
        }
    }

    /// Time axes keep full precision.
    pub fn time() -> Self {
        Self {
            dtype: DType::F64,
            fill_value: None,
            compression_level: None,
            shuffle: false,
        }
    }

    /// Coordinates of the per-cycle indicator products.
    pub fn indicator_coordinate() -> Self {
        Self {
            dtype: DType::F32,
            fill_value: None,
            compression_level: Some(INDICATOR_COORD_COMPRESSION_LEVEL),
            shuffle: false,
        }
    }

    /// Round `value` to the storage precision.
    pub fn quantize(&self, value: f64) -> f64 {
        match self.dtype {
            DType::F32 => value as f32 as f64,
            DType::F64 => value,
        }
    }

    /// Stored representation of `value`: missing values become the fill
    /// sentinel, or `None` when the variable has no fill value.
    pub fn encode(&self, value: f64) -> Option<f64> {
        if value.is_nan() {
            self.fill_value.map(|f| self.quantize(f))
        } else {
            Some(self.quantize(value))
        }
    }

    /// In-memory value of a stored element.
    pub fn decode(&self, stored: Option<f64>) -> f64 {
        match (stored, self.fill_value) {
            (None, _) => f64::NAN,
            (Some(v), Some(fill)) if self.is_fill(v, fill) => f64::NAN,
            (Some(v), _) => v,
        }
    }

    fn is_fill(&self, v: f64, fill: f64) -> bool {
        v == fill || v == self.quantize(fill)
    }
}
