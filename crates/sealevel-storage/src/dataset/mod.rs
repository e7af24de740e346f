//! Self-describing multi-dimensional array container.
//!
//! A `Dataset` holds named dimensions, coordinate variables, data variables
//! and global attributes. Values are kept as `f64` in memory with `NaN`
//! marking missing data; each variable's `VariableEncoding` decides how it is
//! stored on disk.

pub mod concat;
pub mod encoding;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use sealevel_core::errors::StorageError;

pub use concat::concat_time;
pub use encoding::{DType, VariableEncoding};

/// Attribute value attached to a dataset or a variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    Number(f64),
    Numbers(Vec<f64>),
    Text(String),
}

impl AttrValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<f64> for AttrValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<Vec<f64>> for AttrValue {
    fn from(value: Vec<f64>) -> Self {
        Self::Numbers(value)
    }
}

/// A named dimension and its length.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimension {
    pub name: String,
    pub len: usize,
}

/// One array with its dimension names, attributes and storage encoding.
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub dims: Vec<String>,
    /// Row-major values; `NaN` is missing.
    pub values: Vec<f64>,
    pub attrs: BTreeMap<String, AttrValue>,
    pub encoding: VariableEncoding,
}

impl Variable {
    pub fn new(dims: &[&str], values: Vec<f64>, encoding: VariableEncoding) -> Self {
        Self {
            dims: dims.iter().map(|d| d.to_string()).collect(),
            values,
            attrs: BTreeMap::new(),
            encoding,
        }
    }

    pub fn set_attr(&mut self, name: &str, value: impl Into<AttrValue>) -> &mut Self {
        self.attrs.insert(name.to_string(), value.into());
        self
    }

    pub fn attr(&self, name: &str) -> Option<&AttrValue> {
        self.attrs.get(name)
    }

    /// The single value of a scalar (or length-1) variable.
    pub fn scalar(&self) -> Option<f64> {
        match self.values.as_slice() {
            [v] => Some(*v),
            _ => None,
        }
    }

    /// Minimum and maximum over finite values, if any.
    pub fn finite_range(&self) -> Option<(f64, f64)> {
        self.values
            .iter()
            .copied()
            .filter(|v| v.is_finite())
            .fold(None, |acc, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }
}

/// Dimensions, coordinates, data variables and global attributes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    pub dims: Vec<Dimension>,
    pub coords: BTreeMap<String, Variable>,
    pub data_vars: BTreeMap<String, Variable>,
    pub attrs: BTreeMap<String, AttrValue>,
    /// File the dataset was read from, for error messages.
    pub source: Option<PathBuf>,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    fn origin(&self) -> PathBuf {
        self.source
            .clone()
            .unwrap_or_else(|| PathBuf::from("<memory>"))
    }

    fn shape_error(&self, message: String) -> StorageError {
        StorageError::Codec {
            path: self.origin(),
            message,
        }
    }

    /// Declare a dimension. Re-declaring with the same length is a no-op.
    pub fn add_dim(&mut self, name: &str, len: usize) -> Result<(), StorageError> {
        match self.dim_len(name) {
            Some(existing) if existing == len => Ok(()),
            Some(existing) => Err(self.shape_error(format!(
                "dimension {name} already has length {existing}, not {len}"
            ))),
            None => {
                self.dims.push(Dimension {
                    name: name.to_string(),
                    len,
                });
                Ok(())
            }
        }
    }

    pub fn dim_len(&self, name: &str) -> Option<usize> {
        self.dims.iter().find(|d| d.name == name).map(|d| d.len)
    }

    /// Lengths of `dims`, which must all be declared.
    pub fn shape(&self, dims: &[String]) -> Result<Vec<usize>, StorageError> {
        dims.iter()
            .map(|d| {
                self.dim_len(d)
                    .ok_or_else(|| self.shape_error(format!("undeclared dimension {d}")))
            })
            .collect()
    }

    fn check(&self, name: &str, variable: &Variable) -> Result<(), StorageError> {
        let expected: usize = self.shape(&variable.dims)?.iter().product();
        if expected != variable.values.len() {
            return Err(self.shape_error(format!(
                "variable {name} has {} values, dimensions {:?} need {expected}",
                variable.values.len(),
                variable.dims
            )));
        }
        Ok(())
    }

    /// Add a coordinate variable. Its dimensions must already be declared.
    pub fn add_coord(
        &mut self,
        name: &str,
        variable: Variable,
    ) -> Result<&mut Variable, StorageError> {
        self.check(name, &variable)?;
        self.coords.remove(name);
        Ok(self.coords.entry(name.to_string()).or_insert(variable))
    }

    /// Declare a one-dimensional axis and its coordinate in one step.
    pub fn add_axis(
        &mut self,
        name: &str,
        values: Vec<f64>,
        encoding: VariableEncoding,
    ) -> Result<&mut Variable, StorageError> {
        self.add_dim(name, values.len())?;
        self.add_coord(name, Variable::new(&[name], values, encoding))
    }

    /// Add a data variable. Its dimensions must already be declared.
    pub fn add_var(&mut self, name: &str, variable: Variable) -> Result<&mut Variable, StorageError> {
        self.check(name, &variable)?;
        self.data_vars.remove(name);
        Ok(self.data_vars.entry(name.to_string()).or_insert(variable))
    }

    pub fn set_attr(&mut self, name: &str, value: impl Into<AttrValue>) {
        self.attrs.insert(name.to_string(), value.into());
    }

    pub fn attr(&self, name: &str) -> Option<&AttrValue> {
        self.attrs.get(name)
    }

    pub fn var(&self, name: &str) -> Option<&Variable> {
        self.data_vars.get(name)
    }

    pub fn coord(&self, name: &str) -> Option<&Variable> {
        self.coords.get(name)
    }

    /// Look a name up among data variables, then coordinates.
    pub fn get(&self, name: &str) -> Option<&Variable> {
        self.var(name).or_else(|| self.coord(name))
    }

    /// Like [`Dataset::get`] but a missing name is an error.
    pub fn require(&self, name: &str) -> Result<&Variable, StorageError> {
        self.get(name).ok_or_else(|| StorageError::MissingVariable {
            path: self.origin(),
            variable: name.to_string(),
        })
    }

    /// Prepend a length-1 `time` dimension to every data variable and attach
    /// the `time` coordinate, so per-cycle records can be concatenated.
    pub fn expand_time(
        mut self,
        time: f64,
        encoding: VariableEncoding,
    ) -> Result<Self, StorageError> {
        if self.dim_len("time").is_some() {
            return Err(self.shape_error("dataset already has a time dimension".to_string()));
        }
        // A scalar time coordinate is replaced by the new axis.
        let time_attrs = self.coords.remove("time").map(|c| c.attrs).unwrap_or_default();
        self.dims.insert(
            0,
            Dimension {
                name: "time".to_string(),
                len: 1,
            },
        );
        for variable in self.data_vars.values_mut() {
            variable.dims.insert(0, "time".to_string());
        }
        let mut coord = Variable::new(&["time"], vec![time], encoding);
        coord.attrs = time_attrs;
        self.coords.insert("time".to_string(), coord);
        Ok(self)
    }

    /// Attach the path the dataset was read from.
    pub fn with_source(mut self, path: &Path) -> Self {
        self.source = Some(path.to_path_buf());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> Dataset {
        let mut ds = Dataset::new();
        ds.add_axis("latitude", vec![-0.25, 0.25], VariableEncoding::coordinate())
            .unwrap();
        ds.add_axis("longitude", vec![0.25, 0.75, 1.25], VariableEncoding::coordinate())
            .unwrap();
        ds
    }

    #[test]
    fn shape_mismatch_is_rejected() {
        let mut ds = grid();
        let err = ds
            .add_var(
                "SSHA",
                Variable::new(&["latitude", "longitude"], vec![0.0; 5], VariableEncoding::data(5)),
            )
            .unwrap_err();
        assert!(err.to_string().contains("need 6"));
    }

    #[test]
    fn undeclared_dimension_is_rejected() {
        let mut ds = grid();
        let result = ds.add_var(
            "x",
            Variable::new(&["depth"], vec![1.0], VariableEncoding::data(5)),
        );
        assert!(result.is_err());
    }

    #[test]
    fn require_reports_missing_variable() {
        let ds = grid().with_source(Path::new("cycle.json.zst"));
        match ds.require("counts") {
            Err(StorageError::MissingVariable { path, variable }) => {
                assert_eq!(path, PathBuf::from("cycle.json.zst"));
                assert_eq!(variable, "counts");
            }
            other => panic!("unexpected: {other:?}"),
        }
        assert!(ds.require("latitude").is_ok());
    }

    #[test]
    fn expand_time_prepends_axis_to_data_vars() {
        let mut ds = grid();
        ds.add_var(
            "SSHA",
            Variable::new(&["latitude", "longitude"], vec![0.1; 6], VariableEncoding::data(5)),
        )
        .unwrap();
        let ds = ds.expand_time(86_400.0, VariableEncoding::time()).unwrap();
        assert_eq!(ds.dims[0].name, "time");
        assert_eq!(ds.var("SSHA").unwrap().dims, vec!["time", "latitude", "longitude"]);
        assert_eq!(ds.coord("time").unwrap().scalar(), Some(86_400.0));
        assert_eq!(ds.coord("latitude").unwrap().dims, vec!["latitude"]);
    }

    #[test]
    fn finite_range_ignores_missing() {
        let v = Variable::new(&["x"], vec![f64::NAN, 2.0, -1.0], VariableEncoding::data(5));
        assert_eq!(v.finite_range(), Some((-1.0, 2.0)));
        let empty = Variable::new(&["x"], vec![f64::NAN], VariableEncoding::data(5));
        assert_eq!(empty.finite_range(), None);
    }
}
