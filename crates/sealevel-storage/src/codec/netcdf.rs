//! NetCDF4 codec, available with the `netcdf` feature.
//!
//! Data variables are written with deflate and shuffle per their encoding;
//! along-track granules are read from their `data` group.

use std::path::Path;

use sealevel_core::config::StorageFormat;
use sealevel_core::errors::StorageError;

use super::{ensure_parent, ArrayCodec};
use crate::dataset::{AttrValue, DType, Dataset, Dimension, Variable, VariableEncoding};

const GRANULE_GROUP: &str = "data";

/// NetCDF4 file codec.
#[derive(Debug, Clone, Default)]
pub struct NetCdfCodec;

impl NetCdfCodec {
    pub fn new() -> Self {
        Self
    }
}

fn nc_err(path: &Path, e: netcdf::Error) -> StorageError {
    StorageError::Codec {
        path: path.to_path_buf(),
        message: e.to_string(),
    }
}

fn put_attr(
    var: &mut netcdf::VariableMut<'_>,
    name: &str,
    value: &AttrValue,
) -> Result<(), netcdf::Error> {
    match value {
        AttrValue::Number(n) => var.put_attribute(name, *n).map(|_| ()),
        AttrValue::Numbers(ns) => var.put_attribute(name, ns.clone()).map(|_| ()),
        AttrValue::Text(s) => var.put_attribute(name, s.as_str()).map(|_| ()),
    }
}

fn write_variable(
    file: &mut netcdf::FileMut,
    name: &str,
    variable: &Variable,
) -> Result<(), netcdf::Error> {
    let dims: Vec<&str> = variable.dims.iter().map(String::as_str).collect();
    let enc = variable.encoding;
    let stored: Vec<f64> = variable
        .values
        .iter()
        .map(|&v| enc.encode(v).unwrap_or(f64::NAN))
        .collect();

    match enc.dtype {
        DType::F32 => {
            let mut var = file.add_variable::<f32>(name, &dims)?;
            if let Some(level) = enc.compression_level {
                var.set_compression(i32::from(level), enc.shuffle)?;
            }
            if let Some(fill) = enc.fill_value {
                var.set_fill_value(fill as f32)?;
            }
            for (k, v) in &variable.attrs {
                put_attr(&mut var, k, v)?;
            }
            let data: Vec<f32> = stored.iter().map(|&v| v as f32).collect();
            var.put_values(&data, ..)?;
        }
        DType::F64 => {
            let mut var = file.add_variable::<f64>(name, &dims)?;
            if let Some(level) = enc.compression_level {
                var.set_compression(i32::from(level), enc.shuffle)?;
            }
            if let Some(fill) = enc.fill_value {
                var.set_fill_value(fill)?;
            }
            for (k, v) in &variable.attrs {
                put_attr(&mut var, k, v)?;
            }
            var.put_values(&stored, ..)?;
        }
    }
    Ok(())
}

fn attr_value(value: netcdf::AttributeValue) -> Option<AttrValue> {
    match value {
        netcdf::AttributeValue::Double(d) => Some(AttrValue::Number(d)),
        netcdf::AttributeValue::Float(f) => Some(AttrValue::Number(f64::from(f))),
        netcdf::AttributeValue::Int(i) => Some(AttrValue::Number(f64::from(i))),
        netcdf::AttributeValue::Short(s) => Some(AttrValue::Number(f64::from(s))),
        netcdf::AttributeValue::Doubles(ds) => Some(AttrValue::Numbers(ds)),
        netcdf::AttributeValue::Floats(fs) => {
            Some(AttrValue::Numbers(fs.into_iter().map(f64::from).collect()))
        }
        netcdf::AttributeValue::Str(s) => Some(AttrValue::Text(s)),
        _ => None,
    }
}

fn read_variable(var: &netcdf::Variable<'_>) -> Result<Variable, netcdf::Error> {
    let dims: Vec<String> = var.dimensions().iter().map(|d| d.name()).collect();
    let mut attrs = std::collections::BTreeMap::new();
    let mut fill = None;
    for attr in var.attributes() {
        let name = attr.name().to_string();
        if let Some(value) = attr.value().ok().and_then(attr_value) {
            if name == "_FillValue" {
                fill = value.as_number();
            } else {
                attrs.insert(name, value);
            }
        }
    }
    let values: Vec<f64> = var.get_values::<f64, _>(..)?;
    let encoding = VariableEncoding {
        dtype: DType::F64,
        fill_value: fill,
        compression_level: None,
        shuffle: false,
    };
    let values = values.into_iter().map(|v| encoding.decode(Some(v))).collect();
    Ok(Variable {
        dims,
        values,
        attrs,
        encoding,
    })
}

fn read_group<'f>(
    dims: impl Iterator<Item = netcdf::Dimension<'f>>,
    variables: impl Iterator<Item = netcdf::Variable<'f>>,
    path: &Path,
) -> Result<Dataset, StorageError> {
    let mut dataset = Dataset::new().with_source(path);
    dataset.dims = dims
        .map(|d| Dimension {
            name: d.name(),
            len: d.len(),
        })
        .collect();
    for var in variables {
        let name = var.name();
        let variable = read_variable(&var).map_err(|e| nc_err(path, e))?;
        let is_axis = variable.dims.len() == 1 && variable.dims[0] == name;
        if is_axis {
            dataset.coords.insert(name, variable);
        } else {
            dataset.data_vars.insert(name, variable);
        }
    }
    Ok(dataset)
}

impl ArrayCodec for NetCdfCodec {
    fn format(&self) -> StorageFormat {
        StorageFormat::Netcdf
    }

    fn write(&self, dataset: &Dataset, path: &Path) -> Result<(), StorageError> {
        ensure_parent(path)?;
        let mut file = netcdf::create(path).map_err(|e| nc_err(path, e))?;
        for dim in &dataset.dims {
            file.add_dimension(&dim.name, dim.len)
                .map_err(|e| nc_err(path, e))?;
        }
        for (name, variable) in dataset.coords.iter().chain(dataset.data_vars.iter()) {
            write_variable(&mut file, name, variable).map_err(|e| nc_err(path, e))?;
        }
        for (name, value) in &dataset.attrs {
            let result = match value {
                AttrValue::Number(n) => file.add_attribute(name, *n).map(|_| ()),
                AttrValue::Numbers(ns) => file.add_attribute(name, ns.clone()).map(|_| ()),
                AttrValue::Text(s) => file.add_attribute(name, s.as_str()).map(|_| ()),
            };
            result.map_err(|e| nc_err(path, e))?;
        }
        Ok(())
    }

    fn read(&self, path: &Path) -> Result<Dataset, StorageError> {
        let file = netcdf::open(path).map_err(|e| nc_err(path, e))?;
        let mut dataset = read_group(file.dimensions(), file.variables(), path)?;
        for attr in file.attributes() {
            if let Some(value) = attr.value().ok().and_then(attr_value) {
                dataset.attrs.insert(attr.name().to_string(), value);
            }
        }
        Ok(dataset)
    }

    fn read_granule(&self, path: &Path) -> Result<Dataset, StorageError> {
        let file = netcdf::open(path).map_err(|e| nc_err(path, e))?;
        let group = file
            .group(GRANULE_GROUP)
            .map_err(|e| nc_err(path, e))?
            .ok_or_else(|| StorageError::MissingVariable {
                path: path.to_path_buf(),
                variable: GRANULE_GROUP.to_string(),
            })?;
        read_group(group.dimensions(), group.variables(), path)
    }
}
