//! Concatenation of per-cycle datasets along `time`.

use sealevel_core::errors::StorageError;

use super::{Dataset, Dimension};

const TIME: &str = "time";

/// Concatenate `parts` along their leading `time` dimension, in the order
/// given. Variables without a time dimension are taken from the first part.
pub fn concat_time(product: &str, parts: &[Dataset]) -> Result<Dataset, StorageError> {
    let fail = |message: String| StorageError::ConcatenationFailed {
        product: product.to_string(),
        message,
    };

    let first = parts
        .first()
        .ok_or_else(|| fail("no per-cycle files to concatenate".to_string()))?;

    let mut total = 0usize;
    for part in parts {
        let len = part
            .dim_len(TIME)
            .ok_or_else(|| fail(format!("{} has no time dimension", label(part))))?;
        total += len;
        for dim in &first.dims {
            if dim.name != TIME && part.dim_len(&dim.name) != Some(dim.len) {
                return Err(fail(format!(
                    "{} disagrees on dimension {}",
                    label(part),
                    dim.name
                )));
            }
        }
    }

    let mut out = Dataset {
        dims: first
            .dims
            .iter()
            .map(|d| Dimension {
                name: d.name.clone(),
                len: if d.name == TIME { total } else { d.len },
            })
            .collect(),
        attrs: first.attrs.clone(),
        ..Dataset::default()
    };

    for (name, variable) in &first.coords {
        let mut merged = variable.clone();
        if variable.dims.first().map(String::as_str) == Some(TIME) {
            merged.values = gather(parts, name, |p| p.coord(name)).map_err(fail)?;
        }
        out.coords.insert(name.clone(), merged);
    }
    for (name, variable) in &first.data_vars {
        let mut merged = variable.clone();
        if variable.dims.first().map(String::as_str) == Some(TIME) {
            merged.values = gather(parts, name, |p| p.var(name)).map_err(fail)?;
        }
        out.data_vars.insert(name.clone(), merged);
    }

    Ok(out)
}

fn gather<'a>(
    parts: &'a [Dataset],
    name: &str,
    lookup: impl Fn(&'a Dataset) -> Option<&'a super::Variable>,
) -> Result<Vec<f64>, String> {
    let mut values = Vec::new();
    for part in parts {
        let variable =
            lookup(part).ok_or_else(|| format!("{} is missing {name}", label(part)))?;
        values.extend_from_slice(&variable.values);
    }
    Ok(values)
}

fn label(ds: &Dataset) -> String {
    ds.source
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "<memory>".to_string())
}
