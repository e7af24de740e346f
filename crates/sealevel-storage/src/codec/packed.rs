//! Packed codec: a self-describing JSON document compressed with zstd.
//!
//! Each element is stored at its variable's precision. Missing values are
//! written as the variable's fill sentinel, or `null` where there is none,
//! so the file round-trips through any JSON reader.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use sealevel_core::config::StorageFormat;
use sealevel_core::errors::StorageError;

use super::{ensure_parent, ArrayCodec};
use crate::dataset::{AttrValue, Dataset, Dimension, Variable, VariableEncoding};

const FORMAT_VERSION: u32 = 1;

#[derive(Serialize, Deserialize)]
struct PackedDocument {
    format_version: u32,
    dims: Vec<Dimension>,
    coords: BTreeMap<String, PackedVariable>,
    data_vars: BTreeMap<String, PackedVariable>,
    attrs: BTreeMap<String, AttrValue>,
}

#[derive(Serialize, Deserialize)]
struct PackedVariable {
    dims: Vec<String>,
    encoding: VariableEncoding,
    attrs: BTreeMap<String, AttrValue>,
    values: Vec<Option<f64>>,
}

impl PackedVariable {
    fn pack(variable: &Variable) -> Self {
        let enc = variable.encoding;
        Self {
            dims: variable.dims.clone(),
            encoding: enc,
            attrs: finite_attrs(&variable.attrs),
            values: variable.values.iter().map(|&v| enc.encode(v)).collect(),
        }
    }

    fn unpack(self) -> Variable {
        let enc = self.encoding;
        Variable {
            dims: self.dims,
            values: self.values.into_iter().map(|v| enc.decode(v)).collect(),
            attrs: self.attrs,
            encoding: enc,
        }
    }
}

/// JSON has no NaN: non-finite numeric attributes are dropped.
fn finite_attrs(attrs: &BTreeMap<String, AttrValue>) -> BTreeMap<String, AttrValue> {
    attrs
        .iter()
        .filter(|(_, v)| match v {
            AttrValue::Number(n) => n.is_finite(),
            AttrValue::Numbers(ns) => ns.iter().all(|n| n.is_finite()),
            AttrValue::Text(_) => true,
        })
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

/// zstd-compressed JSON codec.
#[derive(Debug, Clone)]
pub struct PackedCodec {
    level: i32,
}

impl PackedCodec {
    pub fn new(level: u8) -> Self {
        Self {
            level: i32::from(level),
        }
    }
}

impl ArrayCodec for PackedCodec {
    fn format(&self) -> StorageFormat {
        StorageFormat::Packed
    }

    fn write(&self, dataset: &Dataset, path: &Path) -> Result<(), StorageError> {
        ensure_parent(path)?;
        let doc = PackedDocument {
            format_version: FORMAT_VERSION,
            dims: dataset.dims.clone(),
            coords: dataset
                .coords
                .iter()
                .map(|(k, v)| (k.clone(), PackedVariable::pack(v)))
                .collect(),
            data_vars: dataset
                .data_vars
                .iter()
                .map(|(k, v)| (k.clone(), PackedVariable::pack(v)))
                .collect(),
            attrs: finite_attrs(&dataset.attrs),
        };

        let codec_err = |message: String| StorageError::Codec {
            path: path.to_path_buf(),
            message,
        };

        let file = File::create(path).map_err(|e| StorageError::io(path, e))?;
        let mut encoder = zstd::stream::write::Encoder::new(BufWriter::new(file), self.level)
            .map_err(|e| StorageError::io(path, e))?;
        serde_json::to_writer(&mut encoder, &doc).map_err(|e| codec_err(e.to_string()))?;
        let mut writer = encoder.finish().map_err(|e| StorageError::io(path, e))?;
        writer.flush().map_err(|e| StorageError::io(path, e))?;

        tracing::debug!(path = %path.display(), vars = dataset.data_vars.len(), "wrote dataset");
        Ok(())
    }

    fn read(&self, path: &Path) -> Result<Dataset, StorageError> {
        let file = File::open(path).map_err(|e| StorageError::io(path, e))?;
        let decoder = zstd::stream::read::Decoder::new(BufReader::new(file))
            .map_err(|e| StorageError::io(path, e))?;
        let doc: PackedDocument =
            serde_json::from_reader(decoder).map_err(|e| StorageError::Codec {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;

        if doc.format_version > FORMAT_VERSION {
            return Err(StorageError::Codec {
                path: path.to_path_buf(),
                message: format!("unsupported packed format version {}", doc.format_version),
            });
        }

        let dataset = Dataset {
            dims: doc.dims,
            coords: doc
                .coords
                .into_iter()
                .map(|(k, v)| (k, v.unpack()))
                .collect(),
            data_vars: doc
                .data_vars
                .into_iter()
                .map(|(k, v)| (k, v.unpack()))
                .collect(),
            attrs: doc.attrs,
            source: Some(path.to_path_buf()),
        };

        // Shapes are validated the same way as for in-memory construction.
        for (name, variable) in dataset.coords.iter().chain(dataset.data_vars.iter()) {
            let expected: usize = dataset.shape(&variable.dims)?.iter().product();
            if expected != variable.values.len() {
                return Err(StorageError::Codec {
                    path: path.to_path_buf(),
                    message: format!("variable {name} is truncated"),
                });
            }
        }
        Ok(dataset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sealevel_core::constants::FILL_VALUE_F64;

    fn sample() -> Dataset {
        let mut ds = Dataset::new();
        ds.add_axis("latitude", vec![-0.25, 0.25], VariableEncoding::coordinate())
            .unwrap();
        ds.add_axis("longitude", vec![0.25, 0.75], VariableEncoding::coordinate())
            .unwrap();
        ds.add_var(
            "SSHA",
            Variable::new(
                &["latitude", "longitude"],
                vec![0.1, f64::NAN, -0.2, 0.3],
                VariableEncoding::data(5),
            ),
        )
        .unwrap()
        .set_attr("units", "m");
        ds.set_attr("summary", "Data gridded to 0.5 degree lat lon grid");
        ds
    }

    #[test]
    fn write_then_read_preserves_structure_and_missing_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("cycle.json.zst");
        let codec = PackedCodec::new(5);

        codec.write(&sample(), &path).unwrap();
        let back = codec.read(&path).unwrap();

        let ssha = back.var("SSHA").unwrap();
        assert_eq!(ssha.values[0], 0.1f32 as f64);
        assert!(ssha.values[1].is_nan());
        assert_eq!(ssha.attr("units").and_then(|a| a.as_text()), Some("m"));
        assert_eq!(back.coord("latitude").unwrap().values, vec![-0.25, 0.25]);
        assert_eq!(back.source.as_deref(), Some(path.as_path()));
    }

    #[test]
    fn fill_sentinel_is_what_lands_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cycle.json.zst");
        PackedCodec::new(3).write(&sample(), &path).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        let json = zstd::stream::decode_all(&bytes[..]).unwrap();
        let doc: serde_json::Value = serde_json::from_slice(&json).unwrap();
        let stored = doc["data_vars"]["SSHA"]["values"][1].as_f64().unwrap();
        assert_eq!(stored, FILL_VALUE_F64);
        assert_eq!(doc["data_vars"]["SSHA"]["encoding"]["dtype"], "f32");
    }

    #[test]
    fn garbage_is_a_codec_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json.zst");
        std::fs::write(&path, b"not zstd").unwrap();
        assert!(PackedCodec::new(5).read(&path).is_err());
    }
}
