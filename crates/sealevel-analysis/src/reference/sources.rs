//! Per-source eligibility windows and the additive bias correction table.

use std::path::Path;

use chrono::NaiveDate;
use serde::Deserialize;

use sealevel_core::errors::ReferenceError;
use sealevel_core::types::collections::FxHashMap;
use sealevel_core::types::cycle::parse_date_key;

#[derive(Debug, Deserialize)]
struct RawWindow {
    ds_name: String,
    start: serde_yaml::Value,
    #[serde(default)]
    end: serde_yaml::Value,
}

/// Inclusive date range over which a source's granules are eligible.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceWindow {
    pub name: String,
    pub start: NaiveDate,
    /// `None` when the source is still active.
    pub end: Option<NaiveDate>,
}

impl SourceWindow {
    pub fn covers(&self, date: NaiveDate) -> bool {
        self.start <= date && self.end.map_or(true, |end| date <= end)
    }
}

/// Validity windows keyed by source directory name.
#[derive(Debug, Clone, Default)]
pub struct ValidityWindows {
    windows: FxHashMap<String, SourceWindow>,
}

impl ValidityWindows {
    pub fn load(path: &Path) -> Result<Self, ReferenceError> {
        let content = std::fs::read_to_string(path).map_err(|e| ReferenceError::InvalidTable {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_yaml(&content).map_err(|message| ReferenceError::InvalidTable {
            path: path.display().to_string(),
            message,
        })
    }

    /// Parse a YAML list of `{ds_name, start, end}`. Dates are `YYYYMMDD`,
    /// as strings or integers; an absent or non-date `end` leaves the window
    /// open.
    pub fn from_yaml(content: &str) -> Result<Self, String> {
        let raw: Vec<RawWindow> = serde_yaml::from_str(content).map_err(|e| e.to_string())?;
        let mut windows = FxHashMap::default();
        for entry in raw {
            let start = yaml_date(&entry.start).ok_or_else(|| {
                format!("source {}: invalid start {:?}", entry.ds_name, entry.start)
            })?;
            let end = yaml_date(&entry.end);
            windows.insert(
                entry.ds_name.clone(),
                SourceWindow {
                    name: entry.ds_name,
                    start,
                    end,
                },
            );
        }
        Ok(Self { windows })
    }

    pub fn from_windows(windows: impl IntoIterator<Item = SourceWindow>) -> Self {
        Self {
            windows: windows.into_iter().map(|w| (w.name.clone(), w)).collect(),
        }
    }

    pub fn get(&self, source: &str) -> Option<&SourceWindow> {
        self.windows.get(source)
    }

    /// Unknown sources are never eligible.
    pub fn covers(&self, source: &str, date: NaiveDate) -> bool {
        self.get(source).is_some_and(|w| w.covers(date))
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }
}

fn yaml_date(value: &serde_yaml::Value) -> Option<NaiveDate> {
    match value {
        serde_yaml::Value::Number(n) => n.as_u64().and_then(|n| parse_date_key(&n.to_string())),
        serde_yaml::Value::String(s) => parse_date_key(&s.replace('-', "")),
        _ => None,
    }
}

/// Additive SSHA corrections for one source, keyed by the digits of a
/// granule file name.
#[derive(Debug, Clone, Default)]
pub struct CorrectionTable {
    values: FxHashMap<String, f64>,
}

impl CorrectionTable {
    /// Load a CSV whose first column is the date key and whose `value`
    /// column holds the correction in meters. A missing file gives an
    /// empty table, so every lookup falls back to zero.
    pub fn load(path: &Path) -> Result<Self, ReferenceError> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                Self::from_csv(&content).map_err(|message| ReferenceError::InvalidTable {
                    path: path.display().to_string(),
                    message,
                })
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(
                    path = %path.display(),
                    "correction table not found, corrections default to 0"
                );
                Ok(Self::default())
            }
            Err(e) => Err(ReferenceError::InvalidTable {
                path: path.display().to_string(),
                message: e.to_string(),
            }),
        }
    }

    pub fn from_csv(content: &str) -> Result<Self, String> {
        let mut lines = content.lines().filter(|l| !l.trim().is_empty());
        let header: Vec<&str> = lines
            .next()
            .ok_or_else(|| "empty table".to_string())?
            .split(',')
            .map(str::trim)
            .collect();
        let value_col = header
            .iter()
            .position(|h| *h == "value")
            .ok_or_else(|| "no value column".to_string())?;
        if value_col == 0 {
            return Err("value column cannot be the key column".to_string());
        }

        let mut values = FxHashMap::default();
        for (row, line) in lines.enumerate() {
            let fields: Vec<&str> = line.split(',').map(|f| f.trim().trim_matches('"')).collect();
            let parsed = fields.get(value_col).and_then(|v| v.parse::<f64>().ok());
            match (fields.first(), parsed) {
                (Some(key), Some(value)) if !key.is_empty() => {
                    values.insert(key.to_string(), value);
                }
                _ => tracing::debug!(row = row + 1, "skipping unreadable correction row"),
            }
        }
        Ok(Self { values })
    }

    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, f64)>) -> Self {
        Self {
            values: pairs.into_iter().map(|(k, v)| (k.to_string(), v)).collect(),
        }
    }

    /// Correction for a granule file: the digits between the last `ssh`
    /// and the first `.` of the name. Any lookup failure yields `0.0`.
    pub fn correction_for(&self, file_name: &str) -> f64 {
        let tail = file_name.rsplit("ssh").next().unwrap_or(file_name);
        let stem = tail.split('.').next().unwrap_or(tail);
        let key: String = stem.chars().filter(char::is_ascii_digit).collect();
        self.values.get(&key).copied().unwrap_or(0.0)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
