//! Master time series: concatenation of per-cycle artifacts.

use std::path::PathBuf;

use sealevel_core::errors::{SealevelErrorCode, StorageError};

use crate::backup::backup_master;
use crate::codec::ArrayCodec;
use crate::dataset::concat_time;
use crate::freshness::needs_recompute;
use crate::layout::{artifact_date, ArtifactLayout};

/// One master product and the per-cycle directory it is built from.
#[derive(Debug, Clone)]
pub struct MasterProduct {
    pub name: String,
    pub source_dir: PathBuf,
    pub master: PathBuf,
    /// File name prefix for backups; `None` disables backups for this product.
    pub backup_prefix: Option<String>,
}

impl MasterProduct {
    /// Indicators, globals and one anomaly series per pattern, in that order.
    pub fn all(layout: &ArtifactLayout, patterns: &[&str]) -> Vec<Self> {
        let mut products = vec![
            Self {
                name: "indicators".to_string(),
                source_dir: layout.cycle_indicators_dir(),
                master: layout.indicators_master(),
                backup_prefix: Some("indicator".to_string()),
            },
            Self {
                name: "globals".to_string(),
                source_dir: layout.cycle_globals_dir(),
                master: layout.globals_master(),
                backup_prefix: None,
            },
        ];
        products.extend(patterns.iter().map(|p| Self {
            name: format!("{p}_anoms"),
            source_dir: layout.cycle_pattern_anoms_dir(p),
            master: layout.pattern_master(p),
            backup_prefix: None,
        }));
        products
    }
}

/// Outcome for one master product.
#[derive(Debug, Clone)]
pub struct MasterReport {
    pub product: String,
    pub path: PathBuf,
    pub records: usize,
    /// False when the master was already newer than every per-cycle file.
    pub written: bool,
    pub backup: Option<PathBuf>,
}

/// Outcome of the final merge phase.
#[derive(Debug, Default)]
pub struct ConcatReport {
    pub success: bool,
    pub masters: Vec<MasterReport>,
    pub failure: Option<StorageError>,
}

/// Rebuild `product`'s master file if any per-cycle file is newer than it.
pub fn write_master(
    codec: &dyn ArrayCodec,
    layout: &ArtifactLayout,
    product: &MasterProduct,
    backup_enabled: bool,
) -> Result<MasterReport, StorageError> {
    let mut files = layout.list(&product.source_dir)?;
    files.sort_by(|a, b| {
        artifact_date(a)
            .cmp(&artifact_date(b))
            .then_with(|| a.file_name().cmp(&b.file_name()))
    });

    if !files.is_empty() && !needs_recompute(&product.master, &files) {
        tracing::debug!(product = %product.name, "master up to date");
        return Ok(MasterReport {
            product: product.name.clone(),
            path: product.master.clone(),
            records: files.len(),
            written: false,
            backup: None,
        });
    }

    let parts = files
        .iter()
        .map(|f| codec.read(f))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| StorageError::ConcatenationFailed {
            product: product.name.clone(),
            message: e.to_string(),
        })?;
    let merged = concat_time(&product.name, &parts)?;

    let mut backup = None;
    if let (true, Some(prefix)) = (backup_enabled, product.backup_prefix.as_deref()) {
        if product.master.exists() {
            match backup_master(&product.master, &layout.backup_dir(), prefix, layout.extension()) {
                Ok(path) => backup = Some(path),
                Err(e) => tracing::error!(
                    product = %product.name,
                    error_code = e.error_code(),
                    error = %e,
                    "backup failed, overwriting master anyway"
                ),
            }
        }
    }

    codec.write(&merged, &product.master)?;
    tracing::info!(product = %product.name, records = parts.len(), "wrote master product");

    Ok(MasterReport {
        product: product.name.clone(),
        path: product.master.clone(),
        records: parts.len(),
        written: true,
        backup,
    })
}

/// Rebuild every master in order. The first failure aborts the phase; files
/// already written, per-cycle or master, stay on disk.
pub fn concat_masters(
    codec: &dyn ArrayCodec,
    layout: &ArtifactLayout,
    products: &[MasterProduct],
    backup_enabled: bool,
) -> ConcatReport {
    let mut report = ConcatReport::default();
    for product in products {
        match write_master(codec, layout, product, backup_enabled) {
            Ok(master) => report.masters.push(master),
            Err(e) => {
                tracing::error!(
                    product = %product.name,
                    error_code = e.error_code(),
                    error = %e,
                    "master concatenation failed"
                );
                report.failure = Some(e);
                return report;
            }
        }
    }
    report.success = true;
    report
}
