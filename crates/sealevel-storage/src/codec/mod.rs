//! On-disk codecs for [`Dataset`](crate::dataset::Dataset).

pub mod packed;
#[cfg(feature = "netcdf")]
pub mod netcdf;

use std::path::Path;
use std::sync::Arc;

use sealevel_core::config::StorageFormat;
use sealevel_core::errors::StorageError;

use crate::dataset::Dataset;

pub use packed::PackedCodec;

/// Reads and writes whole datasets.
pub trait ArrayCodec: Send + Sync {
    fn format(&self) -> StorageFormat;

    /// File extension of artifacts written by this codec.
    fn extension(&self) -> &'static str {
        self.format().extension()
    }

    fn write(&self, dataset: &Dataset, path: &Path) -> Result<(), StorageError>;

    fn read(&self, path: &Path) -> Result<Dataset, StorageError>;

    /// Read an along-track granule. Granules may nest their arrays in a
    /// group, so codecs can override this.
    fn read_granule(&self, path: &Path) -> Result<Dataset, StorageError> {
        self.read(path)
    }
}

/// Codec for `format`, compressing data at `level`.
pub fn codec_for(format: StorageFormat, level: u8) -> Result<Arc<dyn ArrayCodec>, StorageError> {
    match format {
        StorageFormat::Packed => Ok(Arc::new(PackedCodec::new(level))),
        #[cfg(feature = "netcdf")]
        StorageFormat::Netcdf => Ok(Arc::new(netcdf::NetCdfCodec::new())),
        #[cfg(not(feature = "netcdf"))]
        StorageFormat::Netcdf => Err(StorageError::FormatUnavailable {
            format: "netcdf".to_string(),
        }),
    }
}

/// Create the parent directory of `path` if needed.
pub(crate) fn ensure_parent(path: &Path) -> Result<(), StorageError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| StorageError::io(parent, e))?;
        }
    }
    Ok(())
}
