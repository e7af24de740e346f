//! Artifact persistence for the sea level pipeline: the array dataset
//! container and its codecs, the output tree layout, timestamp freshness,
//! indicator backups, master-series concatenation, the run ledger and the
//! output lock.

pub mod backup;
pub mod codec;
pub mod dataset;
pub mod freshness;
pub mod layout;
pub mod ledger;
pub mod lock;
pub mod master;

pub use codec::{codec_for, ArrayCodec};
pub use dataset::{AttrValue, DType, Dataset, Variable, VariableEncoding};
pub use freshness::{needs_recompute, staleness, Staleness};
pub use layout::ArtifactLayout;
