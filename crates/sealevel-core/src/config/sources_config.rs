//! Satellite source roles.

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_ANCHOR_SOURCE, DEFAULT_CORRECTED_SOURCE, DEFAULT_REFERENCE_MISSION,
};

/// Names of the sources that play a special role in cycle assembly.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SourcesConfig {
    /// Reference mission merged after every other source. Default: `MERGED_ALT`.
    pub reference_mission: Option<String>,
    /// Source whose latest granule bounds the schedule. Default: `SNTNL-6A`.
    pub anchor_source: Option<String>,
    /// Source receiving the additive bias correction. Default: `SNTNL-6A`.
    pub corrected_source: Option<String>,
}

impl SourcesConfig {
    pub fn effective_reference_mission(&self) -> &str {
        self.reference_mission
            .as_deref()
            .unwrap_or(DEFAULT_REFERENCE_MISSION)
    }

    pub fn effective_anchor_source(&self) -> &str {
        self.anchor_source.as_deref().unwrap_or(DEFAULT_ANCHOR_SOURCE)
    }

    pub fn effective_corrected_source(&self) -> &str {
        self.corrected_source
            .as_deref()
            .unwrap_or(DEFAULT_CORRECTED_SOURCE)
    }
}
