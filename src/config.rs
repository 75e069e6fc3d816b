//! Tunable sampling thresholds.
//!
//! The defaults are empirical values for MongoDB's `$sample` stage. They are
//! plain configuration so a different backing store can retune them.

use semver::Version;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Thresholds that steer strategy selection and bound the reservoir scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SamplingThresholds {
    /// Oldest server version with a usable `$sample` stage.
    #[serde(default = "default_min_native_version")]
    pub min_native_version: Version,
    /// Populations up to `reservoir_ratio × size` (but larger than `size`) are
    /// sampled with the reservoir instead of `$sample`, which switches to a
    /// blocking sort above roughly 5% selectivity.
    #[serde(default = "default_reservoir_ratio")]
    pub reservoir_ratio: u64,
    /// Maximum number of `_id`s scanned into the reservoir.
    #[serde(default = "default_scan_limit")]
    pub scan_limit: i64,
    /// Maximum number of chunk lookups in flight at once.
    #[serde(default = "default_lookup_concurrency")]
    pub lookup_concurrency: usize,
}

impl Default for SamplingThresholds {
    fn default() -> Self {
        Self {
            min_native_version: default_min_native_version(),
            reservoir_ratio: default_reservoir_ratio(),
            scan_limit: default_scan_limit(),
            lookup_concurrency: default_lookup_concurrency(),
        }
    }
}

impl SamplingThresholds {
    pub(crate) fn validate(&self) -> Result<()> {
        if self.reservoir_ratio == 0 {
            return Err(Error::InvalidRequest("reservoirRatio must be at least 1".into()));
        }
        if self.scan_limit <= 0 {
            return Err(Error::InvalidRequest("scanLimit must be positive".into()));
        }
        if self.lookup_concurrency == 0 {
            return Err(Error::InvalidRequest("lookupConcurrency must be at least 1".into()));
        }
        Ok(())
    }
}

fn default_min_native_version() -> Version {
    Version::new(3, 1, 6)
}

fn default_reservoir_ratio() -> u64 {
    20
}

fn default_scan_limit() -> i64 {
    10_000
}

fn default_lookup_concurrency() -> usize {
    4
}
