//! Retention configuration.
//!
//! # Example
//!
//! ```toml
//! [retention]
//! max_age = "182d"
//! dry_run = false
//! max_deletes_per_sweep = 0
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::{ConfigError, duration};

/// Retention horizon and sweep safety settings.
///
/// Posts whose age reaches `max_age` are deleted by the next sweep. The
/// refresh and sweep cadences are fixed and deliberately not configurable.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RetentionConfig {
    /// Age at which a post becomes eligible for deletion.
    /// Default: 182d (about six months)
    #[serde(default = "default_max_age", with = "duration::serde_str")]
    pub max_age: Duration,

    /// If true, log what would be deleted without deleting anything.
    /// Default: false
    #[serde(default)]
    pub dry_run: bool,

    /// Maximum number of successful deletions per sweep.
    /// Set to 0 for unlimited.
    /// Default: 0
    #[serde(default)]
    pub max_deletes_per_sweep: u64,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            max_age: default_max_age(),
            dry_run: false,
            max_deletes_per_sweep: 0,
        }
    }
}

pub(super) fn default_max_age() -> Duration {
    Duration::from_secs(86_400 * 182)
}

impl RetentionConfig {
    /// The per-sweep deletion cap, or `None` when unlimited.
    pub fn delete_limit(&self) -> Option<u64> {
        (self.max_deletes_per_sweep > 0).then_some(self.max_deletes_per_sweep)
    }

    pub(super) fn validate(&self) -> Result<(), ConfigError> {
        if self.max_age.is_zero() {
            return Err(ConfigError::Validation(
                "retention.max_age must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}
