//! Cache configuration.

use std::path::PathBuf;
use std::time::Duration;

/// Where the cache lives and how long entries stay fresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Directory holding one JSON file per identity.
    pub dir: PathBuf,
    /// Maximum age of an entry before it is refreshed.
    pub staleness: Duration,
}

impl CacheConfig {
    /// Default staleness window in hours.
    pub const DEFAULT_STALENESS_HOURS: u64 = 12;

    /// Creates a configuration for `dir` with the default window.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            staleness: Duration::from_secs(Self::DEFAULT_STALENESS_HOURS * 3600),
        }
    }

    /// Builder: set the staleness window.
    pub fn with_staleness(mut self, staleness: Duration) -> Self {
        self.staleness = staleness;
        self
    }

    /// Builder: set the staleness window in hours.
    pub fn with_staleness_hours(self, hours: u64) -> Self {
        self.with_staleness(Duration::from_secs(hours.saturating_mul(3600)))
    }
}
