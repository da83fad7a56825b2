//! Cached documents.

use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

/// A cached calendar document and when it was fetched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// When the document was last fetched successfully.
    pub last_refresh: DateTime<Utc>,
    /// The raw iCalendar text.
    pub document: String,
}

impl CacheEntry {
    /// Creates an entry fetched at `last_refresh`.
    pub fn new(document: impl Into<String>, last_refresh: DateTime<Utc>) -> Self {
        Self {
            last_refresh,
            document: document.into(),
        }
    }

    /// Time elapsed since the last refresh. Negative if the clock moved back.
    pub fn age(&self, now: DateTime<Utc>) -> TimeDelta {
        now - self.last_refresh
    }

    /// Returns true if the entry is at most `staleness` old.
    pub fn is_fresh(&self, now: DateTime<Utc>, staleness: Duration) -> bool {
        let window = TimeDelta::from_std(staleness).unwrap_or(TimeDelta::MAX);
        self.age(now) <= window
    }
}
