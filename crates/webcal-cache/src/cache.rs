//! The time-boxed document cache.
//!
//! One entry per [`ConnectionIdentity`], loaded from the store the first
//! time the identity is used. An entry is served while
//! `now - last_refresh <= staleness`; after that the refresh closure runs
//! and, if it succeeds, replaces and persists the entry.

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::clock::{Clock, SystemClock};
use crate::config::CacheConfig;
use crate::entry::CacheEntry;
use crate::identity::ConnectionIdentity;
use crate::store::{CacheStore, FileStore};

/// Caches calendar documents per source for a bounded time.
#[derive(Debug)]
pub struct TimeBoxedCache<S, C = SystemClock> {
    store: S,
    clock: C,
    staleness: Duration,
    /// Loaded slots; `None` means the store had nothing usable.
    entries: HashMap<String, Option<CacheEntry>>,
}

impl TimeBoxedCache<FileStore, SystemClock> {
    /// Opens a file-backed cache using the system clock.
    pub fn open(config: &CacheConfig) -> Self {
        Self::new(FileStore::new(&config.dir), SystemClock).with_staleness(config.staleness)
    }
}

impl<S: CacheStore, C: Clock> TimeBoxedCache<S, C> {
    /// Creates a cache over `store` with the default staleness window.
    pub fn new(store: S, clock: C) -> Self {
        Self {
            store,
            clock,
            staleness: Duration::from_secs(CacheConfig::DEFAULT_STALENESS_HOURS * 3600),
            entries: HashMap::new(),
        }
    }

    /// Builder: set the default staleness window.
    pub fn with_staleness(mut self, staleness: Duration) -> Self {
        self.staleness = staleness;
        self
    }

    /// Returns the default staleness window.
    pub fn staleness(&self) -> Duration {
        self.staleness
    }

    /// Returns the backing store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Returns the clock.
    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Returns the document for `identity`, refreshing it if it is missing
    /// or older than `staleness`.
    ///
    /// # Errors
    ///
    /// Returns the refresh closure's error; the cached entry is left as it
    /// was.
    pub fn get_or_refresh<F, E>(
        &mut self,
        identity: &ConnectionIdentity,
        refresh: F,
        staleness: Duration,
    ) -> Result<String, E>
    where
        F: FnOnce() -> Result<String, E>,
        E: fmt::Display,
    {
        let now = self.clock.now();
        if let Some(entry) = self.slot(identity) {
            if entry.is_fresh(now, staleness) {
                debug!(
                    identity = %identity,
                    age_secs = entry.age(now).num_seconds(),
                    "Serving cached calendar"
                );
                return Ok(entry.document.clone());
            }
            debug!(
                identity = %identity,
                age_secs = entry.age(now).num_seconds(),
                staleness_secs = staleness.as_secs(),
                "Cached calendar is stale"
            );
        }
        self.refresh(identity, refresh)
    }

    /// Like [`Self::get_or_refresh`] with the default staleness window.
    ///
    /// # Errors
    ///
    /// Returns the refresh closure's error.
    pub fn get<F, E>(&mut self, identity: &ConnectionIdentity, refresh: F) -> Result<String, E>
    where
        F: FnOnce() -> Result<String, E>,
        E: fmt::Display,
    {
        let staleness = self.staleness;
        self.get_or_refresh(identity, refresh, staleness)
    }

    /// Runs `refresh` regardless of freshness and stores its result.
    ///
    /// A failure to persist the new entry is logged; the document is still
    /// returned and kept for this process.
    ///
    /// # Errors
    ///
    /// Returns the refresh closure's error; the cached entry is left as it
    /// was.
    pub fn refresh<F, E>(&mut self, identity: &ConnectionIdentity, refresh: F) -> Result<String, E>
    where
        F: FnOnce() -> Result<String, E>,
        E: fmt::Display,
    {
        let document = refresh().inspect_err(|e| {
            warn!(identity = %identity, error = %e, "Refresh failed, keeping cached entry");
        })?;

        let entry = CacheEntry::new(document, self.clock.now());
        if let Err(e) = self.store.save(identity, &entry) {
            warn!(identity = %identity, error = %e, "Failed to persist cache entry");
        }
        info!(
            identity = %identity,
            locator = %identity.locator(),
            bytes = entry.document.len(),
            "Refreshed calendar"
        );

        let document = entry.document.clone();
        self.entries
            .insert(identity.as_str().to_string(), Some(entry));
        Ok(document)
    }

    /// Returns the current entry without refreshing it.
    pub fn peek(&mut self, identity: &ConnectionIdentity) -> Option<&CacheEntry> {
        self.slot(identity).as_ref()
    }

    /// The loaded slot for `identity`, reading the store on first use.
    fn slot(&mut self, identity: &ConnectionIdentity) -> &mut Option<CacheEntry> {
        let store = &self.store;
        self.entries
            .entry(identity.as_str().to_string())
            .or_insert_with(|| match store.load(identity) {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(identity = %identity, error = %e, "Discarding unreadable cache entry");
                    None
                }
            })
    }
}
