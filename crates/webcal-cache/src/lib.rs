//! Time-boxed cache of calendar documents.
//!
//! - [`ConnectionIdentity`] - SHA-256 fingerprint of a locator and login
//! - [`CacheEntry`] - a document with its last refresh time
//! - [`CacheStore`] - persistence, with [`FileStore`] and [`MemoryStore`]
//! - [`TimeBoxedCache`] - serves fresh entries and refreshes stale ones

pub mod cache;
pub mod clock;
pub mod config;
pub mod entry;
pub mod error;
pub mod identity;
pub mod store;

pub use cache::TimeBoxedCache;
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::CacheConfig;
pub use entry::CacheEntry;
pub use error::{CacheError, CacheResult};
pub use identity::ConnectionIdentity;
pub use store::{CacheStore, FileStore, MemoryStore};
