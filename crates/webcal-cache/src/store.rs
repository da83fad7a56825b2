//! Persistence for cache entries.

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};

use tracing::{debug, trace};

use crate::entry::CacheEntry;
use crate::error::{CacheError, CacheResult};
use crate::identity::ConnectionIdentity;

/// Loads and saves one [`CacheEntry`] per identity.
pub trait CacheStore {
    /// Loads the entry for `identity`; `Ok(None)` when there is none.
    ///
    /// # Errors
    ///
    /// Returns an error if the entry exists but cannot be read or decoded.
    fn load(&self, identity: &ConnectionIdentity) -> CacheResult<Option<CacheEntry>>;

    /// Replaces the entry for `identity`.
    ///
    /// # Errors
    ///
    /// Returns an error if the entry cannot be written.
    fn save(&self, identity: &ConnectionIdentity, entry: &CacheEntry) -> CacheResult<()>;
}

/// Stores each entry as `<dir>/<identity>.json`.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Creates a store rooted at `dir`. The directory is created on first save.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Returns the file used for `identity`.
    pub fn path_for(&self, identity: &ConnectionIdentity) -> PathBuf {
        self.dir.join(format!("{}.json", identity.as_str()))
    }
}

impl CacheStore for FileStore {
    fn load(&self, identity: &ConnectionIdentity) -> CacheResult<Option<CacheEntry>> {
        let path = self.path_for(identity);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "No cache file");
                return Ok(None);
            }
            Err(e) => return Err(CacheError::io(path, e)),
        };

        if content.trim().is_empty() {
            debug!(path = %path.display(), "Empty cache file");
            return Ok(None);
        }

        let entry = serde_json::from_str(&content).map_err(|e| CacheError::corrupt(&path, e))?;
        trace!(path = %path.display(), "Loaded cache file");
        Ok(Some(entry))
    }

    fn save(&self, identity: &ConnectionIdentity, entry: &CacheEntry) -> CacheResult<()> {
        fs::create_dir_all(&self.dir).map_err(|e| CacheError::io(&self.dir, e))?;

        let path = self.path_for(identity);
        let temp_path = path.with_extension("json.tmp");
        let content = serde_json::to_string(entry)?;

        fs::write(&temp_path, content).map_err(|e| CacheError::io(&temp_path, e))?;
        fs::rename(&temp_path, &path).map_err(|e| CacheError::io(&path, e))?;

        debug!(path = %path.display(), "Saved cache file");
        Ok(())
    }
}

/// Keeps entries in memory only.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored entries.
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns true if nothing has been stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CacheStore for MemoryStore {
    fn load(&self, identity: &ConnectionIdentity) -> CacheResult<Option<CacheEntry>> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(identity.as_str()).cloned())
    }

    fn save(&self, identity: &ConnectionIdentity, entry: &CacheEntry) -> CacheResult<()> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert(identity.as_str().to_string(), entry.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn identity() -> ConnectionIdentity {
        ConnectionIdentity::new("https://example.com/team.ics", None)
    }

    fn entry() -> CacheEntry {
        CacheEntry::new(
            "BEGIN:VCALENDAR\r\nEND:VCALENDAR\r\n",
            Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap(),
        )
    }

    #[test]
    fn file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("nested"));
        let id = identity();

        assert!(store.load(&id).unwrap().is_none());
        store.save(&id, &entry()).unwrap();
        assert_eq!(store.load(&id).unwrap(), Some(entry()));

        let path = store.path_for(&id);
        assert!(path.exists());
        assert!(!path.with_extension("json.tmp").exists());
        assert_eq!(
            path.file_name().and_then(|n| n.to_str()),
            Some(format!("{}.json", id.as_str()).as_str())
        );
    }

    #[test]
    fn empty_file_is_a_miss() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        let id = identity();
        fs::write(store.path_for(&id), "  \n").unwrap();

        assert!(store.load(&id).unwrap().is_none());
    }

    #[test]
    fn garbage_file_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        let id = identity();
        fs::write(store.path_for(&id), "{not json").unwrap();

        let err = store.load(&id).unwrap_err();
        assert!(err.is_corrupt());
    }

    #[test]
    fn save_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        let id = identity();
        store.save(&id, &entry()).unwrap();

        let newer = CacheEntry::new("v2", Utc.with_ymd_and_hms(2024, 3, 2, 8, 0, 0).unwrap());
        store.save(&id, &newer).unwrap();
        assert_eq!(store.load(&id).unwrap(), Some(newer));
    }

    #[test]
    fn memory_store() {
        let store = MemoryStore::new();
        let id = identity();
        assert!(store.is_empty());
        assert!(store.load(&id).unwrap().is_none());

        store.save(&id, &entry()).unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.load(&id).unwrap(), Some(entry()));
    }
}
