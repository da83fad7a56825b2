//! Cache error types.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type for cache store operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Errors raised by a [`crate::CacheStore`].
///
/// [`crate::TimeBoxedCache`] never surfaces these: unreadable entries count
/// as misses and failed writes are logged.
#[derive(Debug, Error)]
pub enum CacheError {
    /// Reading or writing a cache file failed.
    #[error("cache I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A persisted entry exists but cannot be decoded.
    #[error("corrupt cache entry at {path}: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// An entry could not be encoded for writing.
    #[error("failed to serialize cache entry: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl CacheError {
    /// Creates an I/O error for `path`.
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Creates a corrupt entry error for `path`.
    pub fn corrupt(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Self::Corrupt {
            path: path.into(),
            source,
        }
    }

    /// Returns true if the entry was present but undecodable.
    pub fn is_corrupt(&self) -> bool {
        matches!(self, Self::Corrupt { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corrupt_error_names_path() {
        let source = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = CacheError::corrupt("/tmp/abc.json", source);
        assert!(err.is_corrupt());
        assert!(err.to_string().starts_with("corrupt cache entry at /tmp/abc.json"));
    }

    #[test]
    fn io_error_is_not_corrupt() {
        let err = CacheError::io("/tmp/abc.json", io::Error::other("denied"));
        assert!(!err.is_corrupt());
        assert!(err.to_string().contains("denied"));
    }
}
