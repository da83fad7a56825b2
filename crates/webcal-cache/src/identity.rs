//! Connection identities.

use std::fmt;

use sha2::{Digest, Sha256};

/// Stable fingerprint of a calendar source, used as the cache key.
///
/// The digest is the SHA-256 of the locator, a NUL byte, and the login when
/// one is given. The NUL keeps `("ab", "c")` and `("a", "bc")` apart.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConnectionIdentity {
    digest: String,
    locator: String,
    login: Option<String>,
}

impl ConnectionIdentity {
    /// Derives the identity of `locator` accessed as `login`.
    pub fn new(locator: impl Into<String>, login: Option<&str>) -> Self {
        let locator = locator.into();
        let mut hasher = Sha256::new();
        hasher.update(locator.as_bytes());
        if let Some(login) = login {
            hasher.update([0u8]);
            hasher.update(login.as_bytes());
        }

        Self {
            digest: format!("{:x}", hasher.finalize()),
            locator,
            login: login.map(str::to_string),
        }
    }

    /// Returns the hex digest.
    pub fn as_str(&self) -> &str {
        &self.digest
    }

    /// Returns the locator this identity was derived from.
    pub fn locator(&self) -> &str {
        &self.locator
    }

    /// Returns the login, if any.
    pub fn login(&self) -> Option<&str> {
        self.login.as_deref()
    }
}

impl fmt::Display for ConnectionIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.digest)
    }
}
