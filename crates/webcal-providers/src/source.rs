//! The [`CalendarSource`] trait and locator routing.

use std::fmt;

use url::Url;

use crate::error::{ProviderError, ProviderResult};
use crate::file::FileSource;
#[cfg(feature = "http")]
use crate::http::HttpSource;

/// Credentials for a calendar source.
///
/// Only the login takes part in cache identities. Sources accept
/// credentials but do not send them.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    login: String,
    password: Option<String>,
}

impl Credentials {
    /// Creates credentials with only a login.
    pub fn new(login: impl Into<String>) -> Self {
        Self {
            login: login.into(),
            password: None,
        }
    }

    /// Builder method to set the password.
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Returns the login.
    pub fn login(&self) -> &str {
        &self.login
    }

    /// Returns the password, if any.
    pub fn password(&self) -> Option<&str> {
        self.password.as_deref()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("login", &self.login)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .finish()
    }
}

/// Something that can fetch the raw bytes of a calendar document.
pub trait CalendarSource {
    /// Returns a short name for logs and errors (e.g. "http").
    fn name(&self) -> &'static str;

    /// Fetches the document at `locator`.
    ///
    /// # Errors
    ///
    /// Returns a [`ProviderError`] if the document cannot be retrieved.
    fn fetch(&self, locator: &str, credentials: Option<&Credentials>) -> ProviderResult<Vec<u8>>;
}

/// How a locator should be fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocatorKind {
    /// `http`, `https`, `webcal` or `webcals` URL.
    Remote,
    /// `file://` URL or a plain path.
    Local,
}

impl LocatorKind {
    /// Classifies a locator by its scheme.
    ///
    /// # Errors
    ///
    /// Returns an invalid locator error for unsupported schemes.
    pub fn of(locator: &str) -> ProviderResult<Self> {
        match Url::parse(locator) {
            Ok(url) => match url.scheme() {
                "http" | "https" | "webcal" | "webcals" => Ok(Self::Remote),
                "file" => Ok(Self::Local),
                // Windows drive letters parse as one-letter schemes.
                s if s.len() == 1 => Ok(Self::Local),
                s => Err(ProviderError::invalid_locator(format!(
                    "unsupported scheme `{s}` in `{locator}`"
                ))),
            },
            Err(url::ParseError::RelativeUrlWithoutBase) => Ok(Self::Local),
            Err(e) => Err(ProviderError::invalid_locator(format!(
                "cannot parse `{locator}`: {e}"
            ))
            .with_source(e)),
        }
    }
}

/// Dispatches fetches to the HTTP or file source by locator scheme.
#[derive(Debug)]
pub struct SourceRouter {
    #[cfg(feature = "http")]
    http: HttpSource,
    file: FileSource,
}

impl SourceRouter {
    /// Creates a router from its sources.
    #[cfg(feature = "http")]
    pub fn new(http: HttpSource, file: FileSource) -> Self {
        Self { http, file }
    }

    /// Creates a router that only reads local files.
    #[cfg(not(feature = "http"))]
    pub fn new(file: FileSource) -> Self {
        Self { file }
    }
}

impl CalendarSource for SourceRouter {
    fn name(&self) -> &'static str {
        "router"
    }

    fn fetch(&self, locator: &str, credentials: Option<&Credentials>) -> ProviderResult<Vec<u8>> {
        match LocatorKind::of(locator)? {
            #[cfg(feature = "http")]
            LocatorKind::Remote => self.http.fetch(locator, credentials),
            #[cfg(not(feature = "http"))]
            LocatorKind::Remote => Err(ProviderError::configuration(
                "remote calendars require the `http` feature",
            )),
            LocatorKind::Local => self.file.fetch(locator, credentials),
        }
    }
}
