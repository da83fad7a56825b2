//! Local file source.

use std::io::ErrorKind;
use std::path::PathBuf;

use tracing::debug;
use url::Url;

use crate::error::{ProviderError, ProviderResult};
use crate::source::{CalendarSource, Credentials};

/// Reads calendar documents from the local filesystem.
///
/// Accepts `file://` URLs and plain paths.
#[derive(Debug, Clone, Default)]
pub struct FileSource;

impl FileSource {
    /// Creates a file source.
    pub fn new() -> Self {
        Self
    }

    /// Turns a locator into a filesystem path.
    fn path_of(locator: &str) -> ProviderResult<PathBuf> {
        if locator.starts_with("file:") {
            let url = Url::parse(locator).map_err(|e| {
                ProviderError::invalid_locator(format!("cannot parse `{locator}`: {e}"))
                    .with_origin("file")
            })?;
            return url.to_file_path().map_err(|()| {
                ProviderError::invalid_locator(format!("`{locator}` is not a local file URL"))
                    .with_origin("file")
            });
        }
        Ok(PathBuf::from(locator))
    }
}

impl CalendarSource for FileSource {
    fn name(&self) -> &'static str {
        "file"
    }

    fn fetch(&self, locator: &str, credentials: Option<&Credentials>) -> ProviderResult<Vec<u8>> {
        let path = Self::path_of(locator)?;
        if let Some(creds) = credentials {
            debug!(login = %creds.login(), "Ignoring credentials for a local file");
        }

        debug!(path = %path.display(), "Reading calendar file");
        std::fs::read(&path).map_err(|e| {
            let err = if e.kind() == ErrorKind::NotFound {
                ProviderError::not_found(format!("no calendar at {}", path.display()))
            } else {
                ProviderError::io(format!("failed to read {}: {e}", path.display()))
            };
            err.with_origin("file").with_source(e)
        })
    }
}
