//! Client configuration.
//!
//! All settings live in a single `config.toml` file at
//! `~/.config/webcal/config.toml` by default:
//!
//! ```toml
//! debug = false
//!
//! [cache]
//! dir = "/home/me/.cache/webcal"
//! staleness_hours = 12
//!
//! [http]
//! timeout_secs = 30
//! user_agent = "webcal/0.1"
//!
//! [query]
//! max_occurrences = 1000
//! truncate_zoned_boundaries = false
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;
use webcal_cache::CacheConfig;
use webcal_core::{QueryOptions, RecurrenceResolver};
#[cfg(feature = "http")]
use webcal_providers::HttpConfig;

use crate::error::{ClientError, ClientResult};

/// Configuration for the webcal client.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Debug logging.
    pub debug: bool,

    /// Cache settings.
    pub cache: CacheSettings,

    /// HTTP settings.
    pub http: HttpSettings,

    /// Query settings.
    pub query: QuerySettings,
}

/// Where calendars are cached and for how long.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    /// Cache directory; defaults to the platform cache dir.
    pub dir: Option<PathBuf>,

    /// Hours a cached calendar is served before it is fetched again.
    pub staleness_hours: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            dir: None,
            staleness_hours: CacheConfig::DEFAULT_STALENESS_HOURS,
        }
    }
}

/// HTTP fetch settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpSettings {
    /// Request timeout in seconds.
    pub timeout_secs: u64,

    /// User agent override.
    pub user_agent: Option<String>,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            user_agent: None,
        }
    }
}

/// Query evaluation settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuerySettings {
    /// Cap on occurrences one recurring event contributes to a range.
    pub max_occurrences: usize,

    /// Compare zoned boundaries against all-day events by local date.
    pub truncate_zoned_boundaries: bool,
}

impl Default for QuerySettings {
    fn default() -> Self {
        Self {
            max_occurrences: RecurrenceResolver::DEFAULT_MAX_OCCURRENCES,
            truncate_zoned_boundaries: false,
        }
    }
}

impl ClientConfig {
    /// Loads configuration from `path`, or from the default path.
    ///
    /// A missing default file yields the default configuration; a missing
    /// explicit file is an error.
    pub fn load(path: Option<&Path>) -> ClientResult<Self> {
        match path {
            Some(path) if !path.exists() => Err(ClientError::ConfigNotFound(path.to_path_buf())),
            Some(path) => Self::load_from(path),
            None => {
                let path = Self::default_path();
                if path.exists() {
                    Self::load_from(&path)
                } else {
                    debug!(path = %path.display(), "No configuration file, using defaults");
                    Ok(Self::default())
                }
            }
        }
    }

    /// Loads configuration from a specific path.
    pub fn load_from(path: &Path) -> ClientResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ClientError::config(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::parse(&content)
    }

    /// Parses configuration from TOML text.
    pub fn parse(content: &str) -> ClientResult<Self> {
        toml::from_str(content)
            .map_err(|e| ClientError::config(format!("failed to parse config: {}", e)))
    }

    /// Checks values that parse but cannot work.
    pub fn validate(&self) -> ClientResult<()> {
        if self.http.timeout_secs == 0 {
            return Err(ClientError::config("http.timeout_secs must be positive"));
        }
        if self.query.max_occurrences == 0 {
            return Err(ClientError::config("query.max_occurrences must be positive"));
        }
        if let Some(dir) = &self.cache.dir
            && dir.as_os_str().is_empty()
        {
            return Err(ClientError::config("cache.dir must not be empty"));
        }
        Ok(())
    }

    /// Returns the default configuration file path.
    pub fn default_path() -> PathBuf {
        Self::default_config_dir().join("config.toml")
    }

    /// Returns the default configuration directory.
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("webcal")
    }

    /// Returns the default cache directory.
    pub fn default_cache_dir() -> PathBuf {
        dirs::cache_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("webcal")
    }

    /// Returns the cache configuration.
    pub fn cache_config(&self) -> CacheConfig {
        let dir = self.cache.dir.clone().unwrap_or_else(Self::default_cache_dir);
        CacheConfig::new(dir).with_staleness_hours(self.cache.staleness_hours)
    }

    /// Returns the HTTP source configuration.
    #[cfg(feature = "http")]
    pub fn http_config(&self) -> HttpConfig {
        let config = HttpConfig::default().with_timeout(Duration::from_secs(self.http.timeout_secs));
        match &self.http.user_agent {
            Some(agent) => config.with_user_agent(agent),
            None => config,
        }
    }

    /// Returns the query options.
    pub fn query_options(&self) -> QueryOptions {
        QueryOptions::default()
            .with_max_occurrences(self.query.max_occurrences)
            .with_zoned_truncation(self.query.truncate_zoned_boundaries)
    }

    /// Returns the staleness window.
    pub fn staleness(&self) -> Duration {
        self.cache_config().staleness
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let config = ClientConfig::parse("").unwrap();
        assert_eq!(config, ClientConfig::default());
        assert_eq!(config.cache.staleness_hours, 12);
        assert_eq!(config.http.timeout_secs, 30);
        assert_eq!(config.query.max_occurrences, 1000);
        assert!(!config.query.truncate_zoned_boundaries);
    }

    #[test]
    fn partial_sections() {
        let config = ClientConfig::parse(
            r#"
debug = true

[cache]
dir = "/var/cache/webcal"

[query]
truncate_zoned_boundaries = true
"#,
        )
        .unwrap();

        assert!(config.debug);
        assert_eq!(config.cache.dir, Some(PathBuf::from("/var/cache/webcal")));
        assert_eq!(config.cache.staleness_hours, 12);
        assert!(config.query.truncate_zoned_boundaries);
        assert_eq!(config.query.max_occurrences, 1000);

        let cache = config.cache_config();
        assert_eq!(cache.dir, PathBuf::from("/var/cache/webcal"));
        assert_eq!(cache.staleness, Duration::from_secs(12 * 3600));
        assert!(config.query_options().truncate_zoned_boundaries);
    }

    #[test]
    fn invalid_toml_is_config_error() {
        let err = ClientConfig::parse("[cache\nstaleness_hours = 1").unwrap_err();
        assert!(matches!(err, ClientError::Config(_)));
    }

    #[test]
    fn validate_rejects_zero_values() {
        let mut config = ClientConfig::default();
        assert!(config.validate().is_ok());

        config.http.timeout_secs = 0;
        assert!(config.validate().is_err());

        config.http.timeout_secs = 5;
        config.query.max_occurrences = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn explicit_missing_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        let err = ClientConfig::load(Some(&missing)).unwrap_err();
        assert!(matches!(err, ClientError::ConfigNotFound(_)));
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[cache]\nstaleness_hours = 2\n").unwrap();

        let config = ClientConfig::load(Some(&path)).unwrap();
        assert_eq!(config.staleness(), Duration::from_secs(7200));
    }

    #[test]
    fn round_trips_through_toml() {
        let mut config = ClientConfig::default();
        config.http.user_agent = Some("custom/1".to_string());
        let text = toml::to_string_pretty(&config).unwrap();
        assert_eq!(ClientConfig::parse(&text).unwrap(), config);
    }

    #[cfg(feature = "http")]
    #[test]
    fn http_config_applies_overrides() {
        let config = ClientConfig::parse("[http]\ntimeout_secs = 5\nuser_agent = \"x/1\"\n").unwrap();
        let http = config.http_config();
        assert_eq!(http.timeout, Duration::from_secs(5));
        assert_eq!(http.user_agent, "x/1");
    }
}
