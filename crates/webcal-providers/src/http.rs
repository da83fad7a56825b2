//! HTTP(S) calendar source.
//!
//! `webcal://` and `webcals://` locators are fetched over HTTPS.

use std::time::Duration;

use reqwest::StatusCode;
use reqwest::blocking::{Client, Response};
use tracing::{debug, trace, warn};
use url::Url;

use crate::error::{ProviderError, ProviderResult};
use crate::source::{CalendarSource, Credentials};

/// Configuration for the HTTP source.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Request timeout.
    pub timeout: Duration,
    /// User agent string.
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(Self::DEFAULT_TIMEOUT_SECS),
            user_agent: format!("webcal/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl HttpConfig {
    /// Default timeout in seconds.
    pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the user agent.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

/// Fetches calendars with a blocking HTTP client.
#[derive(Debug)]
pub struct HttpSource {
    client: Client,
    config: HttpConfig,
}

impl HttpSource {
    /// Creates a new HTTP source.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the HTTP client cannot be built.
    pub fn new(config: HttpConfig) -> ProviderResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| {
                ProviderError::configuration(format!("failed to create HTTP client: {e}"))
                    .with_origin("http")
                    .with_source(e)
            })?;

        Ok(Self { client, config })
    }

    /// Returns the configuration.
    pub fn config(&self) -> &HttpConfig {
        &self.config
    }

    fn read_body(response: Response) -> ProviderResult<Vec<u8>> {
        let status = response.status();
        trace!(status = %status, "Received response");

        match status {
            s if s.is_success() => response
                .bytes()
                .map(|b| b.to_vec())
                .map_err(|e| ProviderError::network(format!("failed to read response: {e}"))),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(ProviderError::access_denied(
                format!("server refused access ({status})"),
            )),
            StatusCode::NOT_FOUND => Err(ProviderError::not_found("calendar not found")),
            s if s.is_server_error() => Err(ProviderError::server(format!("server error ({s})"))),
            s => {
                warn!(status = %s, "Unexpected response status");
                Err(ProviderError::invalid_response(format!("unexpected status {s}")))
            }
        }
    }
}

/// Rewrites `webcal`/`webcals` to `https`; `http` and `https` pass through.
pub fn normalize_locator(locator: &str) -> ProviderResult<Url> {
    let parse = |text: &str| {
        Url::parse(text)
            .map_err(|e| ProviderError::invalid_locator(format!("cannot parse `{locator}`: {e}")))
    };
    let url = parse(locator)?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        // `Url::set_scheme` refuses to turn a non-special scheme into https.
        "webcal" | "webcals" => match locator.split_once("://") {
            Some((_, rest)) => parse(&format!("https://{rest}")),
            None => Err(ProviderError::invalid_locator(format!(
                "`{locator}` has no host"
            ))),
        },
        s => Err(ProviderError::invalid_locator(format!(
            "unsupported scheme `{s}` for HTTP"
        ))),
    }
}

impl CalendarSource for HttpSource {
    fn name(&self) -> &'static str {
        "http"
    }

    fn fetch(&self, locator: &str, credentials: Option<&Credentials>) -> ProviderResult<Vec<u8>> {
        let url = normalize_locator(locator).map_err(|e| e.with_origin("http"))?;
        if let Some(creds) = credentials {
            debug!(login = %creds.login(), "Credentials are not sent to the server");
        }

        debug!(url = %url, "Fetching calendar");
        let response = self.client.get(url.clone()).send().map_err(|e| {
            ProviderError::network(format!("request to {url} failed: {e}"))
                .with_origin("http")
                .with_source(e)
        })?;

        let body = Self::read_body(response).map_err(|e| e.with_origin("http"))?;
        debug!(url = %url, bytes = body.len(), "Fetched calendar");
        Ok(body)
    }
}
