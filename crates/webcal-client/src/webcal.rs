//! The `WebCal` facade: fetch a calendar through the cache and query it.

use std::time::Duration;

use tracing::{debug, instrument};
use webcal_cache::{CacheStore, Clock, ConnectionIdentity, FileStore, SystemClock, TimeBoxedCache};
use webcal_core::{Calendar, QueryEngine, QueryOptions};
#[cfg(feature = "http")]
use webcal_providers::HttpSource;
use webcal_providers::{
    CalendarSource, Credentials, FileSource, ProviderError, SourceRouter, parse_calendar_str,
};

use crate::config::ClientConfig;
use crate::error::ClientResult;

/// What calendar to load and how.
#[derive(Debug, Clone)]
pub struct CalendarRequest {
    /// Locator of the document (URL or path).
    pub locator: String,
    /// Optional credentials; the login takes part in the cache identity.
    pub credentials: Option<Credentials>,
    /// Fetch even when the cached copy is fresh.
    pub force_refresh: bool,
    /// Staleness window override.
    pub staleness: Option<Duration>,
}

impl CalendarRequest {
    /// Creates a request for `locator` with default cache behavior.
    pub fn new(locator: impl Into<String>) -> Self {
        Self {
            locator: locator.into(),
            credentials: None,
            force_refresh: false,
            staleness: None,
        }
    }

    /// Builder method to set credentials.
    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Builder method to bypass cache freshness.
    pub fn with_force_refresh(mut self, force: bool) -> Self {
        self.force_refresh = force;
        self
    }

    /// Builder method to override the staleness window.
    pub fn with_staleness(mut self, staleness: Duration) -> Self {
        self.staleness = Some(staleness);
        self
    }

    /// Returns the cache identity for this request.
    pub fn identity(&self) -> ConnectionIdentity {
        ConnectionIdentity::new(
            &self.locator,
            self.credentials.as_ref().map(Credentials::login),
        )
    }
}

/// Loads calendars from a source through a time-boxed cache.
#[derive(Debug)]
pub struct WebCal<S, St, C = SystemClock> {
    source: S,
    cache: TimeBoxedCache<St, C>,
    options: QueryOptions,
}

impl WebCal<SourceRouter, FileStore, SystemClock> {
    /// Builds the default client: scheme-routed sources and a file cache.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn from_config(config: &ClientConfig) -> ClientResult<Self> {
        #[cfg(feature = "http")]
        let source = SourceRouter::new(HttpSource::new(config.http_config())?, FileSource::new());
        #[cfg(not(feature = "http"))]
        let source = SourceRouter::new(FileSource::new());

        let cache = TimeBoxedCache::open(&config.cache_config());
        Ok(Self::new(source, cache, config.query_options()))
    }
}

impl<S: CalendarSource, St: CacheStore, C: Clock> WebCal<S, St, C> {
    /// Creates a client from its parts.
    pub fn new(source: S, cache: TimeBoxedCache<St, C>, options: QueryOptions) -> Self {
        Self {
            source,
            cache,
            options,
        }
    }

    /// Returns the query options.
    pub fn options(&self) -> &QueryOptions {
        &self.options
    }

    /// Returns the cache.
    pub fn cache(&self) -> &TimeBoxedCache<St, C> {
        &self.cache
    }

    /// Returns the parsed calendar for `request`.
    ///
    /// Fresh cached documents are parsed without touching the source. A
    /// fetched document is only cached once it parses.
    ///
    /// # Errors
    ///
    /// Returns a provider error if fetching or parsing fails.
    #[instrument(level = "debug", skip_all, fields(locator = %request.locator))]
    pub fn calendar(&mut self, request: &CalendarRequest) -> ClientResult<Calendar> {
        let identity = request.identity();
        let source = &self.source;
        let mut fetched = None;

        let refresh = || {
            let bytes = source.fetch(&request.locator, request.credentials.as_ref())?;
            let text = String::from_utf8(bytes).map_err(|e| {
                ProviderError::parse("calendar is not valid UTF-8")
                    .with_origin(source.name())
                    .with_source(e)
            })?;
            fetched = Some(parse_calendar_str(&text)?);
            Ok::<_, ProviderError>(text)
        };

        let document = if request.force_refresh {
            self.cache.refresh(&identity, refresh)?
        } else {
            let staleness = request.staleness.unwrap_or(self.cache.staleness());
            self.cache.get_or_refresh(&identity, refresh, staleness)?
        };

        match fetched {
            Some(calendar) => Ok(calendar),
            None => {
                debug!(identity = %identity, "Parsing cached calendar");
                Ok(parse_calendar_str(&document)?)
            }
        }
    }

    /// Returns a query engine over `calendar` with this client's options.
    pub fn query<'c>(&self, calendar: &'c Calendar) -> QueryEngine<'c> {
        QueryEngine::with_options(calendar, self.options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeDelta, TimeZone, Utc};
    use std::cell::Cell;
    use webcal_cache::{ManualClock, MemoryStore};
    use webcal_core::EventTime;
    use webcal_providers::{ProviderErrorCode, ProviderResult};

    const ICS: &str = "BEGIN:VCALENDAR\r\n\
VERSION:2.0\r\n\
PRODID:-//test//EN\r\n\
BEGIN:VEVENT\r\n\
UID:daily@example.com\r\n\
SUMMARY:Daily\r\n\
DTSTART;VALUE=DATE:20240301\r\n\
RRULE:FREQ=DAILY;COUNT=3\r\n\
END:VEVENT\r\n\
END:VCALENDAR\r\n";

    struct FakeSource {
        body: &'static str,
        calls: Cell<u32>,
    }

    impl FakeSource {
        fn new(body: &'static str) -> Self {
            Self {
                body,
                calls: Cell::new(0),
            }
        }
    }

    impl CalendarSource for FakeSource {
        fn name(&self) -> &'static str {
            "fake"
        }

        fn fetch(&self, _locator: &str, _credentials: Option<&Credentials>) -> ProviderResult<Vec<u8>> {
            self.calls.set(self.calls.get() + 1);
            if self.body.is_empty() {
                return Err(ProviderError::network("connection refused").with_origin("fake"));
            }
            Ok(self.body.as_bytes().to_vec())
        }
    }

    fn client(body: &'static str) -> WebCal<FakeSource, MemoryStore, ManualClock> {
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap());
        WebCal::new(
            FakeSource::new(body),
            TimeBoxedCache::new(MemoryStore::new(), clock),
            QueryOptions::default(),
        )
    }

    #[test]
    fn second_load_is_served_from_cache() {
        let mut webcal = client(ICS);
        let request = CalendarRequest::new("https://example.com/team.ics");

        let first = webcal.calendar(&request).unwrap();
        let second = webcal.calendar(&request).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.event_ids(), vec!["daily@example.com"]);
        assert_eq!(webcal.source.calls.get(), 1);
    }

    #[test]
    fn force_refresh_fetches_again() {
        let mut webcal = client(ICS);
        let request = CalendarRequest::new("https://example.com/team.ics");
        webcal.calendar(&request).unwrap();
        webcal
            .calendar(&request.clone().with_force_refresh(true))
            .unwrap();
        assert_eq!(webcal.source.calls.get(), 2);
    }

    #[test]
    fn stale_entry_is_fetched_again() {
        let mut webcal = client(ICS);
        let request =
            CalendarRequest::new("https://example.com/team.ics").with_staleness(Duration::from_secs(3600));
        webcal.calendar(&request).unwrap();
        webcal.cache().clock().advance(TimeDelta::minutes(61));
        webcal.calendar(&request).unwrap();
        assert_eq!(webcal.source.calls.get(), 2);
    }

    #[test]
    fn login_changes_identity() {
        let mut webcal = client(ICS);
        let anonymous = CalendarRequest::new("https://example.com/team.ics");
        let alice = anonymous.clone().with_credentials(Credentials::new("alice"));
        assert_ne!(anonymous.identity(), alice.identity());

        webcal.calendar(&anonymous).unwrap();
        webcal.calendar(&alice).unwrap();
        assert_eq!(webcal.source.calls.get(), 2);
    }

    #[test]
    fn unparseable_document_is_not_cached() {
        let mut webcal = client("this is not a calendar");
        let request = CalendarRequest::new("https://example.com/team.ics");

        let err = webcal.calendar(&request).unwrap_err();
        assert!(matches!(
            err,
            crate::error::ClientError::Provider(ref e) if e.code() == ProviderErrorCode::ParseError
        ));
        assert!(webcal.cache().store().is_empty());
    }

    #[test]
    fn fetch_error_propagates() {
        let mut webcal = client("");
        let err = webcal
            .calendar(&CalendarRequest::new("https://example.com/team.ics"))
            .unwrap_err();
        assert!(err.to_string().contains("connection refused"));
    }

    #[test]
    fn query_uses_client_options() {
        let mut webcal = client(ICS);
        let calendar = webcal
            .calendar(&CalendarRequest::new("https://example.com/team.ics"))
            .unwrap();
        let start = EventTime::date(chrono::NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        let end = EventTime::date(chrono::NaiveDate::from_ymd_opt(2024, 3, 31).unwrap());
        let found = webcal.query(&calendar).events_between(&start, &end).unwrap();
        assert_eq!(found.len(), 3);
    }
}
