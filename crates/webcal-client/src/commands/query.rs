//! Occurrence query commands: `before`, `after` and `between`.

use std::io::Write;

use chrono::Utc;
use serde::Serialize;
use tracing::debug;
use webcal_cache::{CacheStore, Clock};
use webcal_core::{EventTime, Occurrences};
use webcal_providers::CalendarSource;

use crate::cli::{OutputArgs, SourceArgs};
use crate::error::{ClientError, ClientResult};
use crate::webcal::WebCal;

/// The time window a query asks about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Window {
    /// Nearest occurrence at or before the instant.
    Before(EventTime),
    /// Nearest occurrence at or after the instant.
    After(EventTime),
    /// All occurrences in the inclusive range.
    Between(EventTime, EventTime),
}

/// Parses a command-line instant; `now` is the current UTC time.
pub fn parse_when(input: &str) -> ClientResult<EventTime> {
    if input.trim().eq_ignore_ascii_case("now") {
        return Ok(EventTime::utc(Utc::now()));
    }
    input
        .parse()
        .map_err(|e| ClientError::invalid_argument(format!("{e}")))
}

/// Loads the calendar, evaluates `window` and writes the result to `out`.
pub fn run<S, St, C, W>(
    webcal: &mut WebCal<S, St, C>,
    source: &SourceArgs,
    window: Window,
    output: OutputArgs,
    out: &mut W,
) -> ClientResult<()>
where
    S: CalendarSource,
    St: CacheStore,
    C: Clock,
    W: Write,
{
    let calendar = webcal.calendar(&super::request(source))?;
    let engine = webcal.query(&calendar);
    let mut found = match window {
        Window::Before(at) => engine.events_before(&at)?,
        Window::After(at) => engine.events_after(&at)?,
        Window::Between(start, end) => engine.events_between(&start, &end)?,
    };
    found.sort_chronologically();
    debug!(window = ?window, count = found.len(), "Query evaluated");

    let rendered = if output.json {
        render_json(&found)?
    } else {
        render_text(&found)
    };
    if !rendered.is_empty() {
        writeln!(out, "{rendered}")?;
    }
    Ok(())
}

/// One line per occurrence: `<instant>  <summary>`, the UID standing in
/// for a missing summary.
pub fn render_text(occurrences: &Occurrences<'_>) -> String {
    occurrences
        .iter()
        .map(|o| {
            let title = o.event.summary.as_deref().unwrap_or(&o.event.uid);
            format!("{}  {}", o.at, title)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[derive(Debug, Serialize)]
struct OccurrenceRecord<'a> {
    uid: &'a str,
    summary: Option<&'a str>,
    location: Option<&'a str>,
    url: Option<&'a str>,
    occurrence: EventTime,
}

/// A JSON array of `{uid, summary, location, url, occurrence}` objects.
pub fn render_json(occurrences: &Occurrences<'_>) -> ClientResult<String> {
    let records: Vec<_> = occurrences
        .iter()
        .map(|o| OccurrenceRecord {
            uid: &o.event.uid,
            summary: o.event.summary.as_deref(),
            location: o.event.location.as_deref(),
            url: o.event.url.as_deref(),
            occurrence: o.at,
        })
        .collect();
    Ok(serde_json::to_string_pretty(&records)?)
}
