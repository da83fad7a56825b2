//! Calendar inspection commands: `timezones` and `events`.

use std::io::Write;

use serde::Serialize;
use webcal_cache::{CacheStore, Clock};
use webcal_core::{Calendar, EventTime};
use webcal_providers::CalendarSource;

use crate::cli::{OutputArgs, SourceArgs};
use crate::error::ClientResult;
use crate::webcal::WebCal;

/// Prints the TZIDs of the calendar's `VTIMEZONE` blocks, one per line.
pub fn timezones<S, St, C, W>(
    webcal: &mut WebCal<S, St, C>,
    source: &SourceArgs,
    out: &mut W,
) -> ClientResult<()>
where
    S: CalendarSource,
    St: CacheStore,
    C: Clock,
    W: Write,
{
    let calendar = webcal.calendar(&super::request(source))?;
    for tzid in calendar.timezones() {
        writeln!(out, "{tzid}")?;
    }
    Ok(())
}

/// Prints the calendar's events in document order.
pub fn events<S, St, C, W>(
    webcal: &mut WebCal<S, St, C>,
    source: &SourceArgs,
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
    let rendered = if output.json {
        render_events_json(&calendar)?
    } else {
        render_events_text(&calendar)
    };
    if !rendered.is_empty() {
        writeln!(out, "{rendered}")?;
    }
    Ok(())
}

/// `<uid>  <summary>` per event, with a trailing marker for repeating ones.
pub fn render_events_text(calendar: &Calendar) -> String {
    calendar
        .events()
        .iter()
        .map(|e| {
            let mut line = format!("{}  {}", e.uid, e.title());
            if e.has_rrule() {
                line.push_str(" (repeats)");
            }
            line.trim_end().to_string()
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[derive(Debug, Serialize)]
struct EventRecord<'a> {
    uid: &'a str,
    summary: Option<&'a str>,
    start: Option<EventTime>,
    end: Option<EventTime>,
    rrule: Option<&'a str>,
    attendees: Vec<&'a str>,
}

fn render_events_json(calendar: &Calendar) -> ClientResult<String> {
    let records: Vec<_> = calendar
        .events()
        .iter()
        .map(|e| EventRecord {
            uid: &e.uid,
            summary: e.summary.as_deref(),
            start: e.start,
            end: e.end,
            rrule: e.rrule.as_deref(),
            attendees: e.attendees.iter().map(|a| a.email()).collect(),
        })
        .collect();
    Ok(serde_json::to_string_pretty(&records)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing;

    #[test]
    fn lists_timezones() {
        let mut webcal = testing::webcal();
        let mut out = Vec::new();
        timezones(&mut webcal, &testing::source(), &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "Europe/Berlin\n");
    }

    #[test]
    fn lists_events() {
        let mut webcal = testing::webcal();
        let mut out = Vec::new();
        events(&mut webcal, &testing::source(), OutputArgs::default(), &mut out).unwrap();
        insta::assert_snapshot!(String::from_utf8(out).unwrap().trim_end(), @r"
        standup@example.com  Standup (repeats)
        release@example.com  Release
        untitled@example.com
        ");
    }

    #[test]
    fn lists_events_as_json() {
        let mut webcal = testing::webcal();
        let mut out = Vec::new();
        events(&mut webcal, &testing::source(), OutputArgs { json: true }, &mut out).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        let records = value.as_array().unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0]["uid"], "standup@example.com");
        assert_eq!(records[0]["rrule"], "FREQ=WEEKLY;COUNT=3");
        assert_eq!(records[0]["start"], "2024-03-04T09:00:00+00:00");
        assert_eq!(records[0]["end"], "2024-03-04T09:15:00+00:00");
        assert_eq!(records[2]["summary"], serde_json::Value::Null);
    }
}
