//! iCalendar (RFC 5545) parsing.
//!
//! Converts a raw document into a [`webcal_core::Calendar`]: every `VEVENT`
//! becomes an [`Event`], every `VTIMEZONE` contributes its `TZID`.

use chrono::{DateTime, NaiveDateTime, Utc};
use chrono_tz::Tz;
use icalendar::{
    Calendar as IcsCalendar, CalendarComponent, CalendarDateTime, Component, DatePerhapsTime,
    Event as IcsEvent, EventLike, Property,
};
use tracing::{debug, warn};
use webcal_core::{Attendee, Calendar, Event, EventTime};

use crate::error::{ProviderError, ProviderResult};

/// Parses a calendar document.
///
/// # Errors
///
/// Returns a parse error if the bytes are not UTF-8, contain no
/// `VCALENDAR`, or are rejected by the iCalendar parser.
pub fn parse_calendar(bytes: &[u8]) -> ProviderResult<Calendar> {
    let text = std::str::from_utf8(bytes).map_err(|e| {
        ProviderError::parse("calendar is not valid UTF-8")
            .with_origin("ics")
            .with_source(e)
    })?;
    parse_calendar_str(text)
}

/// Parses a calendar document that is already text.
///
/// # Errors
///
/// See [`parse_calendar`].
pub fn parse_calendar_str(text: &str) -> ProviderResult<Calendar> {
    if !text.to_ascii_uppercase().contains("BEGIN:VCALENDAR") {
        return Err(ProviderError::parse("no VCALENDAR block found").with_origin("ics"));
    }

    let ics = text.parse::<IcsCalendar>().map_err(|e| {
        ProviderError::parse(format!("malformed iCalendar data: {e}")).with_origin("ics")
    })?;

    let mut events = Vec::new();
    let mut timezones = Vec::new();
    for component in ics.iter() {
        match component {
            CalendarComponent::Event(event) => events.push(convert_event(event, events.len())),
            CalendarComponent::Other(other) if other.component_kind() == "VTIMEZONE" => {
                if let Some(tzid) = other.property_value("TZID") {
                    timezones.push(tzid.to_string());
                }
            }
            _ => {}
        }
    }

    debug!(
        events = events.len(),
        timezones = timezones.len(),
        "Parsed calendar"
    );
    Ok(Calendar::new(events, timezones))
}

fn convert_event(event: &IcsEvent, position: usize) -> Event {
    let uid = match event.get_uid() {
        Some(uid) => uid.to_string(),
        None => {
            let uid = format!("no-uid-{position}");
            debug!(uid = %uid, "Event has no UID, using a placeholder");
            uid
        }
    };

    let mut converted = Event::new(uid);
    converted.start = event.get_start().map(convert_time);
    converted.end = event.get_end().map(convert_time);
    converted.summary = event.get_summary().map(str::to_string);
    converted.description = event.get_description().map(str::to_string);
    converted.location = event.get_location().map(str::to_string);
    converted.url = event.property_value("URL").map(str::to_string);
    converted.rrule = event.property_value("RRULE").map(str::to_string);
    converted.attendees = attendees(event);

    if let (Some(start), Some(end)) = (&converted.start, &converted.end)
        && start.granularity() != end.granularity()
    {
        warn!(
            uid = %converted.uid,
            start = %start.granularity(),
            end = %end.granularity(),
            "Event start and end have different granularity"
        );
    }

    debug!(
        uid = %converted.uid,
        summary = ?converted.summary,
        start = ?converted.start,
        rrule = ?converted.rrule,
        "Parsed event"
    );
    converted
}

fn convert_time(value: DatePerhapsTime) -> EventTime {
    match value {
        DatePerhapsTime::Date(date) => EventTime::date(date),
        DatePerhapsTime::DateTime(CalendarDateTime::Utc(dt)) => EventTime::utc(dt),
        DatePerhapsTime::DateTime(CalendarDateTime::Floating(dt)) => EventTime::floating(dt),
        DatePerhapsTime::DateTime(CalendarDateTime::WithTimezone { date_time, tzid }) => {
            zoned(date_time, &tzid)
        }
    }
}

/// Places a local time in the zone named by `tzid`.
///
/// Unknown zones and nonexistent local times fall back to UTC.
fn zoned(local: NaiveDateTime, tzid: &str) -> EventTime {
    let Some(tz) = resolve_tzid(tzid) else {
        warn!(tzid = %tzid, "Unknown time zone, treating time as UTC");
        return EventTime::utc(DateTime::<Utc>::from_naive_utc_and_offset(local, Utc));
    };
    EventTime::in_zone(local, tz).unwrap_or_else(|| {
        warn!(tzid = %tzid, local = %local, "Local time does not exist, treating it as UTC");
        EventTime::utc(DateTime::<Utc>::from_naive_utc_and_offset(local, Utc))
    })
}

/// Looks up an IANA zone, also accepting vendor prefixes such as
/// `/freeassociation.sourceforge.net/Europe/Berlin`.
pub fn resolve_tzid(tzid: &str) -> Option<Tz> {
    let tzid = tzid.trim().trim_matches('"');
    if let Ok(tz) = tzid.parse::<Tz>() {
        return Some(tz);
    }
    let segments: Vec<&str> = tzid.split('/').filter(|s| !s.is_empty()).collect();
    (1..segments.len())
        .map(|skip| segments[skip..].join("/"))
        .find_map(|candidate| candidate.parse::<Tz>().ok())
}

fn attendees(event: &IcsEvent) -> Vec<Attendee> {
    let multi = event
        .multi_properties()
        .get("ATTENDEE")
        .into_iter()
        .flatten();
    let single = event.properties().get("ATTENDEE");
    multi.chain(single).map(attendee).collect()
}

fn attendee(property: &Property) -> Attendee {
    Attendee::from_parameters(
        property.value(),
        property
            .params()
            .iter()
            .map(|(key, param)| (key.as_str(), param.value())),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderErrorCode;
    use chrono::{NaiveDate, TimeZone};
    use webcal_core::ParticipationStatus;

    const TEAM_ICS: &str = "BEGIN:VCALENDAR\r\n\
VERSION:2.0\r\n\
PRODID:-//Example//Team//EN\r\n\
BEGIN:VTIMEZONE\r\n\
TZID:Europe/Berlin\r\n\
BEGIN:STANDARD\r\n\
DTSTART:19701025T030000\r\n\
TZOFFSETFROM:+0200\r\n\
TZOFFSETTO:+0100\r\n\
RRULE:FREQ=YEARLY;BYMONTH=10;BYDAY=-1SU\r\n\
END:STANDARD\r\n\
BEGIN:DAYLIGHT\r\n\
DTSTART:19700329T020000\r\n\
TZOFFSETFROM:+0100\r\n\
TZOFFSETTO:+0200\r\n\
RRULE:FREQ=YEARLY;BYMONTH=3;BYDAY=-1SU\r\n\
END:DAYLIGHT\r\n\
END:VTIMEZONE\r\n\
BEGIN:VEVENT\r\n\
UID:standup@example.com\r\n\
DTSTART;TZID=Europe/Berlin:20240304T093000\r\n\
DTEND;TZID=Europe/Berlin:20240304T094500\r\n\
RRULE:FREQ=WEEKLY;BYDAY=MO,WE,FR\r\n\
SUMMARY:Standup\r\n\
LOCATION:Room 4\r\n\
URL:https://meet.example.com/standup\r\n\
ATTENDEE;CN=Jane Doe;ROLE=CHAIR;PARTSTAT=ACCEPTED:mailto:jane@example.com\r\n\
ATTENDEE;CN=Bob;RSVP=TRUE;PARTSTAT=NEEDS-ACTION:mailto:bob@example.com\r\n\
END:VEVENT\r\n\
BEGIN:VEVENT\r\n\
UID:offsite@example.com\r\n\
DTSTART;VALUE=DATE:20240315\r\n\
DTEND;VALUE=DATE:20240316\r\n\
SUMMARY:Offsite\r\n\
END:VEVENT\r\n\
BEGIN:VEVENT\r\n\
UID:release@example.com\r\n\
DTSTART:20240320T160000Z\r\n\
DTEND:20240320T170000Z\r\n\
SUMMARY:Release\r\n\
DESCRIPTION:Ship it\r\n\
END:VEVENT\r\n\
END:VCALENDAR\r\n";

    #[test]
    fn parses_events_in_order() {
        let calendar = parse_calendar(TEAM_ICS.as_bytes()).unwrap();
        assert_eq!(
            calendar.event_ids(),
            vec![
                "standup@example.com",
                "offsite@example.com",
                "release@example.com"
            ]
        );
        let indices: Vec<usize> = calendar.events().iter().map(|e| e.index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
    }

    #[test]
    fn collects_timezones() {
        let calendar = parse_calendar(TEAM_ICS.as_bytes()).unwrap();
        assert_eq!(calendar.timezones(), ["Europe/Berlin".to_string()]);
    }

    #[test]
    fn zoned_start_keeps_its_zone() {
        let calendar = parse_calendar(TEAM_ICS.as_bytes()).unwrap();
        let standup = calendar.event("standup@example.com").unwrap();

        let start = standup.start.unwrap();
        assert_eq!(start.to_string(), "2024-03-04T09:30:00+01:00");
        assert_eq!(
            standup.rrule.as_deref(),
            Some("FREQ=WEEKLY;BYDAY=MO,WE,FR")
        );
        assert_eq!(standup.summary.as_deref(), Some("Standup"));
        assert_eq!(standup.location.as_deref(), Some("Room 4"));
        assert_eq!(
            standup.url.as_deref(),
            Some("https://meet.example.com/standup")
        );
    }

    #[test]
    fn date_and_utc_starts() {
        let calendar = parse_calendar(TEAM_ICS.as_bytes()).unwrap();

        let offsite = calendar.event("offsite@example.com").unwrap();
        assert_eq!(
            offsite.start,
            Some(EventTime::date(NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()))
        );
        assert!(!offsite.has_rrule());

        let release = calendar.event("release@example.com").unwrap();
        assert_eq!(
            release.start,
            Some(EventTime::utc(
                Utc.with_ymd_and_hms(2024, 3, 20, 16, 0, 0).unwrap()
            ))
        );
        assert_eq!(release.description.as_deref(), Some("Ship it"));
    }

    #[test]
    fn attendees_snapshot_parameters() {
        let calendar = parse_calendar(TEAM_ICS.as_bytes()).unwrap();
        let standup = calendar.event("standup@example.com").unwrap();

        assert_eq!(standup.attendees.len(), 2);
        let jane = standup
            .attendees
            .iter()
            .find(|a| a.email() == "jane@example.com")
            .unwrap();
        assert_eq!(jane.name.as_deref(), Some("Jane Doe"));
        assert_eq!(jane.role.as_deref(), Some("CHAIR"));
        assert_eq!(jane.rsvp_status, Some(ParticipationStatus::Accepted));
        assert_eq!(jane.rsvp_request, None);

        let bob = standup
            .attendees
            .iter()
            .find(|a| a.email() == "bob@example.com")
            .unwrap();
        assert_eq!(bob.rsvp_request, Some(true));
        assert_eq!(bob.rsvp_status, Some(ParticipationStatus::NeedsAction));
    }

    #[test]
    fn parsed_calendar_answers_queries() {
        let calendar = parse_calendar(TEAM_ICS.as_bytes()).unwrap();
        // The all-day offsite needs truncation to accept a zoned boundary.
        let engine = webcal_core::QueryEngine::with_options(
            &calendar,
            webcal_core::QueryOptions::default().with_zoned_truncation(true),
        );
        let after = engine
            .events_after(&EventTime::utc(
                Utc.with_ymd_and_hms(2024, 3, 5, 0, 0, 0).unwrap(),
            ))
            .unwrap();
        let standup = after
            .iter()
            .find(|o| o.event.uid == "standup@example.com")
            .unwrap();
        assert_eq!(standup.at.to_string(), "2024-03-06T09:30:00+01:00");
    }

    #[test]
    fn rejects_non_utf8() {
        let err = parse_calendar(&[0xff, 0xfe, 0x00]).unwrap_err();
        assert_eq!(err.code(), ProviderErrorCode::ParseError);
    }

    #[test]
    fn rejects_missing_vcalendar() {
        let err = parse_calendar(b"<html>not a calendar</html>").unwrap_err();
        assert_eq!(err.code(), ProviderErrorCode::ParseError);
    }

    #[test]
    fn empty_calendar_is_fine() {
        let calendar =
            parse_calendar(b"BEGIN:VCALENDAR\r\nVERSION:2.0\r\nPRODID:-//x//y//EN\r\nEND:VCALENDAR\r\n")
                .unwrap();
        assert!(calendar.is_empty());
        assert!(calendar.timezones().is_empty());
    }

    #[test]
    fn resolves_prefixed_tzids() {
        assert_eq!(resolve_tzid("Europe/Berlin"), Some(chrono_tz::Europe::Berlin));
        assert_eq!(
            resolve_tzid("/freeassociation.sourceforge.net/Europe/Berlin"),
            Some(chrono_tz::Europe::Berlin)
        );
        assert_eq!(resolve_tzid("Mars/Olympus"), None);
    }

    #[test]
    fn unknown_tzid_falls_back_to_utc() {
        let local = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap();
        assert_eq!(
            zoned(local, "Mars/Olympus"),
            EventTime::utc(Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap())
        );
    }
}
