//! Calendar, event and attendee types.
//!
//! This module provides the structured view of a parsed calendar:
//! - [`Calendar`]: the events and time zone names of one document
//! - [`Event`]: a single `VEVENT`, possibly carrying a repetition rule
//! - [`Attendee`]: a fixed snapshot of one `ATTENDEE` property

use serde::Serialize;

use crate::error::CoreResult;
use crate::query::{Occurrences, QueryEngine};
use crate::time::EventTime;

/// The participation status of an attendee (`PARTSTAT`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticipationStatus {
    /// The attendee has not responded.
    NeedsAction,
    /// The attendee has accepted the invitation.
    Accepted,
    /// The attendee has declined the invitation.
    Declined,
    /// The attendee has tentatively accepted.
    Tentative,
    /// The attendee delegated participation.
    Delegated,
    /// Any other (extension) value, kept verbatim.
    Other(String),
}

impl ParticipationStatus {
    /// Parses a `PARTSTAT` parameter value.
    pub fn parse(value: &str) -> Self {
        match value.to_ascii_uppercase().as_str() {
            "NEEDS-ACTION" => Self::NeedsAction,
            "ACCEPTED" => Self::Accepted,
            "DECLINED" => Self::Declined,
            "TENTATIVE" => Self::Tentative,
            "DELEGATED" => Self::Delegated,
            _ => Self::Other(value.to_string()),
        }
    }
}

/// An attendee of an event.
///
/// Built once from the property value and its parameters; the parameter
/// map itself is not retained.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Attendee {
    /// The calendar address, usually a `mailto:` URI.
    pub address: String,
    /// Common name (`CN`).
    pub name: Option<String>,
    /// Participation role (`ROLE`), e.g. `REQ-PARTICIPANT`.
    pub role: Option<String>,
    /// Whether a reply is requested (`RSVP`).
    pub rsvp_request: Option<bool>,
    /// Participation status (`PARTSTAT`).
    pub rsvp_status: Option<ParticipationStatus>,
}

impl Attendee {
    /// Creates an attendee with only an address.
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            name: None,
            role: None,
            rsvp_request: None,
            rsvp_status: None,
        }
    }

    /// Creates an attendee from an address and its property parameters.
    ///
    /// Only `CN`, `ROLE`, `RSVP` and `PARTSTAT` are copied; parameter names
    /// match case-insensitively and unknown parameters are ignored.
    pub fn from_parameters<'p, I>(address: impl Into<String>, params: I) -> Self
    where
        I: IntoIterator<Item = (&'p str, &'p str)>,
    {
        let mut attendee = Self::new(address);
        for (key, value) in params {
            match key.to_ascii_uppercase().as_str() {
                "CN" => attendee.name = Some(value.to_string()),
                "ROLE" => attendee.role = Some(value.to_string()),
                "RSVP" => attendee.rsvp_request = Some(value.eq_ignore_ascii_case("TRUE")),
                "PARTSTAT" => attendee.rsvp_status = Some(ParticipationStatus::parse(value)),
                _ => {}
            }
        }
        attendee
    }

    /// Returns the address without a `mailto:` scheme.
    pub fn email(&self) -> &str {
        match self.address.get(..7) {
            Some(scheme) if scheme.eq_ignore_ascii_case("mailto:") => &self.address[7..],
            _ => &self.address,
        }
    }
}

/// A calendar event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Event {
    /// Position of the event inside its [`Calendar`].
    pub index: usize,
    /// The event UID (unique within its calendar).
    pub uid: String,
    /// When the event (or its first occurrence) starts.
    pub start: Option<EventTime>,
    /// When the event ends.
    pub end: Option<EventTime>,
    /// The event title.
    pub summary: Option<String>,
    /// Long description.
    pub description: Option<String>,
    /// Where the event takes place.
    pub location: Option<String>,
    /// Associated URL.
    pub url: Option<String>,
    /// The raw `RRULE` value, if the event repeats.
    pub rrule: Option<String>,
    /// The event attendees in document order.
    pub attendees: Vec<Attendee>,
}

impl Event {
    /// Creates an event with only a UID.
    pub fn new(uid: impl Into<String>) -> Self {
        Self {
            index: 0,
            uid: uid.into(),
            start: None,
            end: None,
            summary: None,
            description: None,
            location: None,
            url: None,
            rrule: None,
            attendees: Vec::new(),
        }
    }

    /// Builder method to set the start.
    pub fn with_start(mut self, start: EventTime) -> Self {
        self.start = Some(start);
        self
    }

    /// Builder method to set the summary.
    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    /// Builder method to set the repetition rule.
    pub fn with_rrule(mut self, rrule: impl Into<String>) -> Self {
        self.rrule = Some(rrule.into());
        self
    }

    /// Returns true if the event carries a repetition rule.
    ///
    /// The rule may still turn out to be invalid when resolved.
    pub fn has_rrule(&self) -> bool {
        self.rrule.is_some()
    }

    /// Returns the summary or an empty string.
    pub fn title(&self) -> &str {
        self.summary.as_deref().unwrap_or("")
    }
}

/// A parsed calendar document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Calendar {
    events: Vec<Event>,
    timezones: Vec<String>,
}

impl Calendar {
    /// Creates a calendar, assigning each event its position.
    pub fn new(events: Vec<Event>, timezones: Vec<String>) -> Self {
        let events = events
            .into_iter()
            .enumerate()
            .map(|(index, mut event)| {
                event.index = index;
                event
            })
            .collect();
        Self { events, timezones }
    }

    /// Returns all events in document order.
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Returns the UIDs of all events in document order.
    pub fn event_ids(&self) -> Vec<&str> {
        self.events.iter().map(|e| e.uid.as_str()).collect()
    }

    /// Looks up an event by UID.
    pub fn event(&self, uid: &str) -> Option<&Event> {
        self.events.iter().find(|e| e.uid == uid)
    }

    /// Looks up an event by its position.
    pub fn event_at(&self, index: usize) -> Option<&Event> {
        self.events.get(index)
    }

    /// Returns the TZIDs of all `VTIMEZONE` blocks in document order.
    ///
    /// Empty when the document defines no time zones.
    pub fn timezones(&self) -> &[String] {
        &self.timezones
    }

    /// Returns the number of events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Returns true if the calendar has no events.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Returns a query engine over this calendar with default options.
    pub fn query(&self) -> QueryEngine<'_> {
        QueryEngine::new(self)
    }

    /// Nearest occurrence at or before `at` for every event.
    pub fn events_before(&self, at: &EventTime) -> CoreResult<Occurrences<'_>> {
        self.query().events_before(at)
    }

    /// Nearest occurrence at or after `at` for every event.
    pub fn events_after(&self, at: &EventTime) -> CoreResult<Occurrences<'_>> {
        self.query().events_after(at)
    }

    /// All occurrences within `[start, end]`.
    pub fn events_between(&self, start: &EventTime, end: &EventTime) -> CoreResult<Occurrences<'_>> {
        self.query().events_between(start, end)
    }
}
