//! Time values for calendar events and queries.
//!
//! iCalendar distinguishes three kinds of start values, and so does
//! [`EventTime`]:
//! - **Date**: a calendar date without time of day (all-day events)
//! - **Floating**: a wall-clock date-time not bound to any time zone
//! - **Zoned**: an instant with a time zone attached
//!
//! The same type is used for event starts, query boundaries and the
//! occurrence instants returned by queries. Values of different
//! [`Granularity`] are never silently compared with each other.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Serialize, Serializer};

use crate::error::CoreError;

/// The granularity of an [`EventTime`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Granularity {
    /// Date only.
    Date,
    /// Date-time without a time zone.
    Floating,
    /// Date-time bound to a time zone.
    Zoned,
}

impl Granularity {
    /// Returns a human-readable name for this granularity.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Date => "date",
            Self::Floating => "floating date-time",
            Self::Zoned => "zoned date-time",
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A date or date-time as found in calendar data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventTime {
    /// A calendar date (all-day).
    Date(NaiveDate),
    /// A naive date-time (iCalendar "floating" time).
    Floating(NaiveDateTime),
    /// A date-time in a specific time zone.
    Zoned(DateTime<Tz>),
}

impl EventTime {
    /// Creates a date-only time.
    pub fn date(date: NaiveDate) -> Self {
        Self::Date(date)
    }

    /// Creates a floating date-time.
    pub fn floating(dt: NaiveDateTime) -> Self {
        Self::Floating(dt)
    }

    /// Creates a zoned date-time.
    pub fn zoned(dt: DateTime<Tz>) -> Self {
        Self::Zoned(dt)
    }

    /// Creates a zoned date-time in UTC.
    pub fn utc(dt: DateTime<Utc>) -> Self {
        Self::Zoned(dt.with_timezone(&Tz::UTC))
    }

    /// Interprets a wall-clock time in the given zone.
    ///
    /// Returns `None` when the local time does not exist in that zone
    /// (a DST gap). Ambiguous times resolve to the earlier instant.
    pub fn in_zone(local: NaiveDateTime, tz: Tz) -> Option<Self> {
        tz.from_local_datetime(&local).earliest().map(Self::Zoned)
    }

    /// Returns the granularity of this value.
    pub fn granularity(&self) -> Granularity {
        match self {
            Self::Date(_) => Granularity::Date,
            Self::Floating(_) => Granularity::Floating,
            Self::Zoned(_) => Granularity::Zoned,
        }
    }

    /// Returns the calendar date of this value, in its own zone for
    /// zoned values.
    pub fn date_naive(&self) -> NaiveDate {
        match self {
            Self::Date(d) => *d,
            Self::Floating(dt) => dt.date(),
            Self::Zoned(dt) => dt.date_naive(),
        }
    }

    /// Compares two values of the same granularity.
    ///
    /// Returns `None` when the granularities differ.
    pub fn try_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Self::Date(a), Self::Date(b)) => Some(a.cmp(b)),
            (Self::Floating(a), Self::Floating(b)) => Some(a.cmp(b)),
            (Self::Zoned(a), Self::Zoned(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    /// A key for ordering values of mixed granularity for display.
    ///
    /// Dates sort at midnight and zoned values by their UTC wall clock.
    pub fn sort_key(&self) -> NaiveDateTime {
        match self {
            Self::Date(d) => d.and_time(NaiveTime::MIN),
            Self::Floating(dt) => *dt,
            Self::Zoned(dt) => dt.naive_utc(),
        }
    }
}

impl fmt::Display for EventTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Self::Floating(dt) => write!(f, "{}", dt.format("%Y-%m-%dT%H:%M:%S")),
            Self::Zoned(dt) => write!(f, "{}", dt.format("%Y-%m-%dT%H:%M:%S%:z")),
        }
    }
}

impl Serialize for EventTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Parses the textual forms accepted on the command line:
///
/// - `2024-03-01` → [`EventTime::Date`]
/// - `2024-03-01T10:00` or `2024-03-01T10:00:00` → [`EventTime::Floating`]
/// - `2024-03-01T10:00:00+01:00` (RFC 3339) → [`EventTime::Zoned`] in UTC
/// - `2024-03-01T10:00:00[Europe/Berlin]` → [`EventTime::Zoned`] in that zone
impl FromStr for EventTime {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();

        if let Some((local, zone)) = s.strip_suffix(']').and_then(|rest| rest.split_once('[')) {
            let tz: Tz = zone
                .parse()
                .map_err(|_| CoreError::invalid_time(s, format!("unknown time zone `{zone}`")))?;
            let local = parse_naive_datetime(local)
                .ok_or_else(|| CoreError::invalid_time(s, "expected YYYY-MM-DDTHH:MM[:SS]"))?;
            return Self::in_zone(local, tz)
                .ok_or_else(|| CoreError::invalid_time(s, "local time does not exist in zone"));
        }

        if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
            return Ok(Self::Date(date));
        }

        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Ok(Self::utc(dt.with_timezone(&Utc)));
        }

        parse_naive_datetime(s)
            .map(Self::Floating)
            .ok_or_else(|| CoreError::invalid_time(s, "unrecognized date or date-time"))
    }
}

fn parse_naive_datetime(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M"))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn granularity_of_each_variant() {
        let d = date(2024, 3, 1);
        assert_eq!(EventTime::date(d).granularity(), Granularity::Date);
        assert_eq!(
            EventTime::floating(d.and_hms_opt(9, 0, 0).unwrap()).granularity(),
            Granularity::Floating
        );
        assert_eq!(
            EventTime::utc(Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()).granularity(),
            Granularity::Zoned
        );
    }

    #[test]
    fn try_cmp_same_granularity() {
        let a = EventTime::date(date(2024, 3, 1));
        let b = EventTime::date(date(2024, 3, 2));
        assert_eq!(a.try_cmp(&b), Some(Ordering::Less));
        assert_eq!(b.try_cmp(&a), Some(Ordering::Greater));
        assert_eq!(a.try_cmp(&a), Some(Ordering::Equal));
    }

    #[test]
    fn try_cmp_mixed_granularity_is_none() {
        let a = EventTime::date(date(2024, 3, 1));
        let b = EventTime::utc(Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap());
        assert_eq!(a.try_cmp(&b), None);
    }

    #[test]
    fn zoned_compare_by_instant() {
        let berlin: Tz = "Europe/Berlin".parse().unwrap();
        let local = date(2024, 3, 1).and_hms_opt(10, 0, 0).unwrap();
        let in_berlin = EventTime::in_zone(local, berlin).unwrap();
        let same_in_utc = EventTime::utc(Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap());
        assert_eq!(in_berlin.try_cmp(&same_in_utc), Some(Ordering::Equal));
    }

    #[test]
    fn parse_date() {
        let t: EventTime = "2024-03-01".parse().unwrap();
        assert_eq!(t, EventTime::date(date(2024, 3, 1)));
    }

    #[test]
    fn parse_floating() {
        let t: EventTime = "2024-03-01T10:30".parse().unwrap();
        assert_eq!(
            t,
            EventTime::floating(date(2024, 3, 1).and_hms_opt(10, 30, 0).unwrap())
        );
    }

    #[test]
    fn parse_rfc3339_is_zoned() {
        let t: EventTime = "2024-03-01T10:00:00+02:00".parse().unwrap();
        assert_eq!(
            t,
            EventTime::utc(Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap())
        );
    }

    #[test]
    fn parse_bracketed_zone() {
        let t: EventTime = "2024-07-01T10:00[Europe/Berlin]".parse().unwrap();
        assert_eq!(t.to_string(), "2024-07-01T10:00:00+02:00");
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!("yesterday-ish".parse::<EventTime>().is_err());
        assert!("2024-03-01T10:00[Mars/Olympus]".parse::<EventTime>().is_err());
    }

    #[test]
    fn display_forms() {
        assert_eq!(EventTime::date(date(2024, 3, 1)).to_string(), "2024-03-01");
        assert_eq!(
            EventTime::floating(date(2024, 3, 1).and_hms_opt(8, 5, 0).unwrap()).to_string(),
            "2024-03-01T08:05:00"
        );
        assert_eq!(
            EventTime::utc(Utc.with_ymd_and_hms(2024, 3, 1, 8, 5, 0).unwrap()).to_string(),
            "2024-03-01T08:05:00+00:00"
        );
    }

    #[test]
    fn serializes_as_string() {
        let json = serde_json::to_string(&EventTime::date(date(2024, 3, 1))).unwrap();
        assert_eq!(json, "\"2024-03-01\"");
    }

    #[test]
    fn sort_key_orders_mixed_values() {
        let d = EventTime::date(date(2024, 3, 2));
        let z = EventTime::utc(Utc.with_ymd_and_hms(2024, 3, 1, 23, 0, 0).unwrap());
        assert!(z.sort_key() < d.sort_key());
    }
}
