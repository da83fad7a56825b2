//! Repetition rule resolution.
//!
//! [`RecurrenceResolver`] compiles an `RRULE` value against an event's start
//! into a [`RecurrenceSequence`] that can answer before/after/between
//! questions. Rule compilation and expansion are delegated to the `rrule`
//! crate; this module only prepares the rule text and maps times in and out
//! of it.
//!
//! Anchors are mapped onto the generator like this:
//! - `Date` starts run at midnight UTC and come back as dates
//! - `Floating` starts run on the same wall clock in UTC and come back floating
//! - `Zoned` starts run in their own zone, so DST transitions are honored

use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, TimeZone, Utc};
use regex::Regex;
use rrule::{RRule, RRuleSet, Tz as RuleTz, Unvalidated};
use tracing::{debug, trace, warn};

use crate::error::{CoreError, CoreResult};
use crate::time::EventTime;

/// A bare `YYYYMMDD` date.
static DATE_VALUE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{8}$").expect("Invalid date regex"));

/// A `YYYYMMDDTHHMMSS` date-time without zone designator.
static FLOATING_VALUE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{8}T\d{6}$").expect("Invalid floating date-time regex"));

/// A `YYYYMMDDTHHMMSSZ` UTC date-time.
static UTC_VALUE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{8}T\d{6}Z$").expect("Invalid UTC date-time regex"));

/// Compiles repetition rules into occurrence sequences.
#[derive(Debug, Clone)]
pub struct RecurrenceResolver {
    max_occurrences: usize,
}

impl Default for RecurrenceResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl RecurrenceResolver {
    /// Default cap on the occurrences returned by a single range query.
    pub const DEFAULT_MAX_OCCURRENCES: usize = 1000;

    /// Creates a resolver with default settings.
    pub fn new() -> Self {
        Self {
            max_occurrences: Self::DEFAULT_MAX_OCCURRENCES,
        }
    }

    /// Builder method to set the range query cap.
    pub fn with_max_occurrences(mut self, max: usize) -> Self {
        self.max_occurrences = max;
        self
    }

    /// Returns the range query cap.
    pub fn max_occurrences(&self) -> usize {
        self.max_occurrences
    }

    /// Compiles `rule_text` anchored at `anchor`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidRule`] if the rule cannot be parsed or
    /// is inconsistent with the anchor.
    ///
    /// A well-formed rule whose `UNTIL` lies before the anchor resolves to an
    /// empty sequence.
    pub fn resolve(&self, rule_text: &str, anchor: &EventTime) -> CoreResult<RecurrenceSequence> {
        let kind = AnchorKind::of(anchor);
        let dt_start = kind.to_rule_time(anchor);
        let normalized = normalize_rule(rule_text, &dt_start)?;
        trace!(rule = %rule_text, normalized = %normalized.text, "Normalized repetition rule");

        let rule = normalized
            .text
            .parse::<RRule<Unvalidated>>()
            .map_err(|e| CoreError::invalid_rule(rule_text, e.to_string()))?;

        let set = match normalized.until {
            Some(until) if until < dt_start.with_timezone(&Utc) => {
                debug!(rule = %normalized.text, anchor = %anchor, "UNTIL precedes the start, no occurrences");
                None
            }
            _ => Some(
                rule.build(dt_start)
                    .map_err(|e| CoreError::invalid_rule(rule_text, e.to_string()))?,
            ),
        };

        debug!(rule = %normalized.text, anchor = %anchor, "Resolved repetition rule");
        Ok(RecurrenceSequence {
            set,
            kind,
            max_occurrences: self.max_occurrences,
        })
    }
}

/// How generated instants map back to [`EventTime`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AnchorKind {
    Date,
    Floating,
    Zoned(chrono_tz::Tz),
}

impl AnchorKind {
    fn of(anchor: &EventTime) -> Self {
        match anchor {
            EventTime::Date(_) => Self::Date,
            EventTime::Floating(_) => Self::Floating,
            EventTime::Zoned(dt) => Self::Zoned(dt.timezone()),
        }
    }

    /// Places a time on the generator's timeline.
    fn to_rule_time(self, time: &EventTime) -> DateTime<RuleTz> {
        let tz = match self {
            Self::Zoned(tz) => RuleTz::Tz(tz),
            Self::Date | Self::Floating => RuleTz::UTC,
        };
        match time {
            EventTime::Date(d) => utc_wall_clock(d.and_time(NaiveTime::MIN)),
            EventTime::Floating(dt) => utc_wall_clock(*dt),
            EventTime::Zoned(dt) => dt.with_timezone(&tz),
        }
    }

    fn to_event_time(self, dt: DateTime<RuleTz>) -> EventTime {
        match self {
            Self::Date => EventTime::Date(dt.date_naive()),
            Self::Floating => EventTime::Floating(dt.naive_utc()),
            Self::Zoned(tz) => EventTime::Zoned(dt.with_timezone(&tz)),
        }
    }
}

fn utc_wall_clock(local: NaiveDateTime) -> DateTime<RuleTz> {
    Utc.from_utc_datetime(&local).with_timezone(&RuleTz::UTC)
}

/// A rule rebuilt for the generator.
#[derive(Debug, Clone, PartialEq, Eq)]
struct NormalizedRule {
    text: String,
    /// The `UNTIL` bound as an instant, when the rule has one.
    until: Option<DateTime<Utc>>,
}

/// Rebuilds the rule text clause by clause.
///
/// Empty clauses and an `RRULE:` prefix are dropped. A bare-date or floating
/// `UNTIL` is resolved in the anchor's zone and rewritten in UTC, since the
/// generator only accepts a UTC bound for non-local anchors. A clause that is
/// not `KEY=VALUE` makes the whole rule invalid.
fn normalize_rule(rule_text: &str, dt_start: &DateTime<RuleTz>) -> CoreResult<NormalizedRule> {
    let body = rule_text.trim();
    let body = body
        .get(..6)
        .filter(|prefix| prefix.eq_ignore_ascii_case("RRULE:"))
        .map_or(body, |_| &body[6..]);

    let mut clauses = Vec::new();
    let mut until = None;
    for clause in body.split(';').map(str::trim) {
        if clause.is_empty() {
            continue;
        }
        match clause.split_once('=') {
            Some((key, value)) if !key.trim().is_empty() && !value.trim().is_empty() => {
                let (key, value) = (key.trim(), value.trim());
                if key.eq_ignore_ascii_case("UNTIL") {
                    match resolve_until(value, dt_start) {
                        Some(instant) => {
                            until = Some(instant);
                            clauses.push(format!("UNTIL={}", instant.format("%Y%m%dT%H%M%SZ")));
                        }
                        None => clauses.push(format!("{key}={value}")),
                    }
                } else {
                    clauses.push(format!("{key}={value}"));
                }
            }
            _ => {
                return Err(CoreError::invalid_rule(
                    rule_text,
                    format!("clause `{clause}` is not KEY=VALUE"),
                ));
            }
        }
    }
    Ok(NormalizedRule {
        text: clauses.join(";"),
        until,
    })
}

/// Interprets an `UNTIL` value as an instant.
///
/// Bare dates mean local midnight and floating values local wall clock, both
/// in the anchor's zone. A local time inside a DST gap moves forward to the
/// first time that exists. Unrecognized forms are left to the generator.
fn resolve_until(value: &str, dt_start: &DateTime<RuleTz>) -> Option<DateTime<Utc>> {
    if UTC_VALUE.is_match(value) {
        return NaiveDateTime::parse_from_str(value, "%Y%m%dT%H%M%SZ")
            .ok()
            .map(|dt| Utc.from_utc_datetime(&dt));
    }

    let local = if DATE_VALUE.is_match(value) {
        NaiveDate::parse_from_str(value, "%Y%m%d")
            .ok()
            .map(|d| d.and_time(NaiveTime::MIN))
    } else if FLOATING_VALUE.is_match(value) {
        NaiveDateTime::parse_from_str(value, "%Y%m%dT%H%M%S").ok()
    } else {
        None
    }?;

    let tz = dt_start.timezone();
    if let Some(until) = tz.from_local_datetime(&local).earliest() {
        return Some(until.with_timezone(&Utc));
    }
    let shifted = (1..=96)
        .map(|step| local + TimeDelta::minutes(15 * step))
        .find_map(|candidate| tz.from_local_datetime(&candidate).earliest());
    match shifted {
        Some(until) => {
            debug!(
                until = %value,
                resolved = %until.with_timezone(&Utc),
                "UNTIL falls into a time zone gap, moved past it"
            );
            Some(until.with_timezone(&Utc))
        }
        None => {
            warn!(until = %value, "UNTIL does not exist in the anchor's time zone");
            None
        }
    }
}

/// The occurrences generated by one resolved repetition rule.
#[derive(Debug, Clone)]
pub struct RecurrenceSequence {
    /// `None` when the rule can never produce an occurrence.
    set: Option<RRuleSet>,
    kind: AnchorKind,
    max_occurrences: usize,
}

impl RecurrenceSequence {
    fn instants(&self) -> impl Iterator<Item = DateTime<RuleTz>> + '_ {
        self.set.iter().flat_map(|set| set.into_iter())
    }

    /// Returns the last occurrence before `at` (or equal, if `inclusive`).
    ///
    /// `at` is expected to have the anchor's granularity.
    pub fn before(&self, at: &EventTime, inclusive: bool) -> Option<EventTime> {
        let bound = self.kind.to_rule_time(at);
        self.instants()
            .take_while(|dt| if inclusive { *dt <= bound } else { *dt < bound })
            .last()
            .map(|dt| self.kind.to_event_time(dt))
    }

    /// Returns the first occurrence after `at` (or equal, if `inclusive`).
    ///
    /// `at` is expected to have the anchor's granularity.
    pub fn after(&self, at: &EventTime, inclusive: bool) -> Option<EventTime> {
        let bound = self.kind.to_rule_time(at);
        self.instants()
            .find(|dt| if inclusive { *dt >= bound } else { *dt > bound })
            .map(|dt| self.kind.to_event_time(dt))
    }

    /// Returns the occurrences between `start` and `end` in ascending order.
    ///
    /// With `inclusive`, occurrences equal to either bound are included. At
    /// most the resolver's `max_occurrences` are returned.
    pub fn between(&self, start: &EventTime, end: &EventTime, inclusive: bool) -> Vec<EventTime> {
        let lower = self.kind.to_rule_time(start);
        let upper = self.kind.to_rule_time(end);

        let mut found: Vec<EventTime> = self
            .instants()
            .skip_while(|dt| if inclusive { *dt < lower } else { *dt <= lower })
            .take_while(|dt| if inclusive { *dt <= upper } else { *dt < upper })
            .take(self.max_occurrences.saturating_add(1))
            .map(|dt| self.kind.to_event_time(dt))
            .collect();

        if found.len() > self.max_occurrences {
            found.truncate(self.max_occurrences);
            warn!(
                max = self.max_occurrences,
                "Occurrence range truncated, narrow the query range to see more"
            );
        }
        found
    }
}
