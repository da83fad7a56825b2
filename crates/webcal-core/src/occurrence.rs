//! Per-event occurrence lookup.
//!
//! [`EventOccurrence`] answers before/after/between for one [`Event`],
//! either from its fixed start or from its resolved repetition rule.
//!
//! Query boundaries are first aligned to the granularity of the event start:
//!
//! | event start | date boundary | floating boundary | zoned boundary |
//! |-------------|---------------|-------------------|----------------|
//! | date        | as is         | truncated to date | error*         |
//! | floating    | error         | as is             | error          |
//! | zoned       | error         | error             | as is          |
//!
//! (*) unless zoned truncation is enabled, in which case the boundary's own
//! local date is used.

use std::cmp::Ordering;

use tracing::warn;

use crate::error::{CoreError, CoreResult};
use crate::event::Event;
use crate::recurrence::{RecurrenceResolver, RecurrenceSequence};
use crate::time::EventTime;

/// Occurrence view of a single event.
#[derive(Debug, Clone)]
pub struct EventOccurrence<'a> {
    event: &'a Event,
    sequence: Option<RecurrenceSequence>,
    truncate_zoned: bool,
}

impl<'a> EventOccurrence<'a> {
    /// Wraps `event`, resolving its repetition rule if it has one.
    ///
    /// An invalid rule is logged and the event is treated as a single
    /// occurrence at its start.
    pub fn new(event: &'a Event, resolver: &RecurrenceResolver) -> Self {
        let sequence = match (&event.rrule, &event.start) {
            (Some(rule), Some(start)) => match resolver.resolve(rule, start) {
                Ok(sequence) => Some(sequence),
                Err(e) => {
                    warn!(uid = %event.uid, error = %e, "Ignoring invalid repetition rule");
                    None
                }
            },
            _ => None,
        };

        Self {
            event,
            sequence,
            truncate_zoned: false,
        }
    }

    /// Builder method to allow zoned boundaries against date-only starts.
    pub fn with_zoned_truncation(mut self, enabled: bool) -> Self {
        self.truncate_zoned = enabled;
        self
    }

    /// Returns the wrapped event.
    pub fn event(&self) -> &'a Event {
        self.event
    }

    /// Returns true if the event repeats according to a valid rule.
    pub fn has_repetition(&self) -> bool {
        self.sequence.is_some()
    }

    /// The nearest occurrence before `at` (or at it, if `inclusive`).
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Comparison`] if `at` cannot be compared with the
    /// event start.
    pub fn before(&self, at: &EventTime, inclusive: bool) -> CoreResult<Option<EventTime>> {
        let Some(start) = self.event.start else {
            return Ok(None);
        };
        let at = self.align(&start, at)?;

        match &self.sequence {
            Some(sequence) => Ok(sequence.before(&at, inclusive)),
            None => {
                let ord = self.compare(&start, &at)?;
                let hit = ord == Ordering::Less || (inclusive && ord == Ordering::Equal);
                Ok(hit.then_some(start))
            }
        }
    }

    /// The nearest occurrence after `at` (or at it, if `inclusive`).
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Comparison`] if `at` cannot be compared with the
    /// event start.
    pub fn after(&self, at: &EventTime, inclusive: bool) -> CoreResult<Option<EventTime>> {
        let Some(start) = self.event.start else {
            return Ok(None);
        };
        let at = self.align(&start, at)?;

        match &self.sequence {
            Some(sequence) => Ok(sequence.after(&at, inclusive)),
            None => {
                let ord = self.compare(&start, &at)?;
                let hit = ord == Ordering::Greater || (inclusive && ord == Ordering::Equal);
                Ok(hit.then_some(start))
            }
        }
    }

    /// All occurrences between `from` and `to`, ascending.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Comparison`] if either bound cannot be compared
    /// with the event start.
    pub fn between(
        &self,
        from: &EventTime,
        to: &EventTime,
        inclusive: bool,
    ) -> CoreResult<Vec<EventTime>> {
        let Some(start) = self.event.start else {
            return Ok(Vec::new());
        };
        let from = self.align(&start, from)?;
        let to = self.align(&start, to)?;

        match &self.sequence {
            Some(sequence) => Ok(sequence.between(&from, &to, inclusive)),
            None => {
                let lower = self.compare(&start, &from)?;
                let upper = self.compare(&start, &to)?;
                let hit = if inclusive {
                    lower != Ordering::Less && upper != Ordering::Greater
                } else {
                    lower == Ordering::Greater && upper == Ordering::Less
                };
                Ok(if hit { vec![start] } else { Vec::new() })
            }
        }
    }

    /// Expresses `boundary` in the granularity of `start`.
    fn align(&self, start: &EventTime, boundary: &EventTime) -> CoreResult<EventTime> {
        match (start, boundary) {
            (EventTime::Date(_), EventTime::Date(_))
            | (EventTime::Floating(_), EventTime::Floating(_))
            | (EventTime::Zoned(_), EventTime::Zoned(_)) => Ok(*boundary),
            (EventTime::Date(_), EventTime::Floating(dt)) => Ok(EventTime::Date(dt.date())),
            (EventTime::Date(_), EventTime::Zoned(dt)) if self.truncate_zoned => {
                Ok(EventTime::Date(dt.date_naive()))
            }
            _ => Err(self.mismatch(start, boundary)),
        }
    }

    fn compare(&self, start: &EventTime, boundary: &EventTime) -> CoreResult<Ordering> {
        start
            .try_cmp(boundary)
            .ok_or_else(|| self.mismatch(start, boundary))
    }

    fn mismatch(&self, start: &EventTime, boundary: &EventTime) -> CoreError {
        CoreError::comparison(
            self.event.uid.clone(),
            start.granularity(),
            boundary.granularity(),
        )
    }
}
