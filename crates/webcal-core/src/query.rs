//! Calendar-wide occurrence queries.
//!
//! [`QueryEngine`] evaluates before/after/between over every event of a
//! [`Calendar`] and collects `(instant, event)` pairs.
//!
//! Results keep the calendar order of events; the occurrences of one
//! recurring event are ascending. Use [`Occurrences::sort_chronologically`]
//! for a time-ordered view.

use std::cmp::Ordering;

use tracing::{debug, instrument};

use crate::error::CoreResult;
use crate::event::{Calendar, Event};
use crate::occurrence::EventOccurrence;
use crate::recurrence::RecurrenceResolver;
use crate::time::EventTime;

/// Options controlling query evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryOptions {
    /// Maximum occurrences a single recurring event contributes to a range.
    pub max_occurrences: usize,
    /// Compare zoned boundaries against all-day events by their local date
    /// instead of failing.
    pub truncate_zoned_boundaries: bool,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            max_occurrences: RecurrenceResolver::DEFAULT_MAX_OCCURRENCES,
            truncate_zoned_boundaries: false,
        }
    }
}

impl QueryOptions {
    /// Builder method to set the per-event occurrence cap.
    pub fn with_max_occurrences(mut self, max: usize) -> Self {
        self.max_occurrences = max;
        self
    }

    /// Builder method to enable zoned boundary truncation.
    pub fn with_zoned_truncation(mut self, enabled: bool) -> Self {
        self.truncate_zoned_boundaries = enabled;
        self
    }
}

/// One occurrence of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Occurrence<'c> {
    /// When the event occurs.
    pub at: EventTime,
    /// The occurring event.
    pub event: &'c Event,
}

/// An ordered collection of occurrences.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Occurrences<'c>(Vec<Occurrence<'c>>);

impl<'c> Occurrences<'c> {
    /// Iterates over the occurrences.
    pub fn iter(&self) -> std::slice::Iter<'_, Occurrence<'c>> {
        self.0.iter()
    }

    /// Returns the number of occurrences.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if there are no occurrences.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Reorders by occurrence time, then by calendar position.
    pub fn sort_chronologically(&mut self) {
        self.0.sort_by(|a, b| {
            a.at.sort_key()
                .cmp(&b.at.sort_key())
                .then(a.event.index.cmp(&b.event.index))
        });
    }
}

impl<'c> IntoIterator for Occurrences<'c> {
    type Item = Occurrence<'c>;
    type IntoIter = std::vec::IntoIter<Occurrence<'c>>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a, 'c> IntoIterator for &'a Occurrences<'c> {
    type Item = &'a Occurrence<'c>;
    type IntoIter = std::slice::Iter<'a, Occurrence<'c>>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Evaluates occurrence queries over a calendar.
#[derive(Debug, Clone)]
pub struct QueryEngine<'c> {
    calendar: &'c Calendar,
    options: QueryOptions,
    resolver: RecurrenceResolver,
}

impl<'c> QueryEngine<'c> {
    /// Creates an engine with default options.
    pub fn new(calendar: &'c Calendar) -> Self {
        Self::with_options(calendar, QueryOptions::default())
    }

    /// Creates an engine with the given options.
    pub fn with_options(calendar: &'c Calendar, options: QueryOptions) -> Self {
        Self {
            calendar,
            options,
            resolver: RecurrenceResolver::new().with_max_occurrences(options.max_occurrences),
        }
    }

    /// Returns the options in use.
    pub fn options(&self) -> &QueryOptions {
        &self.options
    }

    /// For every event, the nearest occurrence at or before `at`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CoreError::Comparison`] if `at` cannot be compared
    /// with some event start.
    #[instrument(level = "debug", skip_all, fields(at = %at))]
    pub fn events_before(&self, at: &EventTime) -> CoreResult<Occurrences<'c>> {
        let mut found = Vec::new();
        for occurrence in self.occurring_events() {
            if let Some(instant) = occurrence.before(at, true)? {
                found.push(Occurrence {
                    at: instant,
                    event: occurrence.event(),
                });
            }
        }
        debug!(count = found.len(), "Evaluated events_before");
        Ok(Occurrences(found))
    }

    /// For every event, the nearest occurrence at or after `at`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CoreError::Comparison`] if `at` cannot be compared
    /// with some event start.
    #[instrument(level = "debug", skip_all, fields(at = %at))]
    pub fn events_after(&self, at: &EventTime) -> CoreResult<Occurrences<'c>> {
        let mut found = Vec::new();
        for occurrence in self.occurring_events() {
            if let Some(instant) = occurrence.after(at, true)? {
                found.push(Occurrence {
                    at: instant,
                    event: occurrence.event(),
                });
            }
        }
        debug!(count = found.len(), "Evaluated events_after");
        Ok(Occurrences(found))
    }

    /// Every occurrence within `[start, end]`.
    ///
    /// An inverted range yields no occurrences.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CoreError::Comparison`] if a bound cannot be compared
    /// with some event start.
    #[instrument(level = "debug", skip_all, fields(start = %start, end = %end))]
    pub fn events_between(&self, start: &EventTime, end: &EventTime) -> CoreResult<Occurrences<'c>> {
        if start.try_cmp(end) == Some(Ordering::Greater) {
            debug!("Inverted range, nothing to evaluate");
            return Ok(Occurrences::default());
        }

        let mut found = Vec::new();
        for occurrence in self.occurring_events() {
            let event = occurrence.event();
            found.extend(
                occurrence
                    .between(start, end, true)?
                    .into_iter()
                    .map(|at| Occurrence { at, event }),
            );
        }
        debug!(count = found.len(), "Evaluated events_between");
        Ok(Occurrences(found))
    }

    /// Events that can occur at all, wrapped for evaluation.
    fn occurring_events(&self) -> impl Iterator<Item = EventOccurrence<'c>> + '_ {
        self.calendar.events().iter().filter_map(|event| {
            if event.start.is_none() {
                if event.has_rrule() {
                    debug!(uid = %event.uid, "Skipping repeating event without a start");
                }
                return None;
            }
            Some(
                EventOccurrence::new(event, &self.resolver)
                    .with_zoned_truncation(self.options.truncate_zoned_boundaries),
            )
        })
    }
}
