//! Core types: time values, events, repetition rules and occurrence queries

pub mod error;
pub mod event;
pub mod occurrence;
pub mod query;
pub mod recurrence;
pub mod time;
pub mod tracing;

pub use error::{CoreError, CoreResult};
pub use event::{Attendee, Calendar, Event, ParticipationStatus};
pub use occurrence::EventOccurrence;
pub use query::{Occurrence, Occurrences, QueryEngine, QueryOptions};
pub use recurrence::{RecurrenceResolver, RecurrenceSequence};
pub use time::{EventTime, Granularity};
pub use tracing::{init_tracing, TracingConfig, TracingError, TracingOutputFormat};
