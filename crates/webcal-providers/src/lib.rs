//! Calendar sources and iCalendar parsing.
//!
//! - [`CalendarSource`] - fetches raw calendar bytes for a locator
//! - [`HttpSource`] - `http`, `https` and `webcal` URLs (feature `http`)
//! - [`FileSource`] - `file://` URLs and local paths
//! - [`SourceRouter`] - picks a source by locator scheme
//! - [`parse_calendar`] - turns the bytes into a [`webcal_core::Calendar`]
//! - [`ProviderError`] - error type for all of the above
//!
//! ```text
//! locator ──► SourceRouter ──► HttpSource / FileSource ──► bytes
//!                                                           │
//!                                       parse_calendar() ◄──┘
//!                                              │
//!                                              ▼
//!                                          Calendar
//! ```

pub mod error;
pub mod file;
#[cfg(feature = "http")]
pub mod http;
pub mod ics;
pub mod source;

pub use error::{ProviderError, ProviderErrorCode, ProviderResult};
pub use file::FileSource;
#[cfg(feature = "http")]
pub use http::{HttpConfig, HttpSource};
pub use ics::{parse_calendar, parse_calendar_str};
pub use source::{CalendarSource, Credentials, LocatorKind, SourceRouter};
