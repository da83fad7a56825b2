//! Calendar facade, configuration and command-line interface
//!
//! This crate provides the `webcal` command-line interface and the
//! [`WebCal`] facade that loads calendars through the cache.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod webcal;

pub use cli::Cli;
pub use config::ClientConfig;
pub use error::{ClientError, ClientResult};
pub use webcal::{CalendarRequest, WebCal};
