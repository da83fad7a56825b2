//! Command implementations.

pub mod calendar;
pub mod config;
pub mod query;

use std::time::Duration;

use webcal_providers::Credentials;

use crate::cli::SourceArgs;
use crate::webcal::CalendarRequest;

/// Builds the calendar request described by the source flags.
pub fn request(args: &SourceArgs) -> CalendarRequest {
    let mut request = CalendarRequest::new(&args.locator).with_force_refresh(args.refresh);
    if let Some(user) = &args.user {
        request = request.with_credentials(Credentials::new(user));
    }
    if let Some(hours) = args.staleness_hours {
        request = request.with_staleness(Duration::from_secs(hours.saturating_mul(3600)));
    }
    request
}
