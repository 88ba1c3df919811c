//! Output rendering for human and JSON modes.

pub mod error;
pub mod human;
pub mod robot;

use crate::cli::args::OutputFormat;
use crate::core::models::{ProviderListing, UsageReport};
use crate::error::Result;

/// Render usage reports. `errors` only appear in the JSON envelope; the
/// human table shows failures inline.
///
/// # Errors
/// Returns an error if JSON serialization fails.
pub fn render_usage(
    reports: &[UsageReport],
    errors: Vec<String>,
    format: OutputFormat,
    pretty: bool,
    no_color: bool,
) -> Result<String> {
    match format {
        OutputFormat::Human => Ok(human::render_usage(reports, no_color)),
        OutputFormat::Json => robot::render_usage_json(reports, errors, pretty),
    }
}

/// Render the provider catalog.
///
/// # Errors
/// Returns an error if JSON serialization fails.
pub fn render_providers(
    listings: &[ProviderListing],
    format: OutputFormat,
    pretty: bool,
    no_color: bool,
) -> Result<String> {
    match format {
        OutputFormat::Human => Ok(human::render_providers(listings, no_color)),
        OutputFormat::Json => robot::render_providers_json(listings, pretty),
    }
}
