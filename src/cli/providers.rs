//! Providers command: list the catalog without touching the network.

use crate::cli::args::Cli;
use crate::core::availability::AvailabilityChecker;
use crate::core::credentials::CredentialBag;
use crate::core::http;
use crate::core::models::ProviderListing;
use crate::core::provider::ProviderCatalog;
use crate::core::resolver::CredentialResolver;
use crate::error::{BarError, Result};
use crate::render;
use crate::storage::config::ResolvedConfig;
use crate::util::env::should_use_color;

/// Execute the providers command.
///
/// A machine with no credentials at all still gets a listing, with every
/// provider marked missing.
///
/// # Errors
/// Returns an error for invalid configuration or unreadable credential files.
pub fn execute(cli: &Cli) -> Result<()> {
    let config = ResolvedConfig::resolve(cli, None)?;

    let bag = match CredentialResolver::default().resolve() {
        Ok(bag) => bag,
        Err(BarError::NoCredentials) => CredentialBag::new(),
        Err(e) => return Err(e),
    };

    let client = http::default_client()?;
    let catalog = ProviderCatalog::builtin(&client);
    let listings = list_providers(&catalog, &bag, &AvailabilityChecker::new());

    let no_color = !should_use_color(cli.no_color);
    let output = render::render_providers(&listings, config.format, config.pretty, no_color)?;
    println!("{}", output.trim_end());
    Ok(())
}

/// One listing per catalog entry, in catalog order.
#[must_use]
pub fn list_providers(
    catalog: &ProviderCatalog,
    bag: &CredentialBag,
    checker: &AvailabilityChecker,
) -> Vec<ProviderListing> {
    catalog
        .iter()
        .map(|p| ProviderListing {
            name: p.name().to_string(),
            cli_name: p.id().cli_name().to_string(),
            billing_kind: p.billing_kind(),
            available: checker.is_available(p.as_ref(), bag),
        })
        .collect()
}
