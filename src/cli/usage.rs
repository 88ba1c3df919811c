//! Usage command implementation.

use std::sync::Arc;

use crate::cli::args::{Cli, UsageArgs};
use crate::core::availability::AvailabilityChecker;
use crate::core::credentials::CredentialBag;
use crate::core::forecast::ForecastEngine;
use crate::core::http;
use crate::core::models::UsageReport;
use crate::core::pipeline::{CancellationSignal, Orchestrator};
use crate::core::provider::{ProviderCatalog, UsageProvider};
use crate::core::resolver::CredentialResolver;
use crate::error::Result;
use crate::render;
use crate::storage::config::ResolvedConfig;
use crate::util::env::should_use_color;

/// Execute the usage command.
///
/// Provider failures are rendered inline and never fail the command.
///
/// # Errors
/// Returns an error for invalid configuration, an unknown `--provider`, or
/// when no credential source yields anything.
pub async fn execute(cli: &Cli, args: &UsageArgs) -> Result<()> {
    let config = ResolvedConfig::resolve(cli, Some(args))?;
    tracing::debug!(sources = ?config.sources, "configuration resolved");

    let bag = CredentialResolver::default().resolve()?;
    tracing::info!(credentials = bag.len(), "credentials resolved");

    let client = http::default_client()?;
    let catalog = ProviderCatalog::builtin(&client).without(&config.disabled)?;
    let providers = catalog.active(&bag, &AvailabilityChecker::new(), args.provider.as_deref())?;

    let signal = CancellationSignal::new();
    let ctrl_c = {
        let signal = signal.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("interrupted, cancelling in-flight fetches");
                signal.cancel();
            }
        })
    };

    let reports = fetch_usage(&orchestrator(&config).with_cancellation(signal), &providers, &bag).await;
    ctrl_c.abort();

    let errors = failure_summaries(&reports);
    let no_color = !should_use_color(cli.no_color);
    let output = render::render_usage(&reports, errors, config.format, config.pretty, no_color)?;
    println!("{}", output.trim_end());
    Ok(())
}

/// Orchestrator configured from the resolved settings.
#[must_use]
pub fn orchestrator(config: &ResolvedConfig) -> Orchestrator {
    let mut orchestrator = Orchestrator::new();
    if let Some(deadline) = config.timeout {
        orchestrator = orchestrator.with_timeout(deadline);
    }
    if config.predict {
        orchestrator = orchestrator.with_forecast(ForecastEngine::new(config.overage_rate));
    }
    orchestrator
}

/// Fetch every provider in `providers`.
pub async fn fetch_usage(
    orchestrator: &Orchestrator,
    providers: &[Arc<dyn UsageProvider>],
    bag: &CredentialBag,
) -> Vec<UsageReport> {
    if providers.is_empty() {
        tracing::info!("no provider has usable credentials");
        return Vec::new();
    }
    orchestrator.fetch_all(providers, bag).await
}

/// `"Provider: message"` for each failed report.
#[must_use]
pub fn failure_summaries(reports: &[UsageReport]) -> Vec<String> {
    reports
        .iter()
        .filter_map(|r| r.error.as_ref().map(|e| format!("{}: {e}", r.name)))
        .collect()
}
