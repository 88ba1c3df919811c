//! Provider fetch orchestration.
//!
//! Runs every active provider concurrently, each under its own deadline, and
//! turns every failure into an error report so one broken backend never
//! hides the others. Reports come back in the order the providers were given.

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::watch;
use tokio::time::{Duration, timeout};

use super::credentials::CredentialBag;
use super::forecast::ForecastEngine;
use super::models::UsageReport;
use super::provider::UsageProvider;
use crate::error::{BarError, Result};

// =============================================================================
// Cancellation
// =============================================================================

/// Batch-wide cancellation switch.
///
/// Cloning shares the same switch.
#[derive(Debug, Clone)]
pub struct CancellationSignal {
    tx: Arc<watch::Sender<bool>>,
}

impl Default for CancellationSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl CancellationSignal {
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Cancel every fetch still in flight.
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }

    fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}

/// Resolves once `rx` observes cancellation; never if the switch is dropped.
async fn cancelled(mut rx: watch::Receiver<bool>) {
    let closed = rx.wait_for(|c| *c).await.is_err();
    if closed {
        std::future::pending::<()>().await;
    }
}

// =============================================================================
// Orchestrator
// =============================================================================

/// Concurrent fetcher over a set of providers.
#[derive(Debug, Clone, Default)]
pub struct Orchestrator {
    timeout_override: Option<Duration>,
    forecast: Option<ForecastEngine>,
    cancel: Option<CancellationSignal>,
}

impl Orchestrator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Use one deadline for every provider instead of each provider's default.
    #[must_use]
    pub const fn with_timeout(mut self, deadline: Duration) -> Self {
        self.timeout_override = Some(deadline);
        self
    }

    /// Attach a forecast to every report that has history.
    #[must_use]
    pub const fn with_forecast(mut self, engine: ForecastEngine) -> Self {
        self.forecast = Some(engine);
        self
    }

    #[must_use]
    pub fn with_cancellation(mut self, signal: CancellationSignal) -> Self {
        self.cancel = Some(signal);
        self
    }

    /// Fetch every provider concurrently.
    ///
    /// Always returns exactly one report per provider, in input order.
    pub async fn fetch_all(
        &self,
        providers: &[Arc<dyn UsageProvider>],
        bag: &CredentialBag,
    ) -> Vec<UsageReport> {
        let futures: Vec<_> = providers
            .iter()
            .map(|p| self.fetch_one(p.as_ref(), bag))
            .collect();

        futures::future::join_all(futures).await
    }

    async fn fetch_one(&self, provider: &dyn UsageProvider, bag: &CredentialBag) -> UsageReport {
        let name = provider.name();
        let deadline = self
            .timeout_override
            .unwrap_or_else(|| provider.id().default_timeout());

        tracing::info!(provider = name, timeout_secs = deadline.as_secs(), "fetch started");
        let start = Instant::now();

        let guarded = async {
            timeout(deadline, self.fetch_with_history(provider, bag))
                .await
                .unwrap_or_else(|_| Err(BarError::timeout(name, deadline)))
        };

        let result = match &self.cancel {
            Some(signal) => {
                tokio::select! {
                    result = guarded => result,
                    () = cancelled(signal.subscribe()) => Err(BarError::Cancelled {
                        provider: name.to_string(),
                    }),
                }
            }
            None => guarded.await,
        };

        let duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
        match result {
            Ok(report) => {
                tracing::info!(provider = name, duration_ms, "fetch succeeded");
                report
            }
            Err(e) => {
                tracing::warn!(
                    provider = name,
                    duration_ms,
                    error = %e,
                    code = e.error_code(),
                    "fetch failed"
                );
                UsageReport::failed(name, provider.billing_kind(), e.to_string())
            }
        }
    }

    async fn fetch_with_history(
        &self,
        provider: &dyn UsageProvider,
        bag: &CredentialBag,
    ) -> Result<UsageReport> {
        let mut report = provider.fetch(bag).await?;

        let history = match provider.fetch_history(bag).await {
            Ok(history) => history,
            Err(e) => {
                tracing::debug!(provider = provider.name(), error = %e, "history unavailable");
                Vec::new()
            }
        };

        if history.is_empty() {
            return Ok(report);
        }

        if let Some(engine) = &self.forecast {
            let engine = engine.for_provider(provider.id());
            report.forecast = Some(engine.predict(&history, &report));
        }
        report.history = Some(history);
        Ok(report)
    }
}
