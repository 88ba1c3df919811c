//! Core data models, credential resolution, and the fetch pipeline.

pub mod availability;
pub mod cli_runner;
pub mod credentials;
pub mod forecast;
pub mod http;
pub mod logging;
pub mod models;
pub mod pipeline;
pub mod provider;
pub mod resolver;

pub use availability::AvailabilityChecker;
pub use credentials::{CredentialBag, CredentialSource, CredentialValue, LinkedAccounts};
pub use forecast::{ForecastBreakdown, ForecastEngine, RemainingDays};
pub use models::{
    BillingKind, Confidence, DailyUsage, Forecast, ProviderListing, RobotOutput, SubAccount,
    UsageReport,
};
pub use pipeline::{CancellationSignal, Orchestrator};
pub use provider::{AvailabilityRule, ProviderCatalog, ProviderId, UsageProvider};
pub use resolver::{CredentialLocations, CredentialResolver};
