//! Availability probing.
//!
//! Decides, per provider, whether enough credentials exist to attempt a
//! fetch. Stateless: the same bag always yields the same answer.

use std::path::PathBuf;

use crate::core::credentials::CredentialBag;
use crate::core::provider::{AvailabilityRule, UsageProvider};
use crate::storage::paths;

/// Evaluates [`AvailabilityRule`]s against a bag.
#[derive(Debug, Clone, Copy)]
pub struct AvailabilityChecker {
    ambient: fn() -> bool,
}

impl Default for AvailabilityChecker {
    fn default() -> Self {
        Self::new()
    }
}

impl AvailabilityChecker {
    /// Checker using real platform credential discovery.
    #[must_use]
    pub fn new() -> Self {
        Self {
            ambient: google_adc_available,
        }
    }

    /// Checker with an injected platform discovery function.
    #[must_use]
    pub fn with_ambient(ambient: fn() -> bool) -> Self {
        Self { ambient }
    }

    /// Whether `provider` should be attempted with `bag`.
    #[must_use]
    pub fn is_available(&self, provider: &dyn UsageProvider, bag: &CredentialBag) -> bool {
        self.evaluate(&provider.availability(), provider.name(), bag)
    }

    /// Evaluate `rule` on behalf of the provider called `name`.
    #[must_use]
    pub fn evaluate(&self, rule: &AvailabilityRule, name: &str, bag: &CredentialBag) -> bool {
        match rule {
            AvailabilityRule::AmbientPlatform => (self.ambient)(),
            AvailabilityRule::AnyOf(rules) => rules.iter().any(|r| self.evaluate(r, name, bag)),
            AvailabilityRule::NestedField {
                namespace,
                primary,
                fallbacks,
            } => std::iter::once(primary)
                .chain(fallbacks.iter())
                .any(|field| !bag.get_nested_field(namespace, field).is_empty()),
            AvailabilityRule::DatabaseToken => bag.database_token().is_some(),
            AvailabilityRule::ApiKey => !bag.get_key(name).is_empty(),
            AvailabilityRule::KeyOf(other) => !bag.get_key(other.display_name()).is_empty(),
            AvailabilityRule::LinkedRefreshToken => bag
                .linked_accounts()
                .is_some_and(|linked| linked.can_refresh()),
        }
    }
}

// =============================================================================
// Google application-default credentials
// =============================================================================

/// Location of usable Google application-default credentials, if any.
///
/// `GOOGLE_APPLICATION_CREDENTIALS` wins when it names an existing file;
/// otherwise the gcloud well-known file is used.
#[must_use]
pub fn google_adc_path() -> Option<PathBuf> {
    if let Some(explicit) = std::env::var_os("GOOGLE_APPLICATION_CREDENTIALS")
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        && explicit.is_file()
    {
        return Some(explicit);
    }
    paths::home_dir()
        .map(|home| paths::gcloud_adc_file(&home))
        .filter(|p| p.is_file())
}

/// Whether Google application-default credentials can be discovered.
#[must_use]
pub fn google_adc_available() -> bool {
    google_adc_path().is_some()
}
