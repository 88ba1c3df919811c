//! Provider identities, the fetch contract, and the catalog.
//!
//! Every backend is identified by a [`ProviderId`] and implemented as a
//! [`UsageProvider`] trait object. The [`ProviderCatalog`] holds the static
//! registration table and narrows it to the providers that can run with the
//! credentials at hand.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::core::availability::AvailabilityChecker;
use crate::core::credentials::CredentialBag;
use crate::core::forecast::DEFAULT_OVERAGE_RATE;
use crate::core::models::{BillingKind, DailyUsage, UsageReport};
use crate::error::{BarError, Result};

// =============================================================================
// Provider Enum
// =============================================================================

/// Supported usage backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProviderId {
    OpenRouter,
    Claude,
    GeminiCli,
    OpenAi,
    VertexAi,
    GoogleAiStudio,
    Copilot,
    Antigravity,
    OpenCodeZen,
}

impl ProviderId {
    /// All providers in registration order.
    pub const ALL: &'static [Self] = &[
        Self::OpenRouter,
        Self::Claude,
        Self::GeminiCli,
        Self::OpenAi,
        Self::VertexAi,
        Self::GoogleAiStudio,
        Self::Copilot,
        Self::Antigravity,
        Self::OpenCodeZen,
    ];

    /// CLI name for this provider.
    #[must_use]
    pub const fn cli_name(self) -> &'static str {
        match self {
            Self::OpenRouter => "openrouter",
            Self::Claude => "claude",
            Self::GeminiCli => "gemini",
            Self::OpenAi => "openai",
            Self::VertexAi => "vertex",
            Self::GoogleAiStudio => "aistudio",
            Self::Copilot => "copilot",
            Self::Antigravity => "antigravity",
            Self::OpenCodeZen => "zen",
        }
    }

    /// Display name. Also the key used for credential lookups.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::OpenRouter => "OpenRouter",
            Self::Claude => "Claude",
            Self::GeminiCli => "Gemini CLI",
            Self::OpenAi => "OpenAI",
            Self::VertexAi => "Vertex AI",
            Self::GoogleAiStudio => "Google AI Studio",
            Self::Copilot => "GitHub Copilot",
            Self::Antigravity => "Antigravity",
            Self::OpenCodeZen => "OpenCode Zen",
        }
    }

    #[must_use]
    pub const fn billing_kind(self) -> BillingKind {
        match self {
            Self::OpenRouter | Self::OpenCodeZen => BillingKind::PayAsYouGo,
            Self::VertexAi => BillingKind::TokensBased,
            Self::Claude
            | Self::GeminiCli
            | Self::OpenAi
            | Self::GoogleAiStudio
            | Self::Copilot
            | Self::Antigravity => BillingKind::QuotaBased,
        }
    }

    /// Credential rule deciding whether this provider is attempted.
    #[must_use]
    pub fn availability_rule(self) -> AvailabilityRule {
        match self {
            Self::OpenRouter
            | Self::Claude
            | Self::OpenAi
            | Self::GoogleAiStudio => AvailabilityRule::ApiKey,
            Self::GeminiCli => AvailabilityRule::AnyOf(vec![
                AvailabilityRule::ApiKey,
                AvailabilityRule::LinkedRefreshToken,
            ]),
            Self::VertexAi => AvailabilityRule::AmbientPlatform,
            Self::Copilot => AvailabilityRule::AnyOf(vec![
                AvailabilityRule::NestedField {
                    namespace: "github-copilot",
                    primary: "access",
                    fallbacks: &["token", "refresh"],
                },
                AvailabilityRule::ApiKey,
            ]),
            Self::Antigravity => AvailabilityRule::AnyOf(vec![
                AvailabilityRule::NestedField {
                    namespace: "anthropic",
                    primary: "access",
                    fallbacks: &[],
                },
                AvailabilityRule::KeyOf(Self::Claude),
                AvailabilityRule::KeyOf(Self::GeminiCli),
                AvailabilityRule::LinkedRefreshToken,
            ]),
            Self::OpenCodeZen => AvailabilityRule::DatabaseToken,
        }
    }

    /// Parse from a CLI argument, matching CLI or display name case-insensitively.
    pub fn from_name(name: &str) -> Result<Self> {
        let wanted = name.trim();
        Self::ALL
            .iter()
            .find(|p| {
                p.cli_name().eq_ignore_ascii_case(wanted)
                    || p.display_name().eq_ignore_ascii_case(wanted)
            })
            .copied()
            .ok_or_else(|| BarError::UnknownProvider(name.to_string()))
    }

    /// Default per-provider deadline when none is configured.
    #[must_use]
    pub const fn default_timeout(self) -> Duration {
        match self {
            // Two round trips (token refresh + query)
            Self::GeminiCli | Self::VertexAi | Self::Antigravity => Duration::from_secs(20),
            _ => Duration::from_secs(15),
        }
    }

    /// List price of one unit beyond the entitlement, in USD. Only Copilot
    /// bills premium requests past the monthly allowance.
    #[must_use]
    pub const fn overage_rate(self) -> Option<f64> {
        match self {
            Self::Copilot => Some(DEFAULT_OVERAGE_RATE),
            _ => None,
        }
    }

    /// How to give this provider credentials.
    #[must_use]
    pub const fn auth_suggestion(self) -> &'static str {
        match self {
            Self::OpenRouter => "Set OPENROUTER_API_KEY or add openrouter to auth.json",
            Self::Claude => "Run: opencode auth login (Anthropic) or set ANTHROPIC_API_KEY",
            Self::GeminiCli => "Link a Google account in OpenCode or set GEMINI_API_KEY",
            Self::OpenAi => "Run: opencode auth login (OpenAI) or set OPENAI_API_KEY",
            Self::VertexAi => "Run: gcloud auth application-default login",
            Self::GoogleAiStudio => "Set GOOGLE_API_KEY",
            Self::Copilot => "Run: opencode auth login (GitHub Copilot) or set COPILOT_TOKEN",
            Self::Antigravity => "Link an Anthropic or Google account in OpenCode",
            Self::OpenCodeZen => "Sign in to OpenCode Zen from OpenCode",
        }
    }
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

// =============================================================================
// Availability Rules
// =============================================================================

/// Credential requirement for attempting a provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AvailabilityRule {
    /// Platform credential discovery (Google application-default credentials).
    AmbientPlatform,
    /// Any sub-rule suffices.
    AnyOf(Vec<AvailabilityRule>),
    /// A non-empty nested field, trying `primary` then each fallback.
    NestedField {
        namespace: &'static str,
        primary: &'static str,
        fallbacks: &'static [&'static str],
    },
    /// The OpenCode database yielded a token.
    DatabaseToken,
    /// `get_key` for the provider's own name is non-empty.
    ApiKey,
    /// `get_key` for another provider is non-empty.
    KeyOf(ProviderId),
    /// Linked accounts carry a refresh token and client id.
    LinkedRefreshToken,
}

// =============================================================================
// Provider Contract
// =============================================================================

/// A usage backend.
#[async_trait]
pub trait UsageProvider: Send + Sync {
    fn id(&self) -> ProviderId;

    /// Stable display identity; also the credential lookup key.
    fn name(&self) -> &'static str {
        self.id().display_name()
    }

    fn billing_kind(&self) -> BillingKind {
        self.id().billing_kind()
    }

    fn availability(&self) -> AvailabilityRule {
        self.id().availability_rule()
    }

    /// Fetch current usage.
    async fn fetch(&self, bag: &CredentialBag) -> Result<UsageReport>;

    /// Fetch daily history, newest first. Empty when unsupported.
    async fn fetch_history(&self, _bag: &CredentialBag) -> Result<Vec<DailyUsage>> {
        Ok(Vec::new())
    }
}

// =============================================================================
// Provider Catalog
// =============================================================================

/// Registration table of providers.
#[derive(Clone)]
pub struct ProviderCatalog {
    providers: Vec<Arc<dyn UsageProvider>>,
}

impl std::fmt::Debug for ProviderCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.providers.iter().map(|p| p.name()))
            .finish()
    }
}

impl ProviderCatalog {
    /// Catalog over an explicit provider list.
    #[must_use]
    pub fn new(providers: Vec<Arc<dyn UsageProvider>>) -> Self {
        Self { providers }
    }

    /// All built-in providers against their production endpoints.
    #[must_use]
    pub fn builtin(client: &reqwest::Client) -> Self {
        crate::providers::builtin(client, &crate::providers::Endpoints::default())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn UsageProvider>> {
        self.providers.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Drop providers named in `disabled` (CLI or display names).
    ///
    /// # Errors
    /// Returns [`BarError::UnknownProvider`] for a name matching no provider.
    pub fn without(mut self, disabled: &[String]) -> Result<Self> {
        let ids = disabled
            .iter()
            .map(|name| ProviderId::from_name(name))
            .collect::<Result<Vec<_>>>()?;
        self.providers.retain(|p| !ids.contains(&p.id()));
        Ok(self)
    }

    /// Providers that pass `filter` and whose availability rule holds.
    ///
    /// # Errors
    /// Returns [`BarError::UnknownProvider`] when `filter` names no provider.
    pub fn active(
        &self,
        bag: &CredentialBag,
        checker: &AvailabilityChecker,
        filter: Option<&str>,
    ) -> Result<Vec<Arc<dyn UsageProvider>>> {
        let wanted = filter.map(ProviderId::from_name).transpose()?;

        let active = self
            .providers
            .iter()
            .filter(|p| wanted.is_none_or(|id| p.id() == id))
            .filter(|p| {
                let available = checker.is_available(p.as_ref(), bag);
                tracing::debug!(provider = p.name(), available, "availability checked");
                available
            })
            .cloned()
            .collect();
        Ok(active)
    }
}
