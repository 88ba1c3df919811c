//! Antigravity provider.
//!
//! Groups the Claude and Gemini CLI quotas under one multi-account row.
//! Each identity that resolves becomes a sub-account; failures of one
//! identity are logged and skipped.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;

use crate::core::credentials::CredentialBag;
use crate::core::models::{SubAccount, UsageReport};
use crate::core::provider::{ProviderId, UsageProvider};
use crate::error::{BarError, Result};
use crate::providers::claude::ClaudeProvider;
use crate::providers::gemini::GeminiProvider;
use crate::util::time::countdown_label;

/// Claude and Gemini as sub-accounts.
pub struct AntigravityProvider {
    claude: ClaudeProvider,
    gemini: GeminiProvider,
}

impl AntigravityProvider {
    #[must_use]
    pub const fn new(claude: ClaudeProvider, gemini: GeminiProvider) -> Self {
        Self { claude, gemini }
    }

    async fn claude_account(&self, bag: &CredentialBag, index: usize) -> Result<SubAccount> {
        let oauth = bag.get_nested_field("anthropic", "access");
        let Some(token) = Some(oauth)
            .filter(|t| !t.is_empty())
            .or_else(|| bag.claude_key())
        else {
            return Err(BarError::AuthNotConfigured {
                provider: ProviderId::Claude.display_name().to_string(),
                reason: "no anthropic token".to_string(),
            });
        };

        let window = self.claude.fetch_window(&token).await?;
        let label = window.resets_at.map_or_else(
            || "Claude".to_string(),
            |reset| countdown_label("Claude", reset, Utc::now()),
        );
        Ok(SubAccount::new(index, label, window.remaining_percent, 100))
    }

    async fn gemini_account(&self, bag: &CredentialBag, index: usize) -> Result<SubAccount> {
        let snapshot = self.gemini.fetch_quota(bag).await?;
        let remaining = snapshot.remaining_percent();
        let label = snapshot.resets_at.map_or_else(
            || "Gemini".to_string(),
            |reset| countdown_label("Gemini", reset, Utc::now()),
        );
        let breakdown = BTreeMap::from([("used".to_string(), 100 - remaining)]);
        Ok(SubAccount::new(index, label, remaining, 100).with_breakdown(breakdown))
    }
}

#[async_trait]
impl UsageProvider for AntigravityProvider {
    fn id(&self) -> ProviderId {
        ProviderId::Antigravity
    }

    async fn fetch(&self, bag: &CredentialBag) -> Result<UsageReport> {
        let mut accounts = Vec::new();

        match self.claude_account(bag, accounts.len()).await {
            Ok(account) => accounts.push(account),
            Err(e) => tracing::debug!(provider = self.name(), error = %e, "claude identity skipped"),
        }
        match self.gemini_account(bag, accounts.len()).await {
            Ok(account) => accounts.push(account),
            Err(e) => tracing::debug!(provider = self.name(), error = %e, "gemini identity skipped"),
        }

        if accounts.is_empty() {
            return Err(BarError::NoAccounts {
                provider: self.name().to_string(),
                reason: "missing anthropic/gemini tokens".to_string(),
            });
        }
        Ok(UsageReport::multi_account(self.name(), accounts))
    }
}
