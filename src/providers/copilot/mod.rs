//! GitHub Copilot provider.
//!
//! Reads the premium-interactions quota from the internal Copilot user
//! endpoint with the OAuth token OpenCode stores.

use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;

use crate::core::credentials::CredentialBag;
use crate::core::http::send_json;
use crate::core::models::UsageReport;
use crate::core::provider::{ProviderId, UsageProvider};
use crate::error::{BarError, Result};
use crate::providers::join_url;
use crate::util::time::{parse_rfc3339, period_label};

#[derive(Debug, Deserialize)]
struct CopilotUser {
    #[serde(default)]
    quota_reset_date_utc: Option<String>,
    #[serde(default)]
    quota_snapshots: QuotaSnapshots,
}

#[derive(Debug, Default, Deserialize)]
struct QuotaSnapshots {
    #[serde(default)]
    premium_interactions: PremiumInteractions,
}

#[derive(Debug, Default, Deserialize)]
struct PremiumInteractions {
    #[serde(default)]
    entitlement: i64,
    #[serde(default)]
    remaining: i64,
    #[serde(default)]
    #[allow(dead_code)]
    percent_remaining: f64,
    #[serde(default)]
    overage_permitted: bool,
}

/// Copilot premium request quota.
pub struct CopilotProvider {
    client: reqwest::Client,
    base_url: String,
}

impl CopilotProvider {
    #[must_use]
    pub fn new(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.to_string(),
        }
    }
}

#[async_trait]
impl UsageProvider for CopilotProvider {
    fn id(&self) -> ProviderId {
        ProviderId::Copilot
    }

    async fn fetch(&self, bag: &CredentialBag) -> Result<UsageReport> {
        let oauth = bag.get_nested_field("github-copilot", "access");
        let Some(token) = Some(oauth)
            .filter(|t| !t.is_empty())
            .or_else(|| bag.copilot_token())
        else {
            return Err(BarError::AuthNotConfigured {
                provider: self.name().to_string(),
                reason: "no GitHub Copilot OAuth token".to_string(),
            });
        };

        let request = self
            .client
            .get(join_url(&self.base_url, "/copilot_internal/user"))
            .header(reqwest::header::AUTHORIZATION, format!("token {token}"));
        let user: CopilotUser = send_json(self.name(), request).await?;

        let premium = user.quota_snapshots.premium_interactions;
        if premium.entitlement == 0 {
            return Err(BarError::parse(
                self.name(),
                "no premium_interactions quota data in response",
            ));
        }

        let used = premium.entitlement - premium.remaining;
        #[allow(clippy::cast_precision_loss)]
        let usage_percent = ((used * 100) / premium.entitlement) as f64;

        let label = user
            .quota_reset_date_utc
            .as_deref()
            .and_then(parse_rfc3339)
            .map_or_else(
                || "Monthly".to_string(),
                |reset| period_label("Monthly", reset, Utc::now(), "%m/%d"),
            );

        Ok(
            UsageReport::quota(self.name(), premium.remaining, premium.entitlement)
                .with_usage_percent(usage_percent)
                .with_overage_permitted(premium.overage_permitted)
                .with_refresh_label(label),
        )
    }
}
