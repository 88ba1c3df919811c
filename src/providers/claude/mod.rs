//! Claude (Anthropic) provider.
//!
//! Reads the seven-day utilization window from the OAuth usage endpoint.
//! Utilization is a percentage, so the entitlement is a flat 100.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::core::credentials::CredentialBag;
use crate::core::http::send_json;
use crate::core::models::UsageReport;
use crate::core::provider::{ProviderId, UsageProvider};
use crate::error::{BarError, Result};
use crate::providers::join_url;
use crate::util::time::{parse_rfc3339, period_label};

/// Beta header required by the OAuth usage endpoint.
const OAUTH_BETA: &str = "oauth-2025-04-20";

#[derive(Debug, Deserialize)]
struct OAuthUsageResponse {
    #[serde(default)]
    seven_day: Option<UsageWindow>,
}

#[derive(Debug, Default, Deserialize)]
struct UsageWindow {
    #[serde(default)]
    utilization: f64,
    #[serde(default)]
    resets_at: Option<String>,
}

/// Seven-day window as fetched.
#[derive(Debug, Clone, PartialEq)]
pub struct SevenDayWindow {
    /// Whole percent used, as reported (may exceed 100).
    pub used_percent: i64,
    /// Whole percent left, floored at zero.
    pub remaining_percent: i64,
    pub resets_at: Option<DateTime<Utc>>,
}

/// Claude OAuth usage.
pub struct ClaudeProvider {
    client: reqwest::Client,
    base_url: String,
}

impl ClaudeProvider {
    #[must_use]
    pub fn new(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.to_string(),
        }
    }

    /// Fetch the seven-day window with `token`.
    ///
    /// # Errors
    /// Returns an error on transport failure, non-success status, or an
    /// undecodable body.
    pub async fn fetch_window(&self, token: &str) -> Result<SevenDayWindow> {
        let request = self
            .client
            .get(join_url(&self.base_url, "/api/oauth/usage"))
            .bearer_auth(token)
            .header("anthropic-beta", OAUTH_BETA);
        let response: OAuthUsageResponse = send_json(ProviderId::Claude.display_name(), request).await?;

        let window = response.seven_day.unwrap_or_default();
        #[allow(clippy::cast_possible_truncation)]
        let used_percent = window.utilization.trunc() as i64;
        Ok(SevenDayWindow {
            used_percent,
            remaining_percent: (100 - used_percent).max(0),
            resets_at: window.resets_at.as_deref().and_then(parse_rfc3339),
        })
    }
}

#[async_trait]
impl UsageProvider for ClaudeProvider {
    fn id(&self) -> ProviderId {
        ProviderId::Claude
    }

    async fn fetch(&self, bag: &CredentialBag) -> Result<UsageReport> {
        let Some(token) = bag.claude_key() else {
            return Err(BarError::AuthNotConfigured {
                provider: self.name().to_string(),
                reason: "no OAuth token or API key".to_string(),
            });
        };

        let window = self.fetch_window(&token).await?;
        #[allow(clippy::cast_precision_loss)]
        let usage_percent = window.used_percent as f64;
        let mut report = UsageReport::quota(self.name(), window.remaining_percent, 100)
            .with_usage_percent(usage_percent);
        if let Some(reset) = window.resets_at {
            report = report.with_refresh_label(period_label(
                "Weekly",
                reset,
                Utc::now(),
                "%m/%d %H:%M",
            ));
        }
        Ok(report)
    }
}
