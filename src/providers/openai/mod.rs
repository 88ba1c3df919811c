//! OpenAI (ChatGPT subscription) provider.
//!
//! Reads the primary rate-limit window from the ChatGPT backend usage
//! endpoint used by Codex.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::core::credentials::CredentialBag;
use crate::core::http::send_json;
use crate::core::models::UsageReport;
use crate::core::provider::{ProviderId, UsageProvider};
use crate::error::{BarError, Result};
use crate::providers::join_url;
use crate::util::time::period_label;

const ACCOUNT_HEADER: &str = "ChatGPT-Account-Id";

#[derive(Debug, Deserialize)]
struct UsageResponse {
    #[serde(default)]
    rate_limit: Option<RateLimit>,
}

#[derive(Debug, Deserialize)]
struct RateLimit {
    #[serde(default)]
    primary_window: Option<Window>,
}

#[derive(Debug, Default, Deserialize)]
struct Window {
    #[serde(default)]
    used_percent: f64,
    /// Unix seconds.
    #[serde(default)]
    reset_at: Option<i64>,
}

/// ChatGPT usage window.
pub struct OpenAiProvider {
    client: reqwest::Client,
    base_url: String,
}

impl OpenAiProvider {
    #[must_use]
    pub fn new(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.to_string(),
        }
    }
}

#[async_trait]
impl UsageProvider for OpenAiProvider {
    fn id(&self) -> ProviderId {
        ProviderId::OpenAi
    }

    async fn fetch(&self, bag: &CredentialBag) -> Result<UsageReport> {
        let mut token = bag.get_nested_field("openai", "access");
        if token.is_empty() {
            token = bag.get_key(self.name());
        }
        if token.is_empty() {
            return Err(BarError::AuthNotConfigured {
                provider: self.name().to_string(),
                reason: "no ChatGPT access token".to_string(),
            });
        }

        let mut request = self
            .client
            .get(join_url(&self.base_url, "/backend-api/wham/usage"))
            .bearer_auth(&token);
        let account_id = bag.get_nested_field("openai", "accountId");
        if !account_id.is_empty() {
            request = request.header(ACCOUNT_HEADER, account_id);
        }
        let response: UsageResponse = send_json(self.name(), request).await?;

        let window = response
            .rate_limit
            .and_then(|r| r.primary_window)
            .unwrap_or_default();
        #[allow(clippy::cast_possible_truncation)]
        let used = (window.used_percent.trunc() as i64).clamp(0, 100);

        #[allow(clippy::cast_precision_loss)]
        let mut report =
            UsageReport::quota(self.name(), 100 - used, 100).with_usage_percent(used as f64);
        if let Some(reset) = window
            .reset_at
            .filter(|ts| *ts > 0)
            .and_then(|ts| DateTime::<Utc>::from_timestamp(ts, 0))
        {
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
