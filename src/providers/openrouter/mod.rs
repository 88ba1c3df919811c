//! OpenRouter provider.
//!
//! Pay-as-you-go: reports total credit spend from `GET /api/v1/credits`.

use async_trait::async_trait;
use serde::Deserialize;

use crate::core::credentials::CredentialBag;
use crate::core::http::send_json;
use crate::core::models::UsageReport;
use crate::core::provider::{ProviderId, UsageProvider};
use crate::error::{BarError, Result};
use crate::providers::join_url;

#[derive(Debug, Deserialize)]
struct CreditsResponse {
    data: CreditsData,
}

#[derive(Debug, Deserialize)]
struct CreditsData {
    #[serde(default)]
    total_usage: f64,
}

/// OpenRouter credit usage.
pub struct OpenRouterProvider {
    client: reqwest::Client,
    base_url: String,
}

impl OpenRouterProvider {
    #[must_use]
    pub fn new(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.to_string(),
        }
    }
}

#[async_trait]
impl UsageProvider for OpenRouterProvider {
    fn id(&self) -> ProviderId {
        ProviderId::OpenRouter
    }

    async fn fetch(&self, bag: &CredentialBag) -> Result<UsageReport> {
        let Some(key) = bag.openrouter_key() else {
            return Err(BarError::AuthNotConfigured {
                provider: self.name().to_string(),
                reason: "no API key".to_string(),
            });
        };

        let request = self
            .client
            .get(join_url(&self.base_url, "/api/v1/credits"))
            .bearer_auth(&key);
        let credits: CreditsResponse = send_json(self.name(), request).await?;

        Ok(UsageReport::pay_as_you_go(self.name(), credits.data.total_usage))
    }
}
