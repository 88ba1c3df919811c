//! Gemini CLI provider.
//!
//! Queries the Cloud Code quota endpoint. Each model bucket reports a
//! remaining fraction; the tightest bucket wins.

pub mod oauth;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::core::credentials::CredentialBag;
use crate::core::http::send_json;
use crate::core::models::UsageReport;
use crate::core::provider::{ProviderId, UsageProvider};
use crate::error::{BarError, Result};
use crate::providers::join_url;
use crate::util::time::parse_rfc3339;

pub use oauth::{AuthState, TokenRefresher};

#[derive(Debug, Deserialize)]
struct QuotaResponse {
    #[serde(default)]
    buckets: Vec<QuotaBucket>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuotaBucket {
    #[serde(default)]
    #[allow(dead_code)]
    display_name: Option<String>,
    #[serde(default)]
    remaining_fraction: f64,
    #[serde(default)]
    reset_time: Option<String>,
}

/// Tightest bucket across all models.
#[derive(Debug, Clone, PartialEq)]
pub struct QuotaSnapshot {
    /// Smallest remaining fraction, in `0.0..=1.0`.
    pub remaining_fraction: f64,
    /// Reset time of that bucket.
    pub resets_at: Option<DateTime<Utc>>,
}

impl QuotaSnapshot {
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn remaining_percent(&self) -> i64 {
        (self.remaining_fraction * 100.0) as i64
    }

    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn used_percent(&self) -> i64 {
        ((1.0 - self.remaining_fraction) * 100.0) as i64
    }
}

/// Gemini CLI quota.
pub struct GeminiProvider {
    client: reqwest::Client,
    base_url: String,
    refresher: TokenRefresher,
}

impl GeminiProvider {
    #[must_use]
    pub fn new(client: reqwest::Client, base_url: &str, oauth_base: &str) -> Self {
        Self {
            refresher: TokenRefresher::new(client.clone(), oauth_base),
            client,
            base_url: base_url.to_string(),
        }
    }

    /// Query quota buckets with an access token.
    ///
    /// # Errors
    /// Returns [`BarError::AuthRejected`] on 401/403, and a parse error when
    /// the response has no buckets.
    pub async fn query_quota(&self, token: &str) -> Result<QuotaSnapshot> {
        let name = ProviderId::GeminiCli.display_name();
        let request = self
            .client
            .post(join_url(&self.base_url, "/v1internal:retrieveUserQuota"))
            .bearer_auth(token)
            .json(&serde_json::json!({}));
        let response: QuotaResponse = send_json(name, request).await?;

        if response.buckets.is_empty() {
            return Err(BarError::parse(name, "no quota buckets found"));
        }

        let mut snapshot = QuotaSnapshot {
            remaining_fraction: 1.0,
            resets_at: None,
        };
        for bucket in &response.buckets {
            if bucket.remaining_fraction < snapshot.remaining_fraction {
                snapshot.remaining_fraction = bucket.remaining_fraction.max(0.0);
                snapshot.resets_at = bucket.reset_time.as_deref().and_then(parse_rfc3339);
            }
        }
        Ok(snapshot)
    }

    /// Drive the auth state machine until the quota comes back or the flow
    /// fails. A rejected token is refreshed at most once.
    ///
    /// # Errors
    /// Returns the refresh failure when no usable token can be obtained, or
    /// the original rejection when the refreshed token is also refused.
    pub async fn fetch_quota(&self, bag: &CredentialBag) -> Result<QuotaSnapshot> {
        let name = ProviderId::GeminiCli.display_name();
        let mut state = AuthState::from_token(bag.gemini_key().unwrap_or_default());
        let mut refreshed = false;
        let mut last_error: Option<BarError> = None;

        loop {
            tracing::trace!(provider = name, state = state.label(), "gemini auth step");
            state = match state {
                AuthState::NeedAuth | AuthState::Expired if !refreshed => AuthState::Refreshing,
                AuthState::NeedAuth | AuthState::Expired => AuthState::Failed,
                AuthState::Refreshing => {
                    refreshed = true;
                    match self.refresher.refresh(name, bag.linked_accounts().as_ref()).await {
                        Ok(token) => AuthState::Authorized(token),
                        Err(e) => {
                            tracing::debug!(provider = name, error = %e, "token refresh failed");
                            last_error.get_or_insert(e);
                            AuthState::Failed
                        }
                    }
                }
                AuthState::Authorized(token) => match self.query_quota(&token).await {
                    Ok(snapshot) => return Ok(snapshot),
                    Err(e) if e.is_auth_rejection() && !refreshed => {
                        last_error = Some(e);
                        AuthState::Expired
                    }
                    Err(e) => return Err(e),
                },
                AuthState::Failed => {
                    return Err(last_error.unwrap_or_else(|| BarError::AuthNotConfigured {
                        provider: name.to_string(),
                        reason: "no access token and no refresh credentials".to_string(),
                    }));
                }
            };
        }
    }
}

#[async_trait]
impl UsageProvider for GeminiProvider {
    fn id(&self) -> ProviderId {
        ProviderId::GeminiCli
    }

    async fn fetch(&self, bag: &CredentialBag) -> Result<UsageReport> {
        let snapshot = self.fetch_quota(bag).await?;

        #[allow(clippy::cast_precision_loss)]
        let usage_percent = snapshot.used_percent() as f64;
        Ok(UsageReport::quota(self.name(), snapshot.remaining_percent(), 100)
            .with_usage_percent(usage_percent))
    }
}
