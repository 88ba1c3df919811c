//! Google OAuth refresh for the Gemini CLI backend.
//!
//! Access tokens come either straight from the credential bag or from a
//! refresh-token exchange using the linked accounts file. A request rejected
//! with 401/403 triggers exactly one refresh and one retry.

use serde::Deserialize;

use crate::core::credentials::LinkedAccounts;
use crate::core::http::{status_error, transport_error};
use crate::error::{BarError, Result};
use crate::providers::join_url;

#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: String,
}

/// Exchanges a refresh token for an access token.
#[derive(Debug, Clone)]
pub struct TokenRefresher {
    client: reqwest::Client,
    token_url: String,
}

impl TokenRefresher {
    #[must_use]
    pub fn new(client: reqwest::Client, oauth_base: &str) -> Self {
        Self {
            client,
            token_url: join_url(oauth_base, "/token"),
        }
    }

    /// Run the `refresh_token` grant for `linked`.
    ///
    /// # Errors
    /// Returns [`BarError::TokenRefresh`] when the linked accounts cannot
    /// refresh, the endpoint refuses, or no access token comes back.
    pub async fn refresh(&self, provider: &str, linked: Option<&LinkedAccounts>) -> Result<String> {
        let failed = |reason: String| BarError::TokenRefresh {
            provider: provider.to_string(),
            reason,
        };

        let Some(linked) = linked else {
            return Err(failed("no linked accounts file".to_string()));
        };
        if !linked.can_refresh() {
            return Err(failed(
                "missing client_id or refresh_token in linked accounts".to_string(),
            ));
        }

        let form = [
            ("grant_type", "refresh_token"),
            ("client_id", linked.client_id.as_str()),
            ("client_secret", linked.client_secret.as_str()),
            ("refresh_token", linked.refresh_token.as_str()),
        ];
        let response = self
            .client
            .post(&self.token_url)
            .form(&form)
            .send()
            .await
            .map_err(|e| transport_error(provider, &e))?;

        if !response.status().is_success() {
            let status = status_error(provider, response.status());
            return Err(failed(status.to_string()));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| failed(format!("invalid token response: {e}")))?;
        if token.access_token.is_empty() {
            return Err(failed("token response carried no access_token".to_string()));
        }
        Ok(token.access_token)
    }
}

/// Where the Gemini authorization flow stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
    /// No access token yet.
    NeedAuth,
    /// Holding a token believed valid.
    Authorized(String),
    /// The backend rejected the held token.
    Expired,
    /// Exchanging the refresh token.
    Refreshing,
    /// Gave up.
    Failed,
}

impl AuthState {
    /// Initial state for an access token that may be empty.
    #[must_use]
    pub fn from_token(token: String) -> Self {
        if token.is_empty() {
            Self::NeedAuth
        } else {
            Self::Authorized(token)
        }
    }

    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::NeedAuth => "need-auth",
            Self::Authorized(_) => "authorized",
            Self::Expired => "expired",
            Self::Refreshing => "refreshing",
            Self::Failed => "failed",
        }
    }
}
