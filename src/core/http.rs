//! HTTP client utilities.
//!
//! Provides the shared HTTP client and the request helper every provider
//! adapter uses, so status and transport failures map to [`BarError`]
//! the same way everywhere.

use std::time::Duration;

use reqwest::{Client, ClientBuilder, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;

use crate::error::{BarError, Result};

/// Default timeout for HTTP requests.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Build a configured HTTP client.
///
/// # Errors
///
/// Returns error if client construction fails.
pub fn build_client(timeout: Duration) -> Result<Client> {
    ClientBuilder::new()
        .timeout(timeout)
        .user_agent(format!("opencodebar/{}", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| BarError::Network(e.to_string()))
}

/// Get or create a default HTTP client.
///
/// # Errors
///
/// Returns error if client construction fails.
pub fn default_client() -> Result<Client> {
    build_client(DEFAULT_TIMEOUT)
}

/// Map a transport error for `provider`.
pub(crate) fn transport_error(provider: &str, err: &reqwest::Error) -> BarError {
    if err.is_timeout() {
        BarError::Timeout {
            provider: provider.to_string(),
            seconds: DEFAULT_TIMEOUT.as_secs(),
        }
    } else {
        BarError::Network(err.to_string())
    }
}

/// Map a non-success status for `provider`.
pub(crate) fn status_error(provider: &str, status: StatusCode) -> BarError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => BarError::AuthRejected {
            provider: provider.to_string(),
            status: status.as_u16(),
        },
        _ => BarError::ApiStatus {
            provider: provider.to_string(),
            status: status.as_u16(),
        },
    }
}

/// Send `request` and decode a JSON body.
///
/// # Errors
///
/// - [`BarError::Timeout`] / [`BarError::Network`] on transport failure
/// - [`BarError::AuthRejected`] on 401/403
/// - [`BarError::ApiStatus`] on any other non-success status
/// - [`BarError::ParseResponse`] when the body does not decode
pub async fn send_json<T: DeserializeOwned>(provider: &str, request: RequestBuilder) -> Result<T> {
    let response = request
        .send()
        .await
        .map_err(|e| transport_error(provider, &e))?;

    let status = response.status();
    if !status.is_success() {
        tracing::debug!(provider, status = status.as_u16(), "non-success response");
        return Err(status_error(provider, status));
    }

    let body = response
        .text()
        .await
        .map_err(|e| transport_error(provider, &e))?;
    serde_json::from_str(&body).map_err(|e| BarError::parse(provider, e))
}
