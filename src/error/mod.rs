//! Error types for opencodebar.
//!
//! Uses `thiserror` for structured error types that map to exit codes.
//!
//! ## Error Taxonomy
//!
//! - **Authentication**: missing, expired, or rejected credentials
//! - **Network**: connection failures and timeouts
//! - **Configuration**: config file parsing, invalid values, unknown providers
//! - **Provider**: non-success responses and malformed payloads
//! - **Environment**: nothing to work with on this machine
//! - **Internal**: I/O, serialization, and unclassified failures
//!
//! Only [`BarError::NoCredentials`] and configuration errors abort a run.
//! Everything a provider raises during a fetch is folded into that
//! provider's report by the orchestrator.

mod suggestions;

use std::time::Duration;

use thiserror::Error;

pub use suggestions::FixSuggestion;

// =============================================================================
// Error Categories
// =============================================================================

/// High-level error categories for classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Missing, expired, or rejected credentials.
    Authentication,
    /// Connection failures and timeouts.
    Network,
    /// Config parse errors, invalid values, unknown provider names.
    Configuration,
    /// Non-success responses, malformed payloads, unsupported backends.
    Provider,
    /// Nothing usable on this machine.
    Environment,
    /// Bugs, I/O, serialization.
    Internal,
}

impl ErrorCategory {
    /// Returns a human-readable description of the category.
    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::Authentication => "Authentication error",
            Self::Network => "Network error",
            Self::Configuration => "Configuration error",
            Self::Provider => "Provider error",
            Self::Environment => "Environment error",
            Self::Internal => "Internal error",
        }
    }

    /// Returns a short code prefix for this category.
    #[must_use]
    pub const fn code_prefix(&self) -> &'static str {
        match self {
            Self::Authentication => "A",
            Self::Network => "N",
            Self::Configuration => "C",
            Self::Provider => "P",
            Self::Environment => "E",
            Self::Internal => "X",
        }
    }
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.description())
    }
}

// =============================================================================
// Exit Codes
// =============================================================================

/// Process exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExitCode {
    /// Success
    Success = 0,
    /// Unexpected failure
    GeneralError = 1,
    /// No credentials were found anywhere
    NoCredentials = 2,
    /// Configuration or parse errors
    ParseError = 3,
    /// Timeout
    Timeout = 4,
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as Self
    }
}

/// Main error type for opencodebar operations.
#[derive(Error, Debug)]
pub enum BarError {
    // ==========================================================================
    // Authentication errors
    // ==========================================================================
    /// No credential for the provider could be located in the bag.
    #[error("no credentials for {provider}: {reason}")]
    AuthNotConfigured { provider: String, reason: String },

    /// The backend rejected the credential (401/403).
    #[error("authentication rejected by {provider} (HTTP {status})")]
    AuthRejected { provider: String, status: u16 },

    /// An OAuth refresh-token exchange failed.
    #[error("token refresh failed for {provider}: {reason}")]
    TokenRefresh { provider: String, reason: String },

    // ==========================================================================
    // Network errors
    // ==========================================================================
    /// Per-provider deadline elapsed.
    #[error("request timeout after {seconds}s for {provider}")]
    Timeout { provider: String, seconds: u64 },

    /// The batch was cancelled before this provider finished.
    #[error("fetch cancelled for {provider}")]
    Cancelled { provider: String },

    /// Transport-level failure.
    #[error("network error: {0}")]
    Network(String),

    // ==========================================================================
    // Configuration errors
    // ==========================================================================
    /// Error parsing the configuration file.
    #[error("config parse error at {path}: {message}")]
    ConfigParse { path: String, message: String },

    /// Invalid value in configuration.
    #[error("invalid config value for '{key}': {message}")]
    ConfigInvalid { key: String, message: String },

    /// Provider filter did not match any catalog entry.
    #[error("unknown provider: {0}")]
    UnknownProvider(String),

    // ==========================================================================
    // Provider errors
    // ==========================================================================
    /// Backend returned a non-success status.
    #[error("{provider} API returned status {status}")]
    ApiStatus { provider: String, status: u16 },

    /// Backend payload could not be interpreted.
    #[error("failed to parse {provider} response: {message}")]
    ParseResponse { provider: String, message: String },

    /// Backend has no usable quota endpoint.
    #[error("{provider} quota checking is not supported: {reason}")]
    Unsupported { provider: String, reason: String },

    /// A multi-identity provider resolved none of its identities.
    #[error("no {provider} accounts found ({reason})")]
    NoAccounts { provider: String, reason: String },

    // ==========================================================================
    // Environment errors
    // ==========================================================================
    /// Nothing to do: not one credential was discovered.
    #[error("no provider credentials found (no auth.json, no linked accounts, no environment variables, no OpenCode database)")]
    NoCredentials,

    /// Required external tool missing from PATH.
    #[error("command not found: {0}")]
    CommandNotFound(String),

    /// External tool ran but did not produce usable output.
    #[error("{program} failed: {reason}")]
    CommandFailed { program: String, reason: String },

    // ==========================================================================
    // Internal errors
    // ==========================================================================
    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Embedded database query failed.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Catch-all for other errors.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl BarError {
    /// Map error to process exit code.
    #[must_use]
    pub const fn exit_code(&self) -> ExitCode {
        match self {
            Self::NoCredentials => ExitCode::NoCredentials,

            Self::ConfigParse { .. }
            | Self::ConfigInvalid { .. }
            | Self::UnknownProvider(_)
            | Self::ParseResponse { .. } => ExitCode::ParseError,

            Self::Timeout { .. } => ExitCode::Timeout,

            Self::AuthNotConfigured { .. }
            | Self::AuthRejected { .. }
            | Self::TokenRefresh { .. }
            | Self::Cancelled { .. }
            | Self::Network(_)
            | Self::ApiStatus { .. }
            | Self::Unsupported { .. }
            | Self::NoAccounts { .. }
            | Self::CommandNotFound(_)
            | Self::CommandFailed { .. }
            | Self::Io(_)
            | Self::Json(_)
            | Self::Database(_)
            | Self::Other(_) => ExitCode::GeneralError,
        }
    }

    /// Returns the error category.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::AuthNotConfigured { .. }
            | Self::AuthRejected { .. }
            | Self::TokenRefresh { .. } => ErrorCategory::Authentication,

            Self::Timeout { .. } | Self::Cancelled { .. } | Self::Network(_) => {
                ErrorCategory::Network
            }

            Self::ConfigParse { .. } | Self::ConfigInvalid { .. } | Self::UnknownProvider(_) => {
                ErrorCategory::Configuration
            }

            Self::ApiStatus { .. }
            | Self::ParseResponse { .. }
            | Self::Unsupported { .. }
            | Self::NoAccounts { .. } => ErrorCategory::Provider,

            Self::NoCredentials | Self::CommandNotFound(_) | Self::CommandFailed { .. } => {
                ErrorCategory::Environment
            }

            Self::Io(_) | Self::Json(_) | Self::Database(_) | Self::Other(_) => {
                ErrorCategory::Internal
            }
        }
    }

    /// Returns a stable error code for programmatic handling.
    ///
    /// Format: `OCB-{category}{number}`.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::AuthNotConfigured { .. } => "OCB-A001",
            Self::AuthRejected { .. } => "OCB-A002",
            Self::TokenRefresh { .. } => "OCB-A003",

            Self::Timeout { .. } => "OCB-N001",
            Self::Cancelled { .. } => "OCB-N002",
            Self::Network(_) => "OCB-N099",

            Self::ConfigParse { .. } => "OCB-C001",
            Self::ConfigInvalid { .. } => "OCB-C002",
            Self::UnknownProvider(_) => "OCB-C010",

            Self::ApiStatus { .. } => "OCB-P001",
            Self::ParseResponse { .. } => "OCB-P002",
            Self::Unsupported { .. } => "OCB-P003",
            Self::NoAccounts { .. } => "OCB-P004",

            Self::NoCredentials => "OCB-E001",
            Self::CommandNotFound(_) => "OCB-E002",
            Self::CommandFailed { .. } => "OCB-E003",

            Self::Io(_) => "OCB-X001",
            Self::Json(_) => "OCB-X002",
            Self::Database(_) => "OCB-X003",
            Self::Other(_) => "OCB-X099",
        }
    }

    /// Returns the provider name if this error is provider-specific.
    #[must_use]
    pub fn provider(&self) -> Option<&str> {
        match self {
            Self::AuthNotConfigured { provider, .. }
            | Self::AuthRejected { provider, .. }
            | Self::TokenRefresh { provider, .. }
            | Self::Timeout { provider, .. }
            | Self::Cancelled { provider }
            | Self::ApiStatus { provider, .. }
            | Self::ParseResponse { provider, .. }
            | Self::Unsupported { provider, .. }
            | Self::NoAccounts { provider, .. } => Some(provider),
            Self::UnknownProvider(p) => Some(p),
            _ => None,
        }
    }

    /// Whether this is an authentication failure that a token refresh may cure.
    #[must_use]
    pub const fn is_auth_rejection(&self) -> bool {
        matches!(self, Self::AuthRejected { .. })
    }

    /// Build a timeout error from a deadline.
    #[must_use]
    pub fn timeout(provider: &str, deadline: Duration) -> Self {
        Self::Timeout {
            provider: provider.to_string(),
            seconds: deadline.as_secs(),
        }
    }

    /// Build a parse error for a provider payload.
    pub fn parse(provider: &str, message: impl std::fmt::Display) -> Self {
        Self::ParseResponse {
            provider: provider.to_string(),
            message: message.to_string(),
        }
    }
}

/// Result type alias using `BarError`.
pub type Result<T> = std::result::Result<T, BarError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_category_code_prefix() {
        assert_eq!(ErrorCategory::Authentication.code_prefix(), "A");
        assert_eq!(ErrorCategory::Network.code_prefix(), "N");
        assert_eq!(ErrorCategory::Configuration.code_prefix(), "C");
        assert_eq!(ErrorCategory::Provider.code_prefix(), "P");
        assert_eq!(ErrorCategory::Environment.code_prefix(), "E");
        assert_eq!(ErrorCategory::Internal.code_prefix(), "X");
    }

    #[test]
    fn error_codes_match_category_prefix() {
        let errors = vec![
            BarError::AuthRejected {
                provider: "Claude".to_string(),
                status: 401,
            },
            BarError::timeout("OpenAI", Duration::from_secs(5)),
            BarError::UnknownProvider("nope".to_string()),
            BarError::ApiStatus {
                provider: "OpenRouter".to_string(),
                status: 500,
            },
            BarError::NoCredentials,
            BarError::Network("reset".to_string()),
        ];

        for err in errors {
            let code = err.error_code();
            let expected = format!("OCB-{}", err.category().code_prefix());
            assert!(
                code.starts_with(&expected),
                "{code} should start with {expected}"
            );
        }
    }

    #[test]
    fn no_credentials_is_the_only_environment_exit() {
        assert_eq!(BarError::NoCredentials.exit_code(), ExitCode::NoCredentials);
        assert_eq!(
            BarError::ConfigInvalid {
                key: "general.timeout_seconds".to_string(),
                message: "too large".to_string(),
            }
            .exit_code(),
            ExitCode::ParseError
        );
        assert_eq!(
            BarError::timeout("Claude", Duration::from_secs(3)).exit_code(),
            ExitCode::Timeout
        );
    }

    #[test]
    fn provider_extraction() {
        let err = BarError::ApiStatus {
            provider: "GitHub Copilot".to_string(),
            status: 403,
        };
        assert_eq!(err.provider(), Some("GitHub Copilot"));
        assert_eq!(BarError::NoCredentials.provider(), None);
    }

    #[test]
    fn display_messages_are_lowercase_and_specific() {
        let err = BarError::ApiStatus {
            provider: "claude".to_string(),
            status: 500,
        };
        assert_eq!(err.to_string(), "claude API returned status 500");

        let err = BarError::timeout("Vertex AI", Duration::from_secs(15));
        assert_eq!(err.to_string(), "request timeout after 15s for Vertex AI");
    }

    #[test]
    fn auth_rejection_detection() {
        assert!(
            BarError::AuthRejected {
                provider: "Gemini CLI".to_string(),
                status: 401
            }
            .is_auth_rejection()
        );
        assert!(
            !BarError::ApiStatus {
                provider: "Gemini CLI".to_string(),
                status: 500
            }
            .is_auth_rejection()
        );
    }
}
