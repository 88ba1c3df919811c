//! Fix suggestions for opencodebar errors.
//!
//! Maps each error to copy-paste commands and a short explanation so the
//! renderer can tell the user what to do next.

use super::BarError;
use crate::core::provider::ProviderId;

// =============================================================================
// Fix Suggestion Types
// =============================================================================

/// A fix suggestion for an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixSuggestion {
    /// Fix commands in order of preference. Lines starting with `#` are notes.
    pub commands: Vec<String>,

    /// Why this error occurred.
    pub context: String,

    /// How to avoid it next time.
    pub prevention: Option<String>,
}

impl FixSuggestion {
    /// Creates a new fix suggestion with required fields.
    #[must_use]
    pub fn new(commands: Vec<String>, context: impl Into<String>) -> Self {
        Self {
            commands,
            context: context.into(),
            prevention: None,
        }
    }

    /// Builder: adds prevention tips.
    #[must_use]
    pub fn with_prevention(mut self, prevention: impl Into<String>) -> Self {
        self.prevention = Some(prevention.into());
        self
    }

    /// First command that is not a note.
    #[must_use]
    pub fn primary_command(&self) -> Option<&str> {
        self.commands
            .iter()
            .map(String::as_str)
            .find(|c| !c.starts_with('#'))
    }
}

// =============================================================================
// Suggestion Generators
// =============================================================================

fn auth_hint(provider: &str) -> String {
    ProviderId::from_name(provider).map_or_else(
        |_| format!("# Configure credentials for {provider}"),
        |id| format!("# {}", id.auth_suggestion()),
    )
}

/// Suggestions when no credential source produced anything.
#[must_use]
pub fn no_credentials_suggestions() -> Vec<FixSuggestion> {
    vec![
        FixSuggestion::new(
            vec![
                "opencode auth login".to_string(),
                "export OPENROUTER_API_KEY=...".to_string(),
            ],
            "opencodebar reads OpenCode's auth.json, the linked-accounts file, \
             provider API key environment variables, and the OpenCode database. \
             None of them yielded a credential.",
        )
        .with_prevention("Sign in to at least one provider from OpenCode."),
    ]
}

/// Suggestions for a provider without credentials.
#[must_use]
pub fn auth_not_configured_suggestions(provider: &str) -> Vec<FixSuggestion> {
    vec![FixSuggestion::new(
        vec![auth_hint(provider), "opencodebar providers".to_string()],
        format!("No usable credential for {provider} was found."),
    )]
}

/// Suggestions for a rejected or unrefreshable credential.
#[must_use]
pub fn auth_rejected_suggestions(provider: &str) -> Vec<FixSuggestion> {
    vec![
        FixSuggestion::new(
            vec![auth_hint(provider)],
            format!(
                "{provider} refused the stored credential. It may have expired or \
                 been revoked."
            ),
        )
        .with_prevention("Re-authenticate from OpenCode when tokens are rotated."),
    ]
}

/// Suggestions for a provider that ran past its deadline.
#[must_use]
pub fn timeout_suggestions(provider: &str, seconds: u64) -> Vec<FixSuggestion> {
    let cli_name = ProviderId::from_name(provider).map_or(provider, |id| id.cli_name());
    vec![
        FixSuggestion::new(
            vec![format!(
                "opencodebar usage --provider {cli_name} --timeout {}",
                seconds.saturating_mul(2).min(300)
            )],
            format!("{provider} did not respond within {seconds}s."),
        )
        .with_prevention("Raise general.timeout_seconds in config.toml."),
    ]
}

/// Suggestions for configuration errors.
#[must_use]
pub fn config_suggestions(key: &str) -> Vec<FixSuggestion> {
    vec![FixSuggestion::new(
        vec![
            format!("# Fix '{key}' in config.toml"),
            "unset OPENCODEBAR_CONFIG".to_string(),
        ],
        "The configuration could not be applied.",
    )]
}

/// Suggestions for an unknown provider name.
#[must_use]
pub fn unknown_provider_suggestions(name: &str) -> Vec<FixSuggestion> {
    let valid = ProviderId::ALL
        .iter()
        .map(|p| p.cli_name())
        .collect::<Vec<_>>()
        .join(", ");
    vec![FixSuggestion::new(
        vec!["opencodebar providers".to_string()],
        format!("'{name}' is not a known provider. Valid names: {valid}."),
    )]
}

/// Suggestions for a missing external tool.
#[must_use]
pub fn command_not_found_suggestions(program: &str) -> Vec<FixSuggestion> {
    let commands = match program {
        "gcloud" => vec![
            "# Install the Google Cloud SDK: https://cloud.google.com/sdk/docs/install"
                .to_string(),
            "gcloud auth application-default login".to_string(),
        ],
        _ => vec![format!("# Install {program} and make sure it is on PATH")],
    };
    vec![FixSuggestion::new(
        commands,
        format!("{program} is required but was not found on PATH."),
    )]
}

impl BarError {
    /// Fix suggestions for this error. Empty when there is nothing actionable.
    #[must_use]
    pub fn fix_suggestions(&self) -> Vec<FixSuggestion> {
        match self {
            Self::NoCredentials => no_credentials_suggestions(),
            Self::AuthNotConfigured { provider, .. } | Self::NoAccounts { provider, .. } => {
                auth_not_configured_suggestions(provider)
            }
            Self::AuthRejected { provider, .. } | Self::TokenRefresh { provider, .. } => {
                auth_rejected_suggestions(provider)
            }
            Self::Timeout { provider, seconds } => timeout_suggestions(provider, *seconds),
            Self::ConfigParse { .. } => config_suggestions("config.toml"),
            Self::ConfigInvalid { key, .. } => config_suggestions(key),
            Self::UnknownProvider(name) => unknown_provider_suggestions(name),
            Self::CommandNotFound(program) => command_not_found_suggestions(program),
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn no_credentials_points_at_opencode_login() {
        let suggestions = BarError::NoCredentials.fix_suggestions();
        assert_eq!(
            suggestions[0].primary_command(),
            Some("opencode auth login")
        );
    }

    #[test]
    fn auth_hint_uses_provider_guidance() {
        let suggestions = BarError::AuthNotConfigured {
            provider: "Vertex AI".to_string(),
            reason: "no ADC".to_string(),
        }
        .fix_suggestions();
        assert!(suggestions[0].commands[0].contains("gcloud auth application-default login"));
    }

    #[test]
    fn timeout_doubles_deadline_with_cli_name() {
        let suggestions = BarError::timeout("GitHub Copilot", Duration::from_secs(15)).fix_suggestions();
        assert_eq!(
            suggestions[0].primary_command(),
            Some("opencodebar usage --provider copilot --timeout 30")
        );
    }

    #[test]
    fn timeout_suggestion_caps_at_limit() {
        let suggestions = timeout_suggestions("Claude", 250);
        assert!(suggestions[0].commands[0].ends_with("--timeout 300"));
    }

    #[test]
    fn timeout_suggestion_uses_cli_name_for_owned_names() {
        let known = String::from("GitHub Copilot");
        let unknown = String::from("Cursor");
        assert_eq!(
            timeout_suggestions(&known, 10)[0].commands[0],
            "opencodebar usage --provider copilot --timeout 20"
        );
        assert!(timeout_suggestions(&unknown, 10)[0].commands[0].contains("--provider Cursor"));
    }

    #[test]
    fn primary_command_skips_notes() {
        let suggestion = FixSuggestion::new(
            vec!["# note".to_string(), "run-me".to_string()],
            "context",
        );
        assert_eq!(suggestion.primary_command(), Some("run-me"));
    }

    #[test]
    fn transport_errors_have_no_suggestions() {
        assert!(BarError::Network("reset".to_string()).fix_suggestions().is_empty());
    }
}
