//! Provider-specific fetchers.
//!
//! Each provider has its own submodule implementing [`UsageProvider`]
//! against one backend. Base URLs come from [`Endpoints`] so tests can point
//! adapters at a mock server.

pub mod antigravity;
pub mod claude;
pub mod copilot;
pub mod gemini;
pub mod google_ai_studio;
pub mod openai;
pub mod opencode_zen;
pub mod openrouter;
pub mod vertex;

use std::sync::Arc;

use crate::core::provider::{ProviderCatalog, UsageProvider};

pub use antigravity::AntigravityProvider;
pub use claude::ClaudeProvider;
pub use copilot::CopilotProvider;
pub use gemini::GeminiProvider;
pub use google_ai_studio::GoogleAiStudioProvider;
pub use openai::OpenAiProvider;
pub use opencode_zen::OpenCodeZenProvider;
pub use openrouter::OpenRouterProvider;
pub use vertex::VertexProvider;

/// Base URLs of every backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub openrouter: String,
    pub anthropic: String,
    pub cloudcode: String,
    pub google_oauth: String,
    pub chatgpt: String,
    pub monitoring: String,
    pub github: String,
    pub zen: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            openrouter: "https://openrouter.ai".to_string(),
            anthropic: "https://api.anthropic.com".to_string(),
            cloudcode: "https://cloudcode-pa.googleapis.com".to_string(),
            google_oauth: "https://oauth2.googleapis.com".to_string(),
            chatgpt: "https://chatgpt.com".to_string(),
            monitoring: "https://monitoring.googleapis.com".to_string(),
            github: "https://api.github.com".to_string(),
            zen: "https://api.z.ai".to_string(),
        }
    }
}

impl Endpoints {
    /// Every backend served from one base URL.
    #[must_use]
    pub fn all_at(base: &str) -> Self {
        let base = base.trim_end_matches('/').to_string();
        Self {
            openrouter: base.clone(),
            anthropic: base.clone(),
            cloudcode: base.clone(),
            google_oauth: base.clone(),
            chatgpt: base.clone(),
            monitoring: base.clone(),
            github: base.clone(),
            zen: base,
        }
    }
}

/// All built-in providers in registration order.
#[must_use]
pub fn builtin(client: &reqwest::Client, endpoints: &Endpoints) -> ProviderCatalog {
    let providers: Vec<Arc<dyn UsageProvider>> = vec![
        Arc::new(OpenRouterProvider::new(client.clone(), &endpoints.openrouter)),
        Arc::new(ClaudeProvider::new(client.clone(), &endpoints.anthropic)),
        Arc::new(GeminiProvider::new(
            client.clone(),
            &endpoints.cloudcode,
            &endpoints.google_oauth,
        )),
        Arc::new(OpenAiProvider::new(client.clone(), &endpoints.chatgpt)),
        Arc::new(VertexProvider::new(
            client.clone(),
            &endpoints.monitoring,
            &endpoints.google_oauth,
        )),
        Arc::new(GoogleAiStudioProvider),
        Arc::new(CopilotProvider::new(client.clone(), &endpoints.github)),
        Arc::new(AntigravityProvider::new(
            ClaudeProvider::new(client.clone(), &endpoints.anthropic),
            GeminiProvider::new(client.clone(), &endpoints.cloudcode, &endpoints.google_oauth),
        )),
        Arc::new(OpenCodeZenProvider::new(client.clone(), &endpoints.zen)),
    ];
    ProviderCatalog::new(providers)
}

/// Join a base URL and a path without doubling slashes.
pub(crate) fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
