//! Google AI Studio provider.
//!
//! AI Studio exposes no quota endpoint for API keys, so a fetch always
//! reports the backend as unsupported. The provider stays registered so the
//! key is visible and the row explains itself.

use async_trait::async_trait;

use crate::core::credentials::CredentialBag;
use crate::core::models::UsageReport;
use crate::core::provider::{ProviderId, UsageProvider};
use crate::error::{BarError, Result};

/// Google AI Studio placeholder.
#[derive(Debug, Default, Clone, Copy)]
pub struct GoogleAiStudioProvider;

#[async_trait]
impl UsageProvider for GoogleAiStudioProvider {
    fn id(&self) -> ProviderId {
        ProviderId::GoogleAiStudio
    }

    async fn fetch(&self, _bag: &CredentialBag) -> Result<UsageReport> {
        Err(BarError::Unsupported {
            provider: self.name().to_string(),
            reason: "no quota API for API keys".to_string(),
        })
    }
}
