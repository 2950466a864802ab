//! Mock provider for local runs and tests.

use super::{FinishReason, GenerationParams, ProviderError, ProviderResponse, TextProvider};
use async_trait::async_trait;

const DEFAULT_COMPLETION: &str =
    "  This well-equipped vehicle is ready for its next owner. Schedule a test drive today.  ";

pub struct MockTextProvider {
    enabled: bool,
    completion: String,
}

impl MockTextProvider {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            completion: DEFAULT_COMPLETION.to_string(),
        }
    }

    pub fn with_completion(completion: impl Into<String>) -> Self {
        Self {
            enabled: true,
            completion: completion.into(),
        }
    }
}

#[async_trait]
impl TextProvider for MockTextProvider {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn generate(
        &self,
        prompt: &str,
        _params: &GenerationParams,
    ) -> Result<ProviderResponse, ProviderError> {
        if !self.enabled {
            return Err(ProviderError::NotConfigured(
                "Mock text provider not enabled".to_string(),
            ));
        }

        Ok(ProviderResponse {
            text: self.completion.clone(),
            input_tokens: prompt.len() as i32 / 4,
            output_tokens: self.completion.len() as i32 / 4,
            finish_reason: FinishReason::Complete,
        })
    }
}
