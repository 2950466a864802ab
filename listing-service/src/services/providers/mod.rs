//! Text-generation provider abstractions and implementations.
//!
//! The description generator only sees the `TextProvider` trait, so the
//! backend (Bedrock, OpenAI, mock) is chosen once at startup.

pub mod bedrock;
pub mod mock;
pub mod openai;

use async_trait::async_trait;
use thiserror::Error;

pub use bedrock::BedrockTextProvider;
pub use mock::MockTextProvider;
pub use openai::{OpenAiConfig, OpenAiTextProvider};

/// Error type for provider operations.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Rate limited")]
    RateLimited,

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Model returned an empty completion")]
    EmptyCompletion,
}

/// Result of a provider call.
#[derive(Debug, Clone)]
pub struct ProviderResponse {
    pub text: String,
    pub input_tokens: i32,
    pub output_tokens: i32,
    pub finish_reason: FinishReason,
}

/// Reason why generation stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishReason {
    Complete,
    Length,
    ContentFilter,
}

impl FinishReason {
    pub fn from_stop_reason(reason: Option<&str>) -> Self {
        match reason {
            Some("max_tokens") | Some("length") => FinishReason::Length,
            Some("content_filter") | Some("guardrail_intervened") => FinishReason::ContentFilter,
            _ => FinishReason::Complete,
        }
    }
}

/// Sampling parameters sent with every request.
#[derive(Debug, Clone)]
pub struct GenerationParams {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: i32,
}

#[async_trait]
pub trait TextProvider: Send + Sync {
    /// Provider name used in logs and metric labels.
    fn name(&self) -> &'static str;

    async fn generate(
        &self,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<ProviderResponse, ProviderError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stop_reasons() {
        assert_eq!(FinishReason::from_stop_reason(Some("end_turn")), FinishReason::Complete);
        assert_eq!(FinishReason::from_stop_reason(Some("max_tokens")), FinishReason::Length);
        assert_eq!(FinishReason::from_stop_reason(Some("length")), FinishReason::Length);
        assert_eq!(
            FinishReason::from_stop_reason(Some("content_filter")),
            FinishReason::ContentFilter
        );
        assert_eq!(FinishReason::from_stop_reason(None), FinishReason::Complete);
    }
}
