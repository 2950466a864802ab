//! AWS Bedrock provider using the Anthropic Messages request format.

use super::{FinishReason, GenerationParams, ProviderError, ProviderResponse, TextProvider};
use async_trait::async_trait;
use aws_sdk_bedrockruntime::primitives::Blob;
use aws_sdk_bedrockruntime::Client as BedrockClient;
use serde::{Deserialize, Serialize};

const ANTHROPIC_VERSION: &str = "bedrock-2023-05-31";

pub struct BedrockTextProvider {
    client: BedrockClient,
}

impl BedrockTextProvider {
    pub fn new(client: BedrockClient) -> Self {
        Self { client }
    }
}

/// Serialize the single-turn request body for `InvokeModel`.
fn request_body(prompt: &str, params: &GenerationParams) -> Result<Vec<u8>, ProviderError> {
    let request = MessagesRequest {
        anthropic_version: ANTHROPIC_VERSION,
        max_tokens: params.max_tokens,
        temperature: params.temperature,
        messages: vec![Message {
            role: "user",
            content: prompt,
        }],
    };

    serde_json::to_vec(&request).map_err(|e| ProviderError::InvalidRequest(e.to_string()))
}

/// Concatenate the text blocks of a Messages response.
fn parse_response(body: &[u8]) -> Result<ProviderResponse, ProviderError> {
    let response: MessagesResponse = serde_json::from_slice(body)
        .map_err(|e| ProviderError::ApiError(format!("Failed to parse response: {}", e)))?;

    let blocks: Vec<&str> = response
        .content
        .iter()
        .filter(|block| block.kind == "text")
        .filter_map(|block| block.text.as_deref())
        .collect();

    // A blank text block is a valid (if useless) completion; no text block is not.
    if blocks.is_empty() {
        return Err(ProviderError::EmptyCompletion);
    }
    let text = blocks.concat();

    let usage = response.usage.unwrap_or_default();

    Ok(ProviderResponse {
        text,
        input_tokens: usage.input_tokens,
        output_tokens: usage.output_tokens,
        finish_reason: FinishReason::from_stop_reason(response.stop_reason.as_deref()),
    })
}

#[async_trait]
impl TextProvider for BedrockTextProvider {
    fn name(&self) -> &'static str {
        "bedrock"
    }

    async fn generate(
        &self,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<ProviderResponse, ProviderError> {
        let body = request_body(prompt, params)?;

        tracing::debug!(
            model = %params.model,
            prompt_len = prompt.len(),
            "Invoking Bedrock model"
        );

        let output = self
            .client
            .invoke_model()
            .model_id(&params.model)
            .content_type("application/json")
            .accept("application/json")
            .body(Blob::new(body))
            .send()
            .await
            .map_err(|e| {
                if e
                    .as_service_error()
                    .is_some_and(|se| se.is_throttling_exception())
                {
                    return ProviderError::RateLimited;
                }
                ProviderError::ApiError(format!(
                    "Bedrock InvokeModel failed: {}",
                    aws_sdk_bedrockruntime::error::DisplayErrorContext(&e)
                ))
            })?;

        parse_response(output.body().as_ref())
    }
}

// ============================================================================
// Anthropic Messages Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    anthropic_version: &'static str,
    max_tokens: i32,
    temperature: f32,
    messages: Vec<Message<'a>>,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
    #[serde(default)]
    stop_reason: Option<String>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct Usage {
    #[serde(default)]
    input_tokens: i32,
    #[serde(default)]
    output_tokens: i32,
}
