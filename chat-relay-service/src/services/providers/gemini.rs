//! Gemini AI provider implementation.
//!
//! Sends the whole conversation to `generateContent` with the persona as the
//! system instruction, and reads back the first candidate's first text part.

use super::{ChatProvider, FinishReason, ProviderError, ProviderResponse};
use crate::models::{ChatTurn, Role};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

/// Gemini provider configuration.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
    /// Versioned API root, e.g. `https://generativelanguage.googleapis.com/v1beta`.
    pub api_base: String,
}

/// Gemini chat provider.
pub struct GeminiChatProvider {
    config: GeminiConfig,
    client: Client,
}

impl GeminiChatProvider {
    pub fn new(config: GeminiConfig) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .map_err(|e| {
                ProviderError::NotConfigured(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self { config, client })
    }

    /// Build the API URL for the configured model and the given method.
    fn api_url(&self, method: &str) -> String {
        format!(
            "{}/models/{}:{}",
            self.config.api_base.trim_end_matches('/'),
            self.config.model,
            method
        )
    }

    fn build_request(system_instruction: &str, turns: &[ChatTurn]) -> GenerateContentRequest {
        GenerateContentRequest {
            contents: turns
                .iter()
                .map(|turn| Content {
                    role: Some(turn.role),
                    parts: turn
                        .parts
                        .iter()
                        .map(|p| ContentPart::Text {
                            text: p.text.clone(),
                        })
                        .collect(),
                })
                .collect(),
            system_instruction: (!system_instruction.trim().is_empty()).then(|| Content {
                role: None,
                parts: vec![ContentPart::Text {
                    text: system_instruction.to_string(),
                }],
            }),
            safety_settings: Vec::new(),
        }
    }
}

#[async_trait]
impl ChatProvider for GeminiChatProvider {
    fn name(&self) -> &'static str {
        "gemini"
    }

    fn model(&self) -> &str {
        &self.config.model
    }

    async fn generate(
        &self,
        system_instruction: &str,
        turns: &[ChatTurn],
    ) -> Result<ProviderResponse, ProviderError> {
        if self.config.api_key.is_empty() {
            return Err(ProviderError::NotConfigured(
                "Gemini API key not configured".to_string(),
            ));
        }

        let request = Self::build_request(system_instruction, turns);

        tracing::debug!(
            model = %self.config.model,
            turn_count = turns.len(),
            "Sending request to Gemini API"
        );

        let response = self
            .client
            .post(self.api_url("generateContent"))
            .header("x-goog-api-key", &self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| ProviderError::NetworkError(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();

            if status.as_u16() == 429 {
                return Err(ProviderError::RateLimited);
            }

            return Err(ProviderError::ApiError(format!(
                "Gemini API error {}: {}",
                status, error_text
            )));
        }

        let api_response: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::ApiError(format!("Failed to parse response: {}", e)))?;

        extract_reply(api_response)
    }
}

/// Pull the first candidate's first text part out of a response envelope.
fn extract_reply(response: GenerateContentResponse) -> Result<ProviderResponse, ProviderError> {
    let usage = response.usage_metadata.unwrap_or_default();

    let Some(candidate) = response.candidates.into_iter().next() else {
        if response
            .prompt_feedback
            .and_then(|f| f.block_reason)
            .is_some()
        {
            return Err(ProviderError::ContentFiltered);
        }
        return Err(ProviderError::NoCandidate);
    };

    let finish_reason = match candidate.finish_reason.as_deref() {
        Some("STOP") | None => FinishReason::Complete,
        Some("MAX_TOKENS") => FinishReason::Length,
        Some("SAFETY") | Some("PROHIBITED_CONTENT") | Some("BLOCKLIST") => {
            FinishReason::ContentFilter
        }
        Some(_) => FinishReason::Other,
    };

    let text = candidate
        .content
        .and_then(|c| c.parts.into_iter().next())
        .and_then(|p| match p {
            ContentPart::Text { text } => Some(text),
            ContentPart::Other(_) => None,
        });

    match text {
        Some(text) => Ok(ProviderResponse {
            text,
            input_tokens: usage.prompt_token_count.unwrap_or(0),
            output_tokens: usage.candidates_token_count.unwrap_or(0),
            finish_reason,
        }),
        None if finish_reason == FinishReason::ContentFilter => {
            Err(ProviderError::ContentFiltered)
        }
        None => Err(ProviderError::NoCandidate),
    }
}

// ============================================================================
// Gemini API Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    /// Always sent, and always empty: the provider's default filtering applies.
    safety_settings: Vec<serde_json::Value>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<Role>,
    #[serde(default)]
    parts: Vec<ContentPart>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum ContentPart {
    Text { text: String },
    Other(serde_json::Value),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
    #[serde(default)]
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    prompt_token_count: Option<i32>,
    candidates_token_count: Option<i32>,
}
