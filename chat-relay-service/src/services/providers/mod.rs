//! AI provider abstractions and implementations.
//!
//! The conversation session talks to a `ChatProvider`; Gemini is the real
//! backend and the mock stands in for it in tests.

pub mod gemini;
pub mod mock;

use crate::models::ChatTurn;
use async_trait::async_trait;
use thiserror::Error;

/// Error type for provider operations.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Rate limited")]
    RateLimited,

    #[error("Content filtered")]
    ContentFiltered,

    #[error("Network error: {0}")]
    NetworkError(String),

    /// The provider answered but the envelope held no candidate text.
    #[error("No candidate in provider response")]
    NoCandidate,
}

impl ProviderError {
    /// Stable label for metrics.
    pub fn error_type(&self) -> &'static str {
        match self {
            ProviderError::NotConfigured(_) => "not_configured",
            ProviderError::ApiError(_) => "api_error",
            ProviderError::RateLimited => "rate_limited",
            ProviderError::ContentFiltered => "content_filtered",
            ProviderError::NetworkError(_) => "network_error",
            ProviderError::NoCandidate => "no_candidate",
        }
    }
}

/// Reply generated for one turn.
#[derive(Debug, Clone)]
pub struct ProviderResponse {
    /// First text part of the first candidate.
    pub text: String,

    /// Input tokens consumed.
    pub input_tokens: i32,

    /// Output tokens generated.
    pub output_tokens: i32,

    /// Finish reason.
    pub finish_reason: FinishReason,
}

/// Reason why generation stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishReason {
    Complete,
    Length,
    ContentFilter,
    Other,
}

impl FinishReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            FinishReason::Complete => "complete",
            FinishReason::Length => "length",
            FinishReason::ContentFilter => "content_filter",
            FinishReason::Other => "other",
        }
    }
}

/// Multi-turn text generation backend.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Short provider name used in logs and metrics.
    fn name(&self) -> &'static str;

    /// Model the provider generates with.
    fn model(&self) -> &str;

    /// Generate the next model turn for `turns`, which ends with the user's
    /// newest message.
    async fn generate(
        &self,
        system_instruction: &str,
        turns: &[ChatTurn],
    ) -> Result<ProviderResponse, ProviderError>;
}
