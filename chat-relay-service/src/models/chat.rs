//! Request and response bodies of the chat endpoint.

use serde::Serialize;

use super::TranscriptEntry;

/// Body of a successful `POST /chat`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    pub user_message: TranscriptEntry,
    pub model_message: TranscriptEntry,
}

impl ChatResponse {
    pub fn new(user_message: impl Into<String>, model_message: impl Into<String>) -> Self {
        Self {
            user_message: TranscriptEntry::user(user_message),
            model_message: TranscriptEntry::model(model_message),
        }
    }
}

/// Body of every error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}
