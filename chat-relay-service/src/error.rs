use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;
use crate::services::providers::ProviderError;

/// Failures surfaced by the chat endpoint.
///
/// Provider detail stays in the logs; callers only see the display text.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("Message cannot be empty.")]
    EmptyMessage,

    #[error("Request body is too large.")]
    PayloadTooLarge,

    #[error("Failed to get response from AI model")]
    Provider(#[source] ProviderError),
}

impl ChatError {
    pub fn status(&self) -> StatusCode {
        match self {
            ChatError::EmptyMessage => StatusCode::BAD_REQUEST,
            ChatError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ChatError::Provider(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ChatError {
    fn into_response(self) -> Response {
        (
            self.status(),
            Json(ErrorResponse {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn each_error_maps_to_its_status() {
        assert_eq!(ChatError::EmptyMessage.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ChatError::PayloadTooLarge.status(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(
            ChatError::Provider(ProviderError::NoCandidate).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn provider_detail_is_not_in_the_message() {
        let err = ChatError::Provider(ProviderError::ApiError("secret detail".into()));
        assert_eq!(err.to_string(), "Failed to get response from AI model");
    }
}
