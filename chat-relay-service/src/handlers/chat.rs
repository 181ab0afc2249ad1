use axum::{
    async_trait,
    body::Bytes,
    extract::{FromRequest, Request, State},
    http::{header, HeaderMap, StatusCode},
    Extension, Json,
};
use service_core::middleware::tracing::RequestId;

use crate::error::ChatError;
use crate::models::ChatResponse;
use crate::startup::AppState;

/// The `message` field of a JSON chat request, guaranteed non-blank.
///
/// Anything else (no JSON content type, unparsable body, missing, `null`,
/// non-string or whitespace-only `message`) is rejected as an empty message.
#[derive(Debug)]
pub struct ChatMessage(pub String);

#[async_trait]
impl<S> FromRequest<S> for ChatMessage
where
    S: Send + Sync,
{
    type Rejection = ChatError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        if !has_json_content_type(req.headers()) {
            tracing::warn!("Received a chat request without a JSON body");
            return Err(ChatError::EmptyMessage);
        }

        let body = Bytes::from_request(req, state).await.map_err(|e| {
            tracing::warn!(error = %e, "Failed to read chat request body");
            if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
                ChatError::PayloadTooLarge
            } else {
                ChatError::EmptyMessage
            }
        })?;

        parse_message(&body).map(ChatMessage).ok_or_else(|| {
            tracing::warn!("Received an empty message from client");
            ChatError::EmptyMessage
        })
    }
}

fn has_json_content_type(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(|mime| {
            let mime = mime.trim().to_ascii_lowercase();
            mime == "application/json" || mime.ends_with("+json")
        })
        .unwrap_or(false)
}

fn parse_message(body: &[u8]) -> Option<String> {
    let value: serde_json::Value = serde_json::from_slice(body).ok()?;
    let message = value.get("message")?.as_str()?;
    (!is_blank(message)).then(|| message.to_string())
}

/// Whitespace-only, counting a byte order mark as whitespace.
fn is_blank(message: &str) -> bool {
    message
        .trim_matches(|c: char| c.is_whitespace() || c == '\u{feff}')
        .is_empty()
}

/// `POST /chat`: continue the conversation with one user message.
pub async fn chat(
    State(state): State<AppState>,
    request_id: Option<Extension<RequestId>>,
    ChatMessage(message): ChatMessage,
) -> Result<Json<ChatResponse>, ChatError> {
    let request_id = request_id.map(|Extension(id)| id.0).unwrap_or_default();

    tracing::info!(
        request_id = %request_id,
        message_len = message.len(),
        "Sending message to AI model"
    );

    let reply = state.session.send_message(&message).await.map_err(|e| {
        tracing::error!(
            request_id = %request_id,
            error = %e,
            error_type = e.error_type(),
            "Error generating response from AI model"
        );
        ChatError::Provider(e)
    })?;

    tracing::info!(
        request_id = %request_id,
        reply_len = reply.len(),
        "Model response received"
    );

    Ok(Json(ChatResponse::new(message, reply)))
}
