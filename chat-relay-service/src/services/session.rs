//! The single long-lived conversation the relay continues.

use super::metrics;
use super::providers::{ChatProvider, ProviderError};
use crate::models::ChatTurn;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;

/// Conversation seeded from the transcript and continued by every request.
///
/// A send holds the lock across the provider round trip, so concurrent
/// requests are answered one at a time and their turns never interleave.
/// The user and model turns are committed together once the provider has
/// replied; a failed or cancelled send leaves the history as it was.
pub struct ChatSession {
    provider: Arc<dyn ChatProvider>,
    persona: String,
    turns: Mutex<Vec<ChatTurn>>,
    turn_count: AtomicUsize,
}

impl ChatSession {
    pub fn new(
        provider: Arc<dyn ChatProvider>,
        persona: impl Into<String>,
        history: Vec<ChatTurn>,
    ) -> Self {
        let turn_count = AtomicUsize::new(history.len());
        Self {
            provider,
            persona: persona.into(),
            turns: Mutex::new(history),
            turn_count,
        }
    }

    /// Number of turns, readable without waiting for an in-flight send.
    pub fn turn_count(&self) -> usize {
        self.turn_count.load(Ordering::Acquire)
    }

    /// Snapshot of all turns in order.
    pub async fn turns(&self) -> Vec<ChatTurn> {
        self.turns.lock().await.clone()
    }

    /// Append `message` as a user turn, ask the provider for the next model
    /// turn and return its text.
    pub async fn send_message(&self, message: &str) -> Result<String, ProviderError> {
        let mut turns = self.turns.lock().await;
        let mut pending = turns.clone();
        pending.push(ChatTurn::user(message));

        let provider = self.provider.name();
        let model = self.provider.model();
        let start = Instant::now();

        let result = self.provider.generate(&self.persona, &pending).await;

        metrics::record_provider_latency(provider, model, start.elapsed().as_secs_f64());

        match result {
            Ok(response) => {
                metrics::record_genai_request(model, response.finish_reason.as_str());
                metrics::record_tokens(model, response.input_tokens, response.output_tokens);

                pending.push(ChatTurn::model(response.text.clone()));
                *turns = pending;
                self.turn_count.store(turns.len(), Ordering::Release);

                tracing::debug!(
                    provider,
                    model,
                    turn_count = turns.len(),
                    input_tokens = response.input_tokens,
                    output_tokens = response.output_tokens,
                    "Conversation advanced"
                );
                Ok(response.text)
            }
            Err(e) => {
                metrics::record_genai_request(model, "error");
                metrics::record_provider_error(provider, e.error_type());
                Err(e)
            }
        }
    }
}
