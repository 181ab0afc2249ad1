//! Mock provider implementation for testing.

use super::{ChatProvider, FinishReason, ProviderError, ProviderResponse};
use crate::models::ChatTurn;
use async_trait::async_trait;
use std::sync::Mutex;
use std::time::Duration;

enum Behavior {
    Reply(String),
    Echo,
    Fail,
}

/// Scripted provider that records every conversation it is asked to continue.
pub struct MockChatProvider {
    behavior: Behavior,
    delay: Duration,
    calls: Mutex<Vec<Vec<ChatTurn>>>,
}

impl MockChatProvider {
    fn with_behavior(behavior: Behavior) -> Self {
        Self {
            behavior,
            delay: Duration::ZERO,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Always answers with `text`.
    pub fn replying(text: impl Into<String>) -> Self {
        Self::with_behavior(Behavior::Reply(text.into()))
    }

    /// Answers with `Echo: <last user message>`.
    pub fn echoing() -> Self {
        Self::with_behavior(Behavior::Echo)
    }

    /// Fails every call with a network error.
    pub fn failing() -> Self {
        Self::with_behavior(Behavior::Fail)
    }

    /// Sleep before answering, to hold requests in flight.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Number of `generate` calls so far.
    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|c| c.len()).unwrap_or(0)
    }

    /// Turns passed to each `generate` call, oldest call first.
    pub fn calls(&self) -> Vec<Vec<ChatTurn>> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl ChatProvider for MockChatProvider {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn model(&self) -> &str {
        "mock-model"
    }

    async fn generate(
        &self,
        _system_instruction: &str,
        turns: &[ChatTurn],
    ) -> Result<ProviderResponse, ProviderError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(turns.to_vec());
        }

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let text = match &self.behavior {
            Behavior::Reply(text) => text.clone(),
            Behavior::Echo => {
                let last = turns.last().map(ChatTurn::text).unwrap_or_default();
                format!("Echo: {}", last)
            }
            Behavior::Fail => {
                return Err(ProviderError::NetworkError(
                    "mock provider unavailable".to_string(),
                ))
            }
        };

        Ok(ProviderResponse {
            text,
            input_tokens: turns.len() as i32,
            output_tokens: 1,
            finish_reason: FinishReason::Complete,
        })
    }
}
