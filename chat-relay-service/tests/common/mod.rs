//! Test helpers for chat-relay-service integration tests.
//!
//! Every app is built against a mock provider and a transcript in its own
//! temporary directory, so tests never touch the network or shared files.

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{Request, Response},
    Router,
};
use chat_relay_service::config::RelayConfig;
use chat_relay_service::services::providers::mock::MockChatProvider;
use chat_relay_service::services::ChatSession;
use chat_relay_service::startup::{build_router, AppState, Application};
use http_body_util::BodyExt;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

pub const ALLOWED_ORIGIN: &str = "https://dazzling-medovik-4e3200.netlify.app";

/// A running server bound to a random port.
pub struct TestApp {
    pub address: String,
    pub session: Arc<ChatSession>,
    pub provider: Arc<MockChatProvider>,
    _dir: TempDir,
}

impl TestApp {
    /// Spawn with an optional transcript file written before startup.
    pub async fn spawn(provider: MockChatProvider, transcript: Option<&str>) -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let history_path = dir.path().join("chat_history.json");
        if let Some(contents) = transcript {
            std::fs::write(&history_path, contents).expect("Failed to write transcript");
        }

        let provider = Arc::new(provider);
        let config = RelayConfig::with_defaults(0, history_path);
        let app = Application::build_with_provider(config, provider.clone())
            .await
            .expect("Failed to build application");

        let address = format!("http://127.0.0.1:{}", app.port());
        let session = app.session();

        tokio::spawn(async move {
            let _ = app.run_until_stopped().await;
        });

        // Wait for server to start
        tokio::time::sleep(Duration::from_millis(50)).await;

        Self {
            address,
            session,
            provider,
            _dir: dir,
        }
    }

    pub fn client(&self) -> reqwest::Client {
        reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .build()
            .expect("Failed to build client")
    }
}

/// A router with an empty conversation, for in-process `oneshot` calls.
pub fn test_router(provider: Arc<MockChatProvider>) -> (Router, Arc<ChatSession>) {
    let config = RelayConfig::with_defaults(0, "does-not-exist.json");
    let session = Arc::new(ChatSession::new(
        provider,
        config.persona.instruction.clone(),
        Vec::new(),
    ));
    let state = AppState {
        config,
        session: session.clone(),
    };
    let router = build_router(state).expect("Failed to build router");
    (router, session)
}

pub fn chat_request(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/chat")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub async fn json_body(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).expect("Response body is not JSON")
}
