//! Application startup and lifecycle management.
//!
//! Loads the transcript, seeds the conversation session, and serves the
//! chat endpoint plus health and metrics over one HTTP listener.

use crate::config::RelayConfig;
use crate::handlers::{chat::chat, health::health_check, metrics::metrics};
use crate::services::metrics::{http_metrics_middleware, init_metrics};
use crate::services::providers::gemini::{GeminiChatProvider, GeminiConfig};
use crate::services::providers::ChatProvider;
use crate::services::{load_history, ChatSession};
use axum::{
    http::{header, HeaderValue, Method},
    middleware::from_fn,
    routing::{get, post},
    Router,
};
use service_core::error::AppError;
use service_core::middleware::{
    security_headers::security_headers_middleware,
    tracing::{request_id_middleware, REQUEST_ID_HEADER},
};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: RelayConfig,
    pub session: Arc<ChatSession>,
}

/// Build the HTTP router: routes, tracing, security headers and the
/// single-origin CORS policy.
pub fn build_router(state: AppState) -> Result<Router, AppError> {
    let allowed_origin = state
        .config
        .cors
        .allowed_origin
        .parse::<HeaderValue>()
        .map_err(|e| {
            AppError::ConfigError(anyhow::anyhow!(
                "Invalid CORS origin '{}': {}",
                state.config.cors.allowed_origin,
                e
            ))
        })?;

    let cors = CorsLayer::new()
        .allow_origin(allowed_origin)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    let router = Router::new()
        .route("/chat", post(chat))
        .route("/health", get(health_check))
        .route("/metrics", get(metrics))
        .route_layer(from_fn(http_metrics_middleware))
        // Add tracing layer
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get(REQUEST_ID_HEADER)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                )
            }),
        )
        // Add tracing middleware for request_id
        .layer(from_fn(request_id_middleware))
        .layer(from_fn(security_headers_middleware))
        .layer(cors)
        .with_state(state);

    Ok(router)
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    router: Router,
    session: Arc<ChatSession>,
}

impl Application {
    /// Build the application against the Gemini API.
    pub async fn build(config: RelayConfig) -> Result<Self, AppError> {
        let gemini_config = GeminiConfig {
            api_key: config.google.api_key.clone(),
            model: config.models.text_model.clone(),
            api_base: config.google.api_base.clone(),
        };
        let provider = GeminiChatProvider::new(gemini_config)
            .map_err(|e| AppError::ConfigError(anyhow::anyhow!(e)))?;

        if config.google.api_key.is_empty() {
            tracing::warn!("No Google API key configured; every chat request will fail");
        }
        tracing::info!(
            model = %config.models.text_model,
            "Initialized Gemini chat provider"
        );

        Self::build_with_provider(config, Arc::new(provider)).await
    }

    /// Build the application with an explicit provider.
    pub async fn build_with_provider(
        config: RelayConfig,
        provider: Arc<dyn ChatProvider>,
    ) -> Result<Self, AppError> {
        init_metrics();

        let history = load_history(&config.history.path).await;
        let seeded = history.entries().len();
        let session = Arc::new(ChatSession::new(
            provider,
            config.persona.instruction.clone(),
            history.into_turns(),
        ));
        tracing::info!(turns = seeded, "Starting chat with initial history");

        let state = AppState {
            config: config.clone(),
            session: session.clone(),
        };
        let router = build_router(state)?;

        // Port 0 = random port for testing
        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind HTTP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("Chat relay listening on port {}", port);

        Ok(Self {
            port,
            listener,
            router,
            session,
        })
    }

    /// Get the port the server is listening on.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// The conversation this application serves.
    pub fn session(&self) -> Arc<ChatSession> {
        self.session.clone()
    }

    /// Run the application until stopped.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        self.run_with_shutdown(std::future::pending()).await
    }

    /// Run until `signal` resolves, then drain in-flight requests.
    pub async fn run_with_shutdown<F>(self, signal: F) -> std::io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(signal)
            .await
            .map_err(|e| {
                tracing::error!("HTTP server error: {}", e);
                e
            })
    }
}
