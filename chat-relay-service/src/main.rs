use chat_relay_service::config::RelayConfig;
use chat_relay_service::startup::Application;
use service_core::error::AppError;
use service_core::observability::init_tracing;
use tokio::signal;

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received SIGINT, starting graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        },
    }
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // Load configuration - fail fast if invalid
    let config = RelayConfig::load()?;

    init_tracing(
        "chat-relay-service",
        &config.observability.log_level,
        config.observability.otlp_endpoint.as_deref(),
    );

    tracing::info!(
        service = "chat-relay-service",
        version = env!("CARGO_PKG_VERSION"),
        port = config.common.port,
        history_path = %config.history.path.display(),
        "Starting chat relay"
    );

    let app = Application::build(config).await?;
    app.run_with_shutdown(shutdown_signal()).await?;

    tracing::info!("Service shutdown complete");
    Ok(())
}
