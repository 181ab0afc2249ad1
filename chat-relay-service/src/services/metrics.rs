//! Prometheus metrics for chat-relay-service.
//!
//! Provides HTTP and AI-provider metrics for observability.

use axum::{
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
};
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder,
};
use std::sync::OnceLock;
use std::time::Instant;

/// Registry plus every collector registered in it.
struct Metrics {
    registry: Registry,
    http_requests_total: IntCounterVec,
    http_request_duration_seconds: HistogramVec,
    genai_requests_total: IntCounterVec,
    genai_tokens_total: IntCounterVec,
    genai_provider_latency_seconds: HistogramVec,
    genai_provider_errors_total: IntCounterVec,
}

static METRICS: OnceLock<Metrics> = OnceLock::new();

/// Initialize all metrics. Later calls are no-ops.
pub fn init_metrics() {
    METRICS.get_or_init(|| {
        let metrics = build_metrics();
        tracing::info!("Prometheus metrics initialized");
        metrics
    });
}

fn build_metrics() -> Metrics {
    let registry = Registry::new();

    let http_requests_total = IntCounterVec::new(
        Opts::new("http_requests_total", "Total number of HTTP requests"),
        &["method", "path", "status"],
    )
    .expect("Failed to create http_requests_total metric");

    let http_request_duration_seconds = HistogramVec::new(
        HistogramOpts::new(
            "http_request_duration_seconds",
            "HTTP request duration in seconds",
        )
        .buckets(vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
        &["method", "path"],
    )
    .expect("Failed to create http_request_duration_seconds metric");

    let genai_requests_total = IntCounterVec::new(
        Opts::new("genai_requests_total", "Chat turns sent to the model"),
        &["model", "outcome"],
    )
    .expect("Failed to create genai_requests_total metric");

    let genai_tokens_total = IntCounterVec::new(
        Opts::new("genai_tokens_total", "Tokens reported by the model"),
        &["model", "type"], // type: input, output
    )
    .expect("Failed to create genai_tokens_total metric");

    let genai_provider_latency_seconds = HistogramVec::new(
        HistogramOpts::new(
            "genai_provider_latency_seconds",
            "Model round trip latency in seconds",
        )
        .buckets(vec![0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0, 60.0, 120.0]),
        &["provider", "model"],
    )
    .expect("Failed to create genai_provider_latency_seconds metric");

    let genai_provider_errors_total = IntCounterVec::new(
        Opts::new("genai_provider_errors_total", "Failed model round trips"),
        &["provider", "error_type"],
    )
    .expect("Failed to create genai_provider_errors_total metric");

    let collectors: [Box<dyn prometheus::core::Collector>; 6] = [
        Box::new(http_requests_total.clone()),
        Box::new(http_request_duration_seconds.clone()),
        Box::new(genai_requests_total.clone()),
        Box::new(genai_tokens_total.clone()),
        Box::new(genai_provider_latency_seconds.clone()),
        Box::new(genai_provider_errors_total.clone()),
    ];
    for collector in collectors {
        registry
            .register(collector)
            .expect("Failed to register metric");
    }

    Metrics {
        registry,
        http_requests_total,
        http_request_duration_seconds,
        genai_requests_total,
        genai_tokens_total,
        genai_provider_latency_seconds,
        genai_provider_errors_total,
    }
}

/// Get metrics in Prometheus text format.
pub fn get_metrics() -> String {
    let mut buffer = Vec::new();
    let encoder = TextEncoder::new();

    let registry = match METRICS.get() {
        Some(m) => &m.registry,
        None => {
            tracing::error!("Metrics registry not initialized");
            return "# Metrics registry not initialized\n".to_string();
        }
    };

    let metric_families = registry.gather();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "Failed to encode metrics");
        return format!("# Failed to encode metrics: {}\n", e);
    }

    match String::from_utf8(buffer) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "Failed to convert metrics to UTF-8");
            format!("# Failed to convert metrics to UTF-8: {}\n", e)
        }
    }
}

/// Route-level middleware recording request counts and latency by matched route.
pub async fn http_metrics_middleware(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().to_string();
    let path = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());

    let response = next.run(req).await;

    record_http_request(
        &method,
        &path,
        response.status().as_str(),
        start.elapsed().as_secs_f64(),
    );

    response
}

// Helper functions for recording metrics

/// Record a completed HTTP request.
pub fn record_http_request(method: &str, path: &str, status: &str, duration_secs: f64) {
    if let Some(m) = METRICS.get() {
        m.http_requests_total
            .with_label_values(&[method, path, status])
            .inc();
        m.http_request_duration_seconds
            .with_label_values(&[method, path])
            .observe(duration_secs);
    }
}

/// Record a finished provider call; `outcome` is a finish reason or `error`.
pub fn record_genai_request(model: &str, outcome: &str) {
    if let Some(m) = METRICS.get() {
        m.genai_requests_total
            .with_label_values(&[model, outcome])
            .inc();
    }
}

/// Record token usage.
pub fn record_tokens(model: &str, input_tokens: i32, output_tokens: i32) {
    if let Some(m) = METRICS.get() {
        let counter = &m.genai_tokens_total;
        counter
            .with_label_values(&[model, "input"])
            .inc_by(input_tokens.max(0) as u64);
        counter
            .with_label_values(&[model, "output"])
            .inc_by(output_tokens.max(0) as u64);
    }
}

/// Record provider latency.
pub fn record_provider_latency(provider: &str, model: &str, duration_secs: f64) {
    if let Some(m) = METRICS.get() {
        m.genai_provider_latency_seconds
            .with_label_values(&[provider, model])
            .observe(duration_secs);
    }
}

/// Record a provider error.
pub fn record_provider_error(provider: &str, error_type: &str) {
    if let Some(m) = METRICS.get() {
        m.genai_provider_errors_total
            .with_label_values(&[provider, error_type])
            .inc();
    }
}
