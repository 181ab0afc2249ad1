//! Cross-origin policy: one origin, GET/POST, Content-Type only.

mod common;

use axum::{body::Body, http::Request, http::StatusCode};
use chat_relay_service::services::providers::mock::MockChatProvider;
use common::{test_router, ALLOWED_ORIGIN};
use std::sync::Arc;
use tower::ServiceExt;

fn preflight(origin: &str, method: &str, headers: &str) -> Request<Body> {
    Request::builder()
        .method("OPTIONS")
        .uri("/chat")
        .header("origin", origin)
        .header("access-control-request-method", method)
        .header("access-control-request-headers", headers)
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn preflight_from_allowed_origin_is_granted() {
    let (app, _) = test_router(Arc::new(MockChatProvider::replying("Hi")));

    let response = app
        .oneshot(preflight(ALLOWED_ORIGIN, "POST", "content-type"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers();
    assert_eq!(headers["access-control-allow-origin"], ALLOWED_ORIGIN);

    let methods = headers["access-control-allow-methods"].to_str().unwrap();
    assert!(methods.contains("GET"));
    assert!(methods.contains("POST"));
    assert!(!methods.contains("DELETE"));

    let allowed_headers = headers["access-control-allow-headers"]
        .to_str()
        .unwrap()
        .to_ascii_lowercase();
    assert_eq!(allowed_headers, "content-type");
}

#[tokio::test]
async fn preflight_from_other_origin_is_not_granted() {
    let provider = Arc::new(MockChatProvider::replying("Hi"));
    let (app, _) = test_router(provider.clone());

    let response = app
        .oneshot(preflight("https://evil.example.com", "POST", "content-type"))
        .await
        .unwrap();

    assert!(!response
        .headers()
        .contains_key("access-control-allow-origin"));
    assert_eq!(provider.call_count(), 0);
}

#[tokio::test]
async fn post_from_allowed_origin_gets_allow_origin_header() {
    let (app, _) = test_router(Arc::new(MockChatProvider::replying("Hi there!")));

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/chat")
                .header("origin", ALLOWED_ORIGIN)
                .header("content-type", "application/json")
                .body(Body::from(r#"{"message":"Hello"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()["access-control-allow-origin"],
        ALLOWED_ORIGIN
    );
}

#[tokio::test]
async fn post_from_other_origin_gets_no_allow_origin_header() {
    let (app, _) = test_router(Arc::new(MockChatProvider::replying("Hi there!")));

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/chat")
                .header("origin", "https://evil.example.com")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"message":"Hello"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert!(!response
        .headers()
        .contains_key("access-control-allow-origin"));
}
