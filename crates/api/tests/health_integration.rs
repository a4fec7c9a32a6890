//! Integration tests for health and operational endpoints.
//!
//! Run with: cargo test --test health_integration

mod common;

use axum::http::{header, Method, StatusCode};
use common::{get_request, json_request, parse_response_body, registration_form, test_app};
use fusion_api::middleware::init_metrics;
use tower::ServiceExt;

#[tokio::test]
async fn test_health_check() {
    let (app, _store) = test_app();

    let response = app.oneshot(get_request("/api/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = parse_response_body(response).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["store"]["backend"], "memory");
    assert_eq!(body["store"]["connected"], true);
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn test_live_and_ready() {
    let (app, _store) = test_app();

    let response = app
        .clone()
        .oneshot(get_request("/api/health/live"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(parse_response_body(response).await["status"], "alive");

    let response = app.oneshot(get_request("/api/health/ready")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(parse_response_body(response).await["status"], "ready");
}

#[tokio::test]
async fn test_responses_carry_request_id_and_security_headers() {
    let (app, _store) = test_app();

    let response = app.oneshot(get_request("/api/health/live")).await.unwrap();
    assert!(response.headers().contains_key("x-request-id"));
    assert_eq!(response.headers()["x-content-type-options"], "nosniff");
    assert!(!response
        .headers()
        .contains_key(header::STRICT_TRANSPORT_SECURITY));
}

#[tokio::test]
async fn test_metrics_endpoint() {
    init_metrics().unwrap();
    let (app, _store) = test_app();

    app.clone()
        .oneshot(json_request(
            Method::POST,
            "/api/v1/registrations",
            registration_form("alice@example.com"),
        ))
        .await
        .unwrap();

    let response = app.oneshot(get_request("/metrics")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
