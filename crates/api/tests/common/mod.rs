//! Common test utilities for integration tests.
//!
//! The app is built over the in-memory registration store, so these tests
//! need no database.

// Allow dead code in this module - not every test file uses every helper.
#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use fusion_api::{
    app::create_app,
    config::{
        AdminConfig, Config, DatabaseConfig, LoggingConfig, ScannerConfig, SecurityConfig,
        ServerConfig, StoreConfig, TicketsConfig,
    },
    services::{ConsoleTicketMailer, TicketMailer},
};
use persistence::store::{InMemoryRegistrationStore, RegistrationStore};
use serde_json::json;
use shared::crypto::sha256_hex;
use std::sync::Arc;
use tower::ServiceExt;

/// Admin key accepted by [`test_config`].
pub const TEST_ADMIN_KEY: &str = "fx_testadminkey1";

/// Registration page that failed ticket lookups redirect to.
pub const REGISTER_PAGE: &str = "/registerpage";

/// Test configuration over the in-memory store with rate limiting disabled.
pub fn test_config() -> Config {
    Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 8080,
            request_timeout_secs: 30,
            public_base_url: "http://localhost:8080".to_string(),
        },
        database: DatabaseConfig {
            url: String::new(),
            max_connections: 5,
            min_connections: 1,
            connect_timeout_secs: 10,
            idle_timeout_secs: 600,
        },
        store: StoreConfig {
            backend: "memory".to_string(),
            listener_retry_secs: 1,
        },
        logging: LoggingConfig {
            level: "debug".to_string(),
            format: "pretty".to_string(),
        },
        security: SecurityConfig {
            cors_origins: vec![],
            rate_limit_per_minute: 0, // Disable rate limiting for tests
            hsts_enabled: false,
        },
        admin: AdminConfig {
            api_key_hashes: vec![sha256_hex(TEST_ADMIN_KEY)],
        },
        tickets: TicketsConfig {
            auto_send_on_register: false,
            mailer: "console".to_string(),
            send_endpoint: String::new(),
            request_timeout_secs: 5,
            register_page_url: REGISTER_PAGE.to_string(),
            qr_size: 200,
        },
        scanner: ScannerConfig::default(),
    }
}

/// Build the router over a store and mailer.
pub fn create_test_app(
    config: Config,
    store: Arc<dyn RegistrationStore>,
    mailer: Arc<dyn TicketMailer>,
) -> Router {
    create_app(config, store, mailer)
}

/// Default app: fresh in-memory store and the console mailer.
pub fn test_app() -> (Router, Arc<InMemoryRegistrationStore>) {
    let store = Arc::new(InMemoryRegistrationStore::new());
    let app = create_test_app(test_config(), store.clone(), Arc::new(ConsoleTicketMailer));
    (app, store)
}

/// Generate a unique test email.
pub fn unique_test_email() -> String {
    format!("test_{}@example.com", uuid::Uuid::new_v4().simple())
}

/// Valid registration form for `email`.
pub fn registration_form(email: &str) -> serde_json::Value {
    json!({
        "email": email,
        "name": "Alice Example",
        "whatsapp": "+201234567890",
        "faculty": "Engineering",
        "year": "3"
    })
}

/// Build a JSON request without authentication.
pub fn json_request(method: Method, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

/// Build a GET request without authentication.
pub fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

/// Build a JSON request with admin API key authentication.
pub fn json_request_with_api_key(
    method: Method,
    uri: &str,
    body: serde_json::Value,
    api_key: &str,
) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .header("X-API-Key", api_key)
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

/// Build a GET request with admin API key authentication.
pub fn get_request_with_api_key(uri: &str, api_key: &str) -> Request<Body> {
    Request::builder()
        .method(Method::GET)
        .uri(uri)
        .header("X-API-Key", api_key)
        .body(Body::empty())
        .unwrap()
}

/// Build a POST request with a raw body and admin API key authentication.
pub fn bytes_request_with_api_key(uri: &str, body: Vec<u8>, api_key: &str) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/octet-stream")
        .header("X-API-Key", api_key)
        .body(Body::from(body))
        .unwrap()
}

/// Helper to parse JSON response body.
pub async fn parse_response_body(response: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null)
}

/// Helper to read a raw response body.
pub async fn response_bytes(response: axum::response::Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

/// Register `email` through the API and return the response body.
pub async fn register(app: &Router, email: &str) -> serde_json::Value {
    let response = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/v1/registrations",
            registration_form(email),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    parse_response_body(response).await
}

/// Check in `payload` as an admin and return the response body.
pub async fn check_in(app: &Router, payload: &str) -> serde_json::Value {
    let response = app
        .clone()
        .oneshot(json_request_with_api_key(
            Method::POST,
            "/api/v1/admin/check-in",
            json!({ "payload": payload }),
            TEST_ADMIN_KEY,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    parse_response_body(response).await
}
