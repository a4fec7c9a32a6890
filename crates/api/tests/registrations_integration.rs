//! Integration tests for participant registration endpoints.
//!
//! Run with: cargo test --test registrations_integration

mod common;

use axum::http::{Method, StatusCode};
use common::{
    create_test_app, get_request, json_request, parse_response_body, register,
    registration_form, test_app, test_config, unique_test_email,
};
use fusion_api::services::HttpTicketMailer;
use persistence::store::{InMemoryRegistrationStore, RegistrationStore};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_register_success() {
    let (app, store) = test_app();
    let email = unique_test_email();

    let body = register(&app, &email).await;

    let registration = &body["registration"];
    assert_eq!(registration["email"], email);
    assert_eq!(registration["name"], "Alice Example");
    assert_eq!(registration["faculty"], "Engineering");
    assert_eq!(registration["year"], "3");
    assert_eq!(registration["is_arrived"], false);
    assert_eq!(registration["isEmailSent"], false);
    assert!(registration["id"].is_string());
    assert!(registration["createdAt"].is_string());
    assert!(registration.get("emailSentAt").is_none());

    let links = &body["links"];
    assert!(links["ticket"]
        .as_str()
        .unwrap()
        .starts_with("http://localhost:8080/api/v1/tickets?email="));
    assert!(links["qr_code"].as_str().unwrap().contains("/qr.png?email="));
    assert!(links["download"].as_str().unwrap().contains("/download?email="));

    assert_eq!(store.len().await, 1);
}

#[tokio::test]
async fn test_register_missing_fields() {
    let (app, store) = test_app();

    let response = app
        .clone()
        .oneshot(json_request(Method::POST, "/api/v1/registrations", json!({})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = parse_response_body(response).await;
    assert_eq!(body["error"], "validation_error");

    let fields: Vec<&str> = body["details"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["email", "faculty", "name", "whatsapp", "year"]);
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn test_register_invalid_formats() {
    let (app, store) = test_app();

    let mut form = registration_form("not-an-email");
    form["year"] = json!("7");
    form["whatsapp"] = json!("abc");

    let response = app
        .clone()
        .oneshot(json_request(Method::POST, "/api/v1/registrations", form))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = parse_response_body(response).await;
    let details = body["details"].as_array().unwrap();
    assert_eq!(details.len(), 3);
    assert!(details
        .iter()
        .any(|d| d["field"] == "email" && d["message"] == "Enter a valid email."));
    assert!(details
        .iter()
        .any(|d| d["field"] == "year" && d["message"] == "Select a year between 1 and 4."));
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn test_register_duplicate_email() {
    let (app, store) = test_app();
    let email = unique_test_email();
    register(&app, &email).await;

    let response = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/v1/registrations",
            registration_form(&email),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = parse_response_body(response).await;
    assert_eq!(body["message"], "This email is already registered.");
    assert_eq!(body["details"][0]["field"], "email");
    assert_eq!(store.len().await, 1);
}

#[tokio::test]
async fn test_register_email_match_is_exact() {
    let (app, store) = test_app();
    register(&app, "alice@example.com").await;
    register(&app, "Alice@example.com").await;

    assert_eq!(store.len().await, 2);
}

#[tokio::test]
async fn test_check_email() {
    let (app, _store) = test_app();
    let email = unique_test_email();

    let uri = format!("/api/v1/registrations/check?email={}", email);
    let response = app.clone().oneshot(get_request(&uri)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = parse_response_body(response).await;
    assert_eq!(body["registered"], false);

    register(&app, &email).await;

    let response = app.clone().oneshot(get_request(&uri)).await.unwrap();
    let body = parse_response_body(response).await;
    assert_eq!(body["email"], email);
    assert_eq!(body["registered"], true);
}

#[tokio::test]
async fn test_check_email_requires_email() {
    let (app, _store) = test_app();

    let response = app
        .oneshot(get_request("/api/v1/registrations/check"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_register_sends_ticket_in_background() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/send-ticket"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = test_config();
    config.tickets.auto_send_on_register = true;
    let store = Arc::new(InMemoryRegistrationStore::new());
    let mailer = HttpTicketMailer::new(
        format!("{}/send-ticket", server.uri()),
        Duration::from_secs(5),
    )
    .unwrap();
    let app = create_test_app(config, store.clone(), Arc::new(mailer));

    let body = register(&app, "alice@example.com").await;
    // The response does not wait for the email
    assert_eq!(body["registration"]["isEmailSent"], false);

    let sent = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let record = store
                .find_by_email("alice@example.com")
                .await
                .unwrap()
                .unwrap();
            if record.is_email_sent {
                return record;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await
    .expect("ticket email was not sent");
    assert!(sent.email_sent_at.is_some());

    let response = app
        .oneshot(json_request(
            Method::POST,
            "/api/v1/tickets/send",
            json!({ "email": "alice@example.com" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(parse_response_body(response).await["status"], "already_sent");

    // Exactly one outbound call, from the background dispatch
    server.verify().await;
}
