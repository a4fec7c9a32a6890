//! Outbound ticket email delivery.
//!
//! Supported providers:
//! - `console`: logs the dispatch (development)
//! - `http`: posts `{name, email, faculty}` as JSON to `tickets.send_endpoint`

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::TicketsConfig;

/// Errors that can occur while sending a ticket email.
#[derive(Debug, Error)]
pub enum MailerError {
    #[error("Mailer not configured: {0}")]
    NotConfigured(String),

    #[error("Failed to reach mail service: {0}")]
    Transport(String),

    #[error("Mail service rejected the request: {0}")]
    Rejected(String),
}

/// Ticket email payload sent to the mail service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TicketEmail {
    pub name: String,
    pub email: String,
    pub faculty: String,
}

/// Sends ticket emails.
#[async_trait]
pub trait TicketMailer: Send + Sync {
    async fn send_ticket(&self, ticket: &TicketEmail) -> Result<(), MailerError>;

    /// Provider name for logs.
    fn provider(&self) -> &'static str;
}

/// Logs ticket emails instead of sending them.
#[derive(Debug, Default, Clone)]
pub struct ConsoleTicketMailer;

#[async_trait]
impl TicketMailer for ConsoleTicketMailer {
    async fn send_ticket(&self, ticket: &TicketEmail) -> Result<(), MailerError> {
        info!(
            to = %ticket.email,
            name = %ticket.name,
            faculty = %ticket.faculty,
            "Ticket email (console provider)"
        );
        Ok(())
    }

    fn provider(&self) -> &'static str {
        "console"
    }
}

#[derive(Debug, Deserialize)]
struct FailureBody {
    error: Option<String>,
}

/// Posts ticket emails to an HTTP mail endpoint.
#[derive(Debug, Clone)]
pub struct HttpTicketMailer {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpTicketMailer {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, MailerError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| MailerError::NotConfigured(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }
}

#[async_trait]
impl TicketMailer for HttpTicketMailer {
    async fn send_ticket(&self, ticket: &TicketEmail) -> Result<(), MailerError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(ticket)
            .send()
            .await
            .map_err(|e| MailerError::Transport(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        // Prefer the service's own error message when it sends one
        let reason = response
            .json::<FailureBody>()
            .await
            .ok()
            .and_then(|body| body.error)
            .unwrap_or_else(|| format!("status {}", status));

        warn!(status = %status, reason = %reason, "Ticket email rejected");
        Err(MailerError::Rejected(reason))
    }

    fn provider(&self) -> &'static str {
        "http"
    }
}

/// Builds the mailer selected by `tickets.mailer`.
pub fn build_mailer(config: &TicketsConfig) -> Result<Arc<dyn TicketMailer>, MailerError> {
    match config.mailer.as_str() {
        "console" => Ok(Arc::new(ConsoleTicketMailer)),
        "http" => {
            if config.send_endpoint.is_empty() {
                return Err(MailerError::NotConfigured(
                    "send_endpoint is empty".to_string(),
                ));
            }
            Ok(Arc::new(HttpTicketMailer::new(
                config.send_endpoint.clone(),
                Duration::from_secs(config.request_timeout_secs),
            )?))
        }
        other => Err(MailerError::NotConfigured(format!(
            "unknown provider '{}'",
            other
        ))),
    }
}
