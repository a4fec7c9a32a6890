//! Ticket issuing and ticket email dispatch.
//!
//! A ticket is a view over a registration; the QR payload is the raw email.

use domain::models::{Registration, RegistrationPatch};
use persistence::store::{RegistrationStore, StoreError};
use serde::Serialize;
use shared::qr::{self, QrError};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

use super::mailer::{MailerError, TicketEmail, TicketMailer};
use crate::middleware::metrics::record_ticket_email;

/// File name offered for ticket downloads.
pub const TICKET_FILE_NAME: &str = "fusion-x-ticket.svg";

const TICKET_TITLE: &str = "Fusion X Ticket";
const FOOTER_PRESENT: &str = "Present this ticket at the entrance";
const FOOTER_SINGLE_ENTRY: &str = "Valid for one entry only";

#[derive(Debug, Error)]
pub enum TicketError {
    #[error("no registration found for {0}")]
    NotRegistered(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("QR code could not be generated: {0}")]
    Qr(#[from] QrError),

    #[error(transparent)]
    Mailer(#[from] MailerError),
}

/// Ticket shown to a registrant.
#[derive(Debug, Clone, Serialize)]
pub struct Ticket {
    pub name: String,
    pub email: String,
    pub faculty: String,
    pub qr_payload: String,
    pub qr_data_url: String,
}

/// Result of a ticket email request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchOutcome {
    Sent,
    AlreadySent,
}

impl DispatchOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            DispatchOutcome::Sent => "sent",
            DispatchOutcome::AlreadySent => "already_sent",
        }
    }
}

/// Issues tickets for registered emails and sends them at most once.
#[derive(Clone)]
pub struct TicketIssuer {
    store: Arc<dyn RegistrationStore>,
    mailer: Arc<dyn TicketMailer>,
    qr_size: u32,
}

impl TicketIssuer {
    pub fn new(
        store: Arc<dyn RegistrationStore>,
        mailer: Arc<dyn TicketMailer>,
        qr_size: u32,
    ) -> Self {
        Self {
            store,
            mailer,
            qr_size,
        }
    }

    async fn registration(&self, email: &str) -> Result<Registration, TicketError> {
        self.store
            .find_by_email(email)
            .await?
            .ok_or_else(|| TicketError::NotRegistered(email.to_string()))
    }

    /// Builds the ticket for a registered email.
    pub async fn issue(&self, email: &str) -> Result<Ticket, TicketError> {
        let registration = self.registration(email).await?;
        let qr_data_url = qr::encode_data_url(&registration.email, self.qr_size)?;

        Ok(Ticket {
            name: registration.name,
            faculty: registration.faculty,
            qr_payload: registration.email.clone(),
            email: registration.email,
            qr_data_url,
        })
    }

    /// PNG QR code for a registered email.
    pub async fn qr_png(&self, email: &str) -> Result<Vec<u8>, TicketError> {
        let registration = self.registration(email).await?;
        Ok(qr::encode_png(&registration.email, self.qr_size)?)
    }

    /// Sends the ticket email unless one was already sent.
    ///
    /// The record is read fresh from the store. The sent flag is only set
    /// after the mailer succeeds; a failed send leaves it clear for a later
    /// retry. Two concurrent calls can both send.
    pub async fn dispatch_email(&self, email: &str) -> Result<DispatchOutcome, TicketError> {
        let registration = self.registration(email).await?;

        if registration.is_email_sent {
            info!(registration_id = %registration.id, "Ticket email already sent");
            record_ticket_email(DispatchOutcome::AlreadySent.as_str());
            return Ok(DispatchOutcome::AlreadySent);
        }

        let message = TicketEmail {
            name: registration.name.clone(),
            email: registration.email.clone(),
            faculty: registration.faculty.clone(),
        };

        if let Err(e) = self.mailer.send_ticket(&message).await {
            warn!(
                registration_id = %registration.id,
                provider = self.mailer.provider(),
                error = %e,
                "Ticket email failed"
            );
            record_ticket_email("failed");
            return Err(e.into());
        }

        self.store
            .update(registration.id, RegistrationPatch::email_sent())
            .await?;

        info!(
            registration_id = %registration.id,
            provider = self.mailer.provider(),
            "Ticket email sent"
        );
        record_ticket_email(DispatchOutcome::Sent.as_str());
        Ok(DispatchOutcome::Sent)
    }
}

fn escape_xml(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// Renders the downloadable ticket as a standalone SVG document.
pub fn render_svg(ticket: &Ticket) -> String {
    format!(
        r##"<?xml version="1.0" encoding="UTF-8"?>
<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink" width="400" height="560" viewBox="0 0 400 560">
  <rect width="400" height="560" rx="16" fill="#ffffff" stroke="#1f2937" stroke-width="2"/>
  <rect width="400" height="72" rx="16" fill="#1f2937"/>
  <text x="200" y="46" text-anchor="middle" font-family="sans-serif" font-size="24" font-weight="bold" fill="#ffffff">{title}</text>
  <text x="200" y="116" text-anchor="middle" font-family="sans-serif" font-size="22" font-weight="bold" fill="#111827">{name}</text>
  <text x="200" y="146" text-anchor="middle" font-family="sans-serif" font-size="15" fill="#374151">{email}</text>
  <text x="200" y="172" text-anchor="middle" font-family="sans-serif" font-size="15" fill="#374151">{faculty}</text>
  <image x="100" y="196" width="200" height="200" xlink:href="{qr}" href="{qr}"/>
  <line x1="32" y1="432" x2="368" y2="432" stroke="#d1d5db" stroke-dasharray="6 4"/>
  <text x="200" y="470" text-anchor="middle" font-family="sans-serif" font-size="14" fill="#111827">{present}</text>
  <text x="200" y="496" text-anchor="middle" font-family="sans-serif" font-size="12" fill="#6b7280">{single}</text>
</svg>
"##,
        title = TICKET_TITLE,
        name = escape_xml(&ticket.name),
        email = escape_xml(&ticket.email),
        faculty = escape_xml(&ticket.faculty),
        qr = ticket.qr_data_url,
        present = FOOTER_PRESENT,
        single = FOOTER_SINGLE_ENTRY,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::mailer::ConsoleTicketMailer;
    use async_trait::async_trait;
    use domain::models::NewRegistration;
    use persistence::store::InMemoryRegistrationStore;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingMailer {
        sent: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl TicketMailer for CountingMailer {
        async fn send_ticket(&self, _ticket: &TicketEmail) -> Result<(), MailerError> {
            if self.fail {
                return Err(MailerError::Transport("connection refused".into()));
            }
            self.sent.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn provider(&self) -> &'static str {
            "counting"
        }
    }

    async fn seeded_store() -> Arc<InMemoryRegistrationStore> {
        let store = Arc::new(InMemoryRegistrationStore::new());
        store
            .create(NewRegistration {
                email: "a@x.com".to_string(),
                name: "Alice <A&B>".to_string(),
                whatsapp: "+1234567890".to_string(),
                faculty: "Eng".to_string(),
                year: "2".to_string(),
            })
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn test_issue_for_registered_email() {
        let store = seeded_store().await;
        let issuer = TicketIssuer::new(store, Arc::new(ConsoleTicketMailer), 200);

        let ticket = issuer.issue("a@x.com").await.unwrap();
        assert_eq!(ticket.qr_payload, "a@x.com");
        assert!(ticket.qr_data_url.starts_with("data:image/png;base64,"));
    }

    #[tokio::test]
    async fn test_issue_unknown_email() {
        let store = seeded_store().await;
        let issuer = TicketIssuer::new(store, Arc::new(ConsoleTicketMailer), 200);
        assert!(matches!(
            issuer.issue("b@x.com").await,
            Err(TicketError::NotRegistered(_))
        ));
    }

    #[tokio::test]
    async fn test_qr_png_decodes_to_email() {
        let store = seeded_store().await;
        let issuer = TicketIssuer::new(store, Arc::new(ConsoleTicketMailer), 200);
        let png = issuer.qr_png("a@x.com").await.unwrap();
        assert_eq!(qr::decode_image(&png).unwrap(), "a@x.com");
    }

    #[tokio::test]
    async fn test_dispatch_sends_at_most_once() {
        let store = seeded_store().await;
        let mailer = Arc::new(CountingMailer::default());
        let issuer = TicketIssuer::new(store.clone(), mailer.clone(), 200);

        assert_eq!(
            issuer.dispatch_email("a@x.com").await.unwrap(),
            DispatchOutcome::Sent
        );
        assert_eq!(
            issuer.dispatch_email("a@x.com").await.unwrap(),
            DispatchOutcome::AlreadySent
        );
        assert_eq!(mailer.sent.load(Ordering::SeqCst), 1);

        let record = store.find_by_email("a@x.com").await.unwrap().unwrap();
        assert!(record.is_email_sent);
        assert!(record.email_sent_at.is_some());
    }

    #[tokio::test]
    async fn test_failed_dispatch_leaves_flag_clear() {
        let store = seeded_store().await;
        let mailer = Arc::new(CountingMailer {
            fail: true,
            ..Default::default()
        });
        let issuer = TicketIssuer::new(store.clone(), mailer, 200);

        assert!(matches!(
            issuer.dispatch_email("a@x.com").await,
            Err(TicketError::Mailer(_))
        ));
        let record = store.find_by_email("a@x.com").await.unwrap().unwrap();
        assert!(!record.is_email_sent);
    }

    #[tokio::test]
    async fn test_render_svg_escapes_fields() {
        let store = seeded_store().await;
        let issuer = TicketIssuer::new(store, Arc::new(ConsoleTicketMailer), 200);
        let ticket = issuer.issue("a@x.com").await.unwrap();

        let svg = render_svg(&ticket);
        assert!(svg.starts_with("<?xml"));
        assert!(svg.contains("Alice &lt;A&amp;B&gt;"));
        assert!(svg.contains(FOOTER_PRESENT));
        assert!(svg.contains(FOOTER_SINGLE_ENTRY));
        assert!(svg.contains(&ticket.qr_data_url));
    }

    #[test]
    fn test_escape_xml() {
        assert_eq!(escape_xml(r#"a"b'c"#), "a&quot;b&apos;c");
        assert_eq!(escape_xml("plain"), "plain");
    }
}
