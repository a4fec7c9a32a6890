//! Operator scanner WebSocket.
//!
//! Text messages carry JSON [`ScanInput`]s; binary messages are camera
//! frames. Every [`ScanEvent`] is sent back as a JSON text message.

use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
};
use futures::{future, SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::app::AppState;
use crate::extractors::AdminKey;
use crate::services::{ScanEvent, ScanInput, ScannerSession};

const EVENT_BUFFER: usize = 32;

/// GET /api/v1/admin/scanner
pub async fn scanner_socket(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    admin: AdminKey,
) -> Response {
    info!(key_prefix = %admin.key_prefix, "Scanner connection requested");
    ws.on_upgrade(move |socket| run_scanner_socket(socket, state))
}

/// Maps a socket message to a scanner input; control frames map to `None`.
pub fn scan_input(message: Message) -> Option<ScanInput> {
    match message {
        Message::Text(text) => match serde_json::from_str(&text) {
            Ok(input) => Some(input),
            Err(e) => {
                warn!(error = %e, "Ignoring malformed scanner message");
                None
            }
        },
        Message::Binary(bytes) => Some(ScanInput::Frame(bytes)),
        _ => None,
    }
}

async fn run_scanner_socket(socket: WebSocket, state: AppState) {
    let (mut sender, receiver) = socket.split();
    let (event_tx, mut event_rx) = mpsc::channel::<ScanEvent>(EVENT_BUFFER);

    let send_task = tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            let json = match serde_json::to_string(&event) {
                Ok(json) => json,
                Err(e) => {
                    warn!(error = %e, "Failed to serialize scanner event");
                    continue;
                }
            };
            if sender.send(Message::Text(json)).await.is_err() {
                debug!("Scanner client went away");
                break;
            }
        }
    });

    let inputs = receiver
        .take_while(|message| {
            future::ready(matches!(message, Ok(m) if !matches!(m, Message::Close(_))))
        })
        .filter_map(|message| future::ready(message.ok().and_then(scan_input)));

    let session = ScannerSession::new(state.store.clone(), state.config.scanner.timings());
    session.run(Box::pin(inputs), event_tx).await;

    let _ = send_task.await;
    info!("Scanner connection closed");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_input_from_text() {
        let input = scan_input(Message::Text(r#"{"type":"stop"}"#.to_string()));
        assert_eq!(input, Some(ScanInput::Stop));
    }

    #[test]
    fn test_scan_input_from_binary() {
        let input = scan_input(Message::Binary(vec![1, 2, 3]));
        assert_eq!(input, Some(ScanInput::Frame(vec![1, 2, 3])));
    }

    #[test]
    fn test_scan_input_ignores_noise() {
        assert!(scan_input(Message::Text("not json".to_string())).is_none());
        assert!(scan_input(Message::Ping(vec![])).is_none());
    }
}
