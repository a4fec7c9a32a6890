//! Operator scanner session.
//!
//! One session per connected operator. The session owns a [`Scanner`] state
//! machine and a roster subscription, consumes [`ScanInput`]s and reports
//! progress as [`ScanEvent`]s. Inputs are handled one at a time; payloads
//! that arrive while a check-in is processing or a result is on screen are
//! dropped.

use domain::models::CheckInOutcome;
use domain::services::{CameraFault, Scanner, ScannerState, ScannerTimings};
use futures::{Stream, StreamExt};
use persistence::store::{RegistrationStore, RosterSubscription};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info, warn};

use super::check_in::CheckInService;

/// Messages from the operator's scanner page.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScanInput {
    /// Camera granted; begin warming up.
    Start,
    /// A QR payload decoded on the client.
    Payload { payload: String },
    /// A raw camera frame to decode here. Arrives as a binary message.
    #[serde(skip)]
    Frame(Vec<u8>),
    /// Camera error reported by the browser.
    CameraError {
        #[serde(default)]
        name: String,
        #[serde(default)]
        message: String,
    },
    Stop,
}

/// Progress reported back to the operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScanEvent {
    Initializing,
    Ready,
    Processing {
        payload: String,
    },
    Outcome {
        outcome: CheckInOutcome,
        message: String,
    },
    Cleared,
    Fault {
        fault: CameraFault,
        #[serde(skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    Stopped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Timer {
    WarmUp,
    Clear,
}

/// Drives one operator's scanner.
pub struct ScannerSession {
    store: Arc<dyn RegistrationStore>,
    check_in: CheckInService,
    timings: ScannerTimings,
    scanner: Scanner,
    roster: Option<RosterSubscription>,
    deadline: Option<(Instant, Timer)>,
}

impl ScannerSession {
    pub fn new(store: Arc<dyn RegistrationStore>, timings: ScannerTimings) -> Self {
        Self {
            check_in: CheckInService::new(store.clone()),
            store,
            timings,
            scanner: Scanner::new(),
            roster: None,
            deadline: None,
        }
    }

    /// Runs until the input stream ends or the event receiver is dropped.
    pub async fn run<S>(mut self, mut inputs: S, events: mpsc::Sender<ScanEvent>)
    where
        S: Stream<Item = ScanInput> + Unpin,
    {
        loop {
            let deadline = self.deadline.map(|(at, _)| at);

            let keep_going = tokio::select! {
                input = inputs.next() => match input {
                    Some(input) => self.handle(input, &events).await,
                    None => false,
                },
                _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    self.on_timer(&events).await
                }
            };

            if !keep_going {
                break;
            }
        }

        self.halt();
        debug!("Scanner session closed");
    }

    async fn handle(&mut self, input: ScanInput, events: &mpsc::Sender<ScanEvent>) -> bool {
        match input {
            ScanInput::Start => {
                if let Err(e) = self.scanner.start() {
                    debug!(error = %e, "Ignoring start");
                    return true;
                }
                self.roster = Some(self.store.subscribe());
                self.deadline = Some((Instant::now() + self.timings.warm_up, Timer::WarmUp));
                info!("Scanner starting");
                emit(events, ScanEvent::Initializing).await
            }
            ScanInput::Payload { payload } => self.process(payload, events).await,
            ScanInput::Frame(bytes) => {
                // Decoding is only worth doing when a payload would be accepted
                if *self.scanner.state() != ScannerState::Ready {
                    return true;
                }
                match tokio::task::spawn_blocking(move || shared::qr::decode_image(&bytes)).await
                {
                    Ok(Ok(payload)) => self.process(payload, events).await,
                    Ok(Err(e)) => {
                        debug!(error = %e, "No QR code in frame");
                        true
                    }
                    Err(e) => {
                        warn!(error = %e, "Frame decoding task failed");
                        true
                    }
                }
            }
            ScanInput::CameraError { name, message } => {
                let fault = CameraFault::classify(&name, &message);
                if !fault.is_fatal() {
                    debug!(name = %name, "Suppressed transient camera interruption");
                    return true;
                }
                warn!(fault = fault.label(), name = %name, message = %message, "Camera error");
                let message = fault.message();
                self.halt();
                emit(events, ScanEvent::Fault { fault, message }).await
                    && emit(events, ScanEvent::Stopped).await
            }
            ScanInput::Stop => {
                self.halt();
                info!("Scanner stopped");
                emit(events, ScanEvent::Stopped).await
            }
        }
    }

    async fn process(&mut self, payload: String, events: &mpsc::Sender<ScanEvent>) -> bool {
        if !self.scanner.begin_decode(&payload) {
            debug!(state = self.scanner.state().name(), "Suppressed scan");
            return true;
        }

        if !emit(
            events,
            ScanEvent::Processing {
                payload: payload.clone(),
            },
        )
        .await
        {
            return false;
        }

        let roster = self
            .roster
            .as_ref()
            .map(RosterSubscription::snapshot)
            .unwrap_or_default();
        let outcome = self.check_in.check_in_or_report(&roster, &payload).await;

        if let Err(e) = self.scanner.show(outcome.clone()) {
            warn!(error = %e, "Scanner left decoding early");
            return true;
        }
        self.deadline = Some((
            Instant::now() + self.timings.clear_delay(&outcome),
            Timer::Clear,
        ));

        let message = outcome.message();
        emit(events, ScanEvent::Outcome { outcome, message }).await
    }

    async fn on_timer(&mut self, events: &mpsc::Sender<ScanEvent>) -> bool {
        let Some((_, timer)) = self.deadline.take() else {
            return true;
        };

        match timer {
            Timer::WarmUp => match self.scanner.mark_ready() {
                Ok(()) => emit(events, ScanEvent::Ready).await,
                Err(e) => {
                    debug!(error = %e, "Warm-up finished after stop");
                    true
                }
            },
            Timer::Clear => match self.scanner.clear() {
                Ok(()) => emit(events, ScanEvent::Cleared).await,
                Err(e) => {
                    debug!(error = %e, "Nothing to clear");
                    true
                }
            },
        }
    }

    /// Returns to idle and releases the roster subscription.
    fn halt(&mut self) {
        self.scanner.stop();
        self.roster = None;
        self.deadline = None;
    }
}

async fn emit(events: &mpsc::Sender<ScanEvent>, event: ScanEvent) -> bool {
    events.send(event).await.is_ok()
}
