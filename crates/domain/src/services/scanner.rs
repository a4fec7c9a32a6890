//! Check-in scanner state machine and camera fault taxonomy.
//!
//! The scanner accepts at most one payload at a time: while a scan is being
//! decoded or its result is on screen, further payloads are dropped.
//!
//! ```text
//! Idle -> Initializing -> Ready -> Decoding -> Showing -> Ready
//!   ^__________________________ stop() ____________________|
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::CheckInOutcome;

/// Scanner lifecycle state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ScannerState {
    #[default]
    Idle,
    Initializing,
    Ready,
    Decoding { payload: String },
    Showing { outcome: CheckInOutcome },
}

impl ScannerState {
    pub fn name(&self) -> &'static str {
        match self {
            ScannerState::Idle => "idle",
            ScannerState::Initializing => "initializing",
            ScannerState::Ready => "ready",
            ScannerState::Decoding { .. } => "decoding",
            ScannerState::Showing { .. } => "showing",
        }
    }
}

/// Transition attempted from a state that does not allow it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot {action} while scanner is {state}")]
pub struct InvalidTransition {
    pub action: &'static str,
    pub state: &'static str,
}

/// Single-operator scanner.
#[derive(Debug, Default)]
pub struct Scanner {
    state: ScannerState,
}

impl Scanner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &ScannerState {
        &self.state
    }

    pub fn is_active(&self) -> bool {
        self.state != ScannerState::Idle
    }

    fn invalid(&self, action: &'static str) -> InvalidTransition {
        InvalidTransition {
            action,
            state: self.state.name(),
        }
    }

    /// Idle -> Initializing.
    pub fn start(&mut self) -> Result<(), InvalidTransition> {
        match self.state {
            ScannerState::Idle => {
                self.state = ScannerState::Initializing;
                Ok(())
            }
            _ => Err(self.invalid("start")),
        }
    }

    /// Initializing -> Ready, once the warm-up delay has elapsed.
    pub fn mark_ready(&mut self) -> Result<(), InvalidTransition> {
        match self.state {
            ScannerState::Initializing => {
                self.state = ScannerState::Ready;
                Ok(())
            }
            _ => Err(self.invalid("mark ready")),
        }
    }

    /// Ready -> Decoding. Returns false and leaves the state untouched when
    /// a payload arrives in any other state.
    pub fn begin_decode(&mut self, payload: &str) -> bool {
        if self.state != ScannerState::Ready || payload.is_empty() {
            return false;
        }
        self.state = ScannerState::Decoding {
            payload: payload.to_string(),
        };
        true
    }

    /// Decoding -> Showing.
    pub fn show(&mut self, outcome: CheckInOutcome) -> Result<(), InvalidTransition> {
        match self.state {
            ScannerState::Decoding { .. } => {
                self.state = ScannerState::Showing { outcome };
                Ok(())
            }
            _ => Err(self.invalid("show a result")),
        }
    }

    /// Showing -> Ready, after the result has been on screen long enough.
    pub fn clear(&mut self) -> Result<(), InvalidTransition> {
        match self.state {
            ScannerState::Showing { .. } => {
                self.state = ScannerState::Ready;
                Ok(())
            }
            _ => Err(self.invalid("clear")),
        }
    }

    /// Any state -> Idle, discarding any in-progress result.
    pub fn stop(&mut self) {
        self.state = ScannerState::Idle;
    }
}

/// Scanner delays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScannerTimings {
    /// Delay between start and accepting payloads.
    pub warm_up: Duration,
    /// How long a successful check-in stays on screen.
    pub clear_after_success: Duration,
    /// How long any other outcome stays on screen.
    pub clear_after_failure: Duration,
}

impl Default for ScannerTimings {
    fn default() -> Self {
        Self {
            warm_up: Duration::from_millis(500),
            clear_after_success: Duration::from_millis(1500),
            clear_after_failure: Duration::from_millis(2000),
        }
    }
}

impl ScannerTimings {
    pub fn clear_delay(&self, outcome: &CheckInOutcome) -> Duration {
        if outcome.is_success() {
            self.clear_after_success
        } else {
            self.clear_after_failure
        }
    }
}

/// Camera failures reported by the operator's device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CameraFault {
    PermissionDenied,
    NotFound,
    NotSupported,
    /// Stream restarted underneath the scanner; not shown to the operator.
    TransientInterruption,
    Other { message: String },
}

impl CameraFault {
    /// Classifies a camera error from its name and message.
    pub fn classify(name: &str, message: &str) -> Self {
        let name = name.to_lowercase();
        let lower = message.to_lowercase();
        let mentions = |needle: &str| name == needle || lower.contains(needle);

        if name == "aborterror" || lower.contains("interrupted by a new load request") {
            CameraFault::TransientInterruption
        } else if lower.contains("permission denied") || mentions("notallowederror") {
            CameraFault::PermissionDenied
        } else if mentions("notfounderror") || lower.contains("not found") {
            CameraFault::NotFound
        } else if mentions("notsupportederror") {
            CameraFault::NotSupported
        } else {
            CameraFault::Other {
                message: message.to_string(),
            }
        }
    }

    /// Whether the fault stops the scanner.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, CameraFault::TransientInterruption)
    }

    /// Operator-facing message, `None` for suppressed faults.
    pub fn message(&self) -> Option<String> {
        match self {
            CameraFault::PermissionDenied => Some(
                "Camera access denied. Please allow camera permissions and try again.".to_string(),
            ),
            CameraFault::NotFound => {
                Some("No camera found. Please connect a camera and try again.".to_string())
            }
            CameraFault::NotSupported => Some("Camera not supported on this device.".to_string()),
            CameraFault::TransientInterruption => None,
            CameraFault::Other { message } => Some(format!("QR Scan Error: {message}")),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            CameraFault::PermissionDenied => "permission_denied",
            CameraFault::NotFound => "not_found",
            CameraFault::NotSupported => "not_supported",
            CameraFault::TransientInterruption => "transient_interruption",
            CameraFault::Other { .. } => "other",
        }
    }
}
