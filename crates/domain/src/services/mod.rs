//! Domain services for Fusion X.
//!
//! Services contain business logic that operates on domain models.

pub mod scanner;

pub use scanner::{CameraFault, InvalidTransition, Scanner, ScannerState, ScannerTimings};
