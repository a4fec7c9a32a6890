//! Domain models for Fusion X.

pub mod check_in;
pub mod registration;
pub mod roster;

pub use check_in::{resolve_check_in, CheckInDecision, CheckInOutcome};
pub use registration::{
    NewRegistration, Registration, RegistrationField, RegistrationForm, RegistrationPatch,
};
pub use roster::{RosterColumn, RosterQuery, RosterView};
