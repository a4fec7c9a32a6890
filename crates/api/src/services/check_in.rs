//! Ticket check-in at the entrance.

use domain::models::{
    resolve_check_in, CheckInDecision, CheckInOutcome, Registration, RegistrationPatch,
};
use persistence::store::{RegistrationStore, StoreError};
use std::sync::Arc;
use tracing::{info, warn};

use crate::middleware::metrics::record_check_in;

/// Marks registrants as arrived when their ticket is scanned.
#[derive(Clone)]
pub struct CheckInService {
    store: Arc<dyn RegistrationStore>,
}

impl CheckInService {
    pub fn new(store: Arc<dyn RegistrationStore>) -> Self {
        Self { store }
    }

    /// Resolves `payload` against a roster snapshot and admits the
    /// registrant when they have not arrived yet.
    ///
    /// The decision uses the snapshot; only the arrival write goes to the
    /// store. Unknown and already-arrived tickets are outcomes, not errors.
    pub async fn check_in(
        &self,
        roster: &[Registration],
        payload: &str,
    ) -> Result<CheckInOutcome, StoreError> {
        let outcome = match resolve_check_in(roster, payload) {
            CheckInDecision::NotFound => CheckInOutcome::NotFound {
                email: payload.to_string(),
            },
            CheckInDecision::AlreadyArrived(registration) => {
                CheckInOutcome::already_arrived(registration)
            }
            CheckInDecision::Admit(registration) => {
                match self
                    .store
                    .update(registration.id, RegistrationPatch::arrival(true))
                    .await
                {
                    Ok(updated) => CheckInOutcome::success(&updated),
                    Err(e) => {
                        warn!(registration_id = %registration.id, error = %e, "Check-in write failed");
                        record_check_in("error");
                        return Err(e);
                    }
                }
            }
        };

        info!(email = %payload, outcome = outcome.label(), "Ticket scanned");
        record_check_in(outcome.label());
        Ok(outcome)
    }

    /// Like [`check_in`](Self::check_in) but reports store failures as an
    /// `error` outcome for the operator.
    pub async fn check_in_or_report(
        &self,
        roster: &[Registration],
        payload: &str,
    ) -> CheckInOutcome {
        self.check_in(roster, payload)
            .await
            .unwrap_or_else(|_| CheckInOutcome::failed())
    }
}
