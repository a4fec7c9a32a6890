//! Database and roster sync metrics.

use metrics::{counter, gauge, histogram};
use std::time::Instant;

/// Record database query duration.
pub fn record_query_duration(query_name: &str, duration_secs: f64) {
    histogram!(
        "database_query_duration_seconds",
        "query" => query_name.to_string()
    )
    .record(duration_secs);
}

/// Record a roster reload and the number of registrations it published.
pub fn record_roster_reload(rows: usize) {
    counter!("roster_reloads_total").increment(1);
    gauge!("roster_registrations").set(rows as f64);
}

/// Record a failed roster listener connection.
pub fn record_listener_failure() {
    counter!("roster_listener_failures_total").increment(1);
}

/// A helper to time database operations and record metrics.
///
/// Usage:
/// ```ignore
/// let timer = QueryTimer::new("list_registrations");
/// let result = sqlx::query_as::<_, RegistrationEntity>(...).fetch_all(&pool).await;
/// timer.record();
/// result
/// ```
pub struct QueryTimer {
    query_name: &'static str,
    start: Instant,
}

impl QueryTimer {
    /// Create a new timer for the given query name.
    pub fn new(query_name: &'static str) -> Self {
        Self {
            query_name,
            start: Instant::now(),
        }
    }

    /// Record the elapsed duration to metrics.
    pub fn record(self) {
        record_query_duration(self.query_name, self.start.elapsed().as_secs_f64());
    }
}
