use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use persistence::store::RegistrationStore;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::Config;
use crate::middleware::{
    metrics_handler, metrics_middleware, rate_limit_middleware, require_admin,
    security_headers_middleware, trace_id, RateLimiterState,
};
use crate::routes::{check_in, health, registrations, roster, scanner, tickets};
use crate::services::{
    ArrivalGuard, CheckInService, RegistrationService, TicketIssuer, TicketMailer,
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Arc<dyn RegistrationStore>,
    pub registrations: RegistrationService,
    pub tickets: TicketIssuer,
    pub check_in: CheckInService,
    pub arrivals: ArrivalGuard,
    pub rate_limiter: Option<Arc<RateLimiterState>>,
}

impl AppState {
    pub fn new(
        config: Config,
        store: Arc<dyn RegistrationStore>,
        mailer: Arc<dyn TicketMailer>,
    ) -> Self {
        let config = Arc::new(config);

        // Rate limiting is disabled when rate_limit_per_minute is 0
        let rate_limiter =
            RateLimiterState::new(config.security.rate_limit_per_minute).map(Arc::new);

        Self {
            registrations: RegistrationService::new(store.clone()),
            tickets: TicketIssuer::new(store.clone(), mailer, config.tickets.qr_size),
            check_in: CheckInService::new(store.clone()),
            arrivals: ArrivalGuard::new(),
            rate_limiter,
            store,
            config,
        }
    }
}

pub fn create_app(
    config: Config,
    store: Arc<dyn RegistrationStore>,
    mailer: Arc<dyn TicketMailer>,
) -> Router {
    let state = AppState::new(config, store, mailer);
    let config = state.config.clone();

    // Build CORS layer based on configuration
    let cors = if config.security.cors_origins.is_empty() {
        // Default: allow any origin (for development)
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = config
            .security
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    };

    // Public write routes (rate limited per client)
    let public_write_routes = Router::new()
        .route("/api/v1/registrations", post(registrations::register))
        .route("/api/v1/tickets/send", post(tickets::send_ticket))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ));

    // Public read routes (no authentication required)
    let public_routes = Router::new()
        .route("/api/health", get(health::health_check))
        .route("/api/health/ready", get(health::ready))
        .route("/api/health/live", get(health::live))
        .route("/metrics", get(metrics_handler))
        .route(
            "/api/v1/registrations/check",
            get(registrations::check_email),
        )
        .route("/api/v1/tickets", get(tickets::get_ticket))
        .route("/api/v1/tickets/qr.png", get(tickets::qr_code))
        .route("/api/v1/tickets/download", get(tickets::download));

    // Admin routes (require admin API key)
    let admin_routes = Router::new()
        .route(
            "/api/v1/admin/registrations",
            get(roster::list_registrations),
        )
        .route(
            "/api/v1/admin/registrations/stream",
            get(roster::stream_registrations),
        )
        .route(
            "/api/v1/admin/registrations/export",
            get(roster::export_registrations),
        )
        .route(
            "/api/v1/admin/registrations/:id/arrival",
            put(roster::set_arrival),
        )
        .route("/api/v1/admin/check-in", post(check_in::check_in))
        .route(
            "/api/v1/admin/check-in/image",
            post(check_in::check_in_image),
        )
        .route("/api/v1/admin/scanner", get(scanner::scanner_socket))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_admin));

    // Merge all routes
    Router::new()
        .merge(public_routes)
        .merge(public_write_routes)
        .merge(admin_routes)
        // Global middleware (order matters: bottom layers run first)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            security_headers_middleware,
        ))
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(middleware::from_fn(metrics_middleware)) // Prometheus metrics
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(trace_id)) // Request ID and logging
        .layer(cors)
        .with_state(state)
}
