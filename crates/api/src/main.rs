use anyhow::Result;
use persistence::store::{InMemoryRegistrationStore, PgRegistrationStore, RegistrationStore};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use fusion_api::{app, config, middleware, services};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Load configuration
    let config = config::Config::load()?;

    // Initialize logging and metrics
    middleware::logging::init_logging(&config.logging);
    middleware::init_metrics()?;

    info!("Starting Fusion X API v{}", env!("CARGO_PKG_VERSION"));

    let store = build_store(&config).await?;
    let mailer = services::build_mailer(&config.tickets)?;
    info!(
        backend = %config.store.backend,
        mailer = mailer.provider(),
        "Services ready"
    );

    // Build application
    let app = app::create_app(config.clone(), store, mailer);

    // Start server
    let addr = config.socket_addr()?;
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn build_store(config: &config::Config) -> Result<Arc<dyn RegistrationStore>> {
    if config.store.backend == "memory" {
        warn!("Using in-memory registration store; data is lost on restart");
        return Ok(Arc::new(InMemoryRegistrationStore::new()));
    }

    // Create database pool
    let db_config: persistence::db::DatabaseConfig = (&config.database).into();
    let pool = persistence::db::create_pool(&db_config).await?;

    // Run migrations
    info!("Running database migrations...");
    sqlx::migrate!("../persistence/src/migrations")
        .run(&pool)
        .await?;
    info!("Migrations completed");

    let retry = Duration::from_secs(config.store.listener_retry_secs);
    Ok(Arc::new(PgRegistrationStore::start(pool, retry).await?))
}
