use domain::services::ScannerTimings;
use serde::Deserialize;
use std::net::{AddrParseError, SocketAddr};
use std::time::Duration;

/// Store backend names accepted in `store.backend`.
pub const STORE_BACKENDS: [&str; 2] = ["postgres", "memory"];

/// Mailer providers accepted in `tickets.mailer`.
pub const MAILER_PROVIDERS: [&str; 2] = ["console", "http"];

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub store: StoreConfig,
    pub logging: LoggingConfig,
    pub security: SecurityConfig,
    pub admin: AdminConfig,
    pub tickets: TicketsConfig,
    #[serde(default)]
    pub scanner: ScannerConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Base URL used when building ticket links.
    #[serde(default = "default_public_base_url")]
    pub public_base_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub url: String,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
}

impl From<&DatabaseConfig> for persistence::db::DatabaseConfig {
    fn from(config: &DatabaseConfig) -> Self {
        Self {
            url: config.url.clone(),
            max_connections: config.max_connections,
            min_connections: config.min_connections,
            connect_timeout_secs: config.connect_timeout_secs,
            idle_timeout_secs: config.idle_timeout_secs,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// `postgres` or `memory`.
    #[serde(default = "default_store_backend")]
    pub backend: String,

    /// Delay before the roster listener reconnects after a failure.
    #[serde(default = "default_listener_retry")]
    pub listener_retry_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SecurityConfig {
    #[serde(default)]
    pub cors_origins: Vec<String>,

    /// Per-client limit on public write routes; 0 disables rate limiting.
    #[serde(default = "default_rate_limit")]
    pub rate_limit_per_minute: u32,

    /// Adds `Strict-Transport-Security`; enable only behind TLS termination.
    #[serde(default)]
    pub hsts_enabled: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AdminConfig {
    /// SHA-256 hex digests of the admin API keys.
    #[serde(default)]
    pub api_key_hashes: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TicketsConfig {
    /// Dispatch the ticket email in the background after registration.
    #[serde(default = "default_auto_send")]
    pub auto_send_on_register: bool,

    /// `console` or `http`.
    #[serde(default = "default_mailer")]
    pub mailer: String,

    /// Endpoint receiving `{name, email, faculty}` for the http mailer.
    #[serde(default)]
    pub send_endpoint: String,

    #[serde(default = "default_mailer_timeout")]
    pub request_timeout_secs: u64,

    /// Where ticket lookups redirect when the email is not registered.
    #[serde(default = "default_register_page_url")]
    pub register_page_url: String,

    #[serde(default = "default_qr_size")]
    pub qr_size: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScannerConfig {
    #[serde(default = "default_warm_up_ms")]
    pub warm_up_ms: u64,

    #[serde(default = "default_clear_after_success_ms")]
    pub clear_after_success_ms: u64,

    #[serde(default = "default_clear_after_failure_ms")]
    pub clear_after_failure_ms: u64,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            warm_up_ms: default_warm_up_ms(),
            clear_after_success_ms: default_clear_after_success_ms(),
            clear_after_failure_ms: default_clear_after_failure_ms(),
        }
    }
}

impl ScannerConfig {
    pub fn timings(&self) -> ScannerTimings {
        ScannerTimings {
            warm_up: Duration::from_millis(self.warm_up_ms),
            clear_after_success: Duration::from_millis(self.clear_after_success_ms),
            clear_after_failure: Duration::from_millis(self.clear_after_failure_ms),
        }
    }
}

// Default value functions
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_request_timeout() -> u64 {
    30
}
fn default_public_base_url() -> String {
    "http://localhost:8080".to_string()
}
fn default_max_connections() -> u32 {
    10
}
fn default_min_connections() -> u32 {
    2
}
fn default_connect_timeout() -> u64 {
    10
}
fn default_idle_timeout() -> u64 {
    600
}
fn default_store_backend() -> String {
    "postgres".to_string()
}
fn default_listener_retry() -> u64 {
    5
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    "json".to_string()
}
fn default_rate_limit() -> u32 {
    30
}
fn default_auto_send() -> bool {
    true
}
fn default_mailer() -> String {
    "console".to_string()
}
fn default_mailer_timeout() -> u64 {
    10
}
fn default_register_page_url() -> String {
    "/registerpage".to_string()
}
fn default_qr_size() -> u32 {
    shared::qr::DEFAULT_QR_SIZE
}
fn default_warm_up_ms() -> u64 {
    500
}
fn default_clear_after_success_ms() -> u64 {
    1500
}
fn default_clear_after_failure_ms() -> u64 {
    2000
}

/// Configuration validation error
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Loading order (later sources override earlier):
    /// 1. config/default.toml - base configuration with defaults
    /// 2. config/local.toml - local overrides (optional, not in git)
    /// 3. Environment variables with FX__ prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("FX")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("admin.api_key_hashes")
                    .with_list_parse_key("security.cors_origins")
                    .try_parsing(true),
            )
            .build()?;

        let cfg: Self = config.try_deserialize()?;
        cfg.validate()
            .map_err(|e| config::ConfigError::Message(e.to_string()))?;
        Ok(cfg)
    }

    /// Load configuration for testing with custom overrides.
    ///
    /// Builds the config from embedded defaults so tests do not depend on
    /// config files.
    #[cfg(test)]
    pub fn load_for_test(overrides: &[(&str, &str)]) -> Result<Self, config::ConfigError> {
        let defaults = r#"
            [server]
            host = "0.0.0.0"
            port = 8080
            request_timeout_secs = 30
            public_base_url = "http://localhost:8080"

            [database]
            url = ""
            max_connections = 10
            min_connections = 2
            connect_timeout_secs = 10
            idle_timeout_secs = 600

            [store]
            backend = "postgres"
            listener_retry_secs = 5

            [logging]
            level = "info"
            format = "json"

            [security]
            cors_origins = []
            rate_limit_per_minute = 30
            hsts_enabled = false

            [admin]
            api_key_hashes = []

            [tickets]
            auto_send_on_register = true
            mailer = "console"
            send_endpoint = ""
            request_timeout_secs = 10
            register_page_url = "/registerpage"
            qr_size = 200

            [scanner]
            warm_up_ms = 500
            clear_after_success_ms = 1500
            clear_after_failure_ms = 2000
        "#;

        let mut builder = config::Config::builder()
            .add_source(config::File::from_str(defaults, config::FileFormat::Toml));

        for (key, value) in overrides {
            builder = builder.set_override(*key, *value)?;
        }

        // Skip validation in tests to allow partial configs
        builder.build()?.try_deserialize()
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if !STORE_BACKENDS.contains(&self.store.backend.as_str()) {
            return Err(ConfigValidationError::InvalidValue(format!(
                "Unknown store backend '{}'",
                self.store.backend
            )));
        }

        // Database URL is only required for the postgres backend
        if self.store.backend == "postgres" && self.database.url.is_empty() {
            return Err(ConfigValidationError::MissingRequired(
                "FX__DATABASE__URL environment variable must be set".to_string(),
            ));
        }

        if self.server.port == 0 {
            return Err(ConfigValidationError::InvalidValue(
                "Server port cannot be 0".to_string(),
            ));
        }

        if self.database.min_connections > self.database.max_connections {
            return Err(ConfigValidationError::InvalidValue(
                "min_connections cannot exceed max_connections".to_string(),
            ));
        }

        if !MAILER_PROVIDERS.contains(&self.tickets.mailer.as_str()) {
            return Err(ConfigValidationError::InvalidValue(format!(
                "Unknown ticket mailer '{}'",
                self.tickets.mailer
            )));
        }

        if self.tickets.mailer == "http" && self.tickets.send_endpoint.is_empty() {
            return Err(ConfigValidationError::MissingRequired(
                "FX__TICKETS__SEND_ENDPOINT must be set for the http mailer".to_string(),
            ));
        }

        Ok(())
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, AddrParseError> {
        format!("{}:{}", self.server.host, self.server.port).parse()
    }
}
