//! Application configuration loaded from defaults, optional TOML files and
//! environment variables.

use config::{Config as ConfigBuilder, ConfigError, Environment, File};
use serde::Deserialize;

/// Top-level application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub environment: String,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub reports: ReportsConfig,
}

/// HTTP server settings
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Upper bound on request handling time, in seconds
    pub request_timeout_secs: u64,
}

/// SQLite connection pool settings
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

/// Session and credential settings
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Secret signing the session tokens. Deliberately has no default: it
    /// must come from a config file or STOCKROOM__AUTH__SESSION_SECRET.
    pub session_secret: String,
    /// Sessions idle longer than this are invalidated
    pub idle_timeout_minutes: i64,
    /// Outer lifetime of remember-me sessions
    pub remember_days: i64,
    pub bcrypt_cost: u32,
    /// Password for the one-time bootstrap admin account. When unset a
    /// random password is generated and logged once at startup.
    pub bootstrap_password: Option<String>,
}

/// Report output settings
#[derive(Debug, Clone, Deserialize)]
pub struct ReportsConfig {
    /// Directory PDF exports are written to
    pub output_dir: String,
}

impl Config {
    /// Load configuration: built-in defaults, then `config/{environment}`
    /// if present, then `STOCKROOM__*` environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let environment =
            std::env::var("STOCKROOM_ENVIRONMENT").unwrap_or_else(|_| "development".to_string());

        let config = ConfigBuilder::builder()
            .set_default("environment", environment.clone())?
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 3000)?
            .set_default("server.request_timeout_secs", 30)?
            .set_default("database.url", "sqlite:stockroom.db")?
            .set_default("database.max_connections", 5)?
            .set_default("database.min_connections", 1)?
            .set_default("auth.idle_timeout_minutes", 30)?
            .set_default("auth.remember_days", 30)?
            .set_default("auth.bcrypt_cost", 12)?
            .set_default("reports.output_dir", "reports")?
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            .add_source(
                Environment::with_prefix("STOCKROOM")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}
