//! API configuration
//!
//! Loaded from `COMMISSION_*` environment variables (after `.env` is read by
//! the binary). Every key has a default so a bare process starts against the
//! in-memory stores.

use std::time::Duration;

use serde::Deserialize;

use core_kernel::Currency;
use domain_commission::ConsistencyMode;
use domain_payout::RetryPolicy;
use infra_db::DatabaseConfig;

/// Where rules, records and payouts are kept
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    /// Process-local maps; state is lost on restart
    #[default]
    Memory,
    /// PostgreSQL at `database_url`
    Postgres,
}

/// API configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// JWT secret for authentication
    pub jwt_secret: String,
    /// JWT expiration in seconds
    pub jwt_expiration_secs: u64,
    /// Database URL, used when `storage` is `postgres`
    pub database_url: String,
    /// Pool size for store queries
    pub database_max_connections: u32,
    /// Size of the separate strict-mode lock pool; bounds how many agents
    /// can be locked at once
    pub database_lock_connections: u32,
    /// Log level
    pub log_level: String,
    /// ISO code of the single currency the engine books in
    pub currency: String,
    pub storage: StorageBackend,
    pub consistency_mode: ConsistencyMode,
    /// Retries after the first failed notification attempt
    pub notification_max_retries: u32,
    /// Backoff before the first retry; doubles on each further retry
    pub notification_base_delay_ms: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            jwt_secret: "change-me-in-production".to_string(),
            jwt_expiration_secs: 3600,
            database_url: "postgres://localhost/commissions".to_string(),
            database_max_connections: 10,
            database_lock_connections: 4,
            log_level: "info".to_string(),
            currency: "USD".to_string(),
            storage: StorageBackend::Memory,
            consistency_mode: ConsistencyMode::Relaxed,
            notification_max_retries: 3,
            notification_base_delay_ms: 500,
        }
    }
}

impl ApiConfig {
    /// Loads configuration from `COMMISSION_*` environment variables
    pub fn from_env() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::Environment::with_prefix("COMMISSION"))
            .build()?
            .try_deserialize()
    }

    /// Returns the server address
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// The configured booking currency
    pub fn currency(&self) -> Result<Currency, core_kernel::MoneyError> {
        self.currency.parse()
    }

    pub fn database(&self) -> DatabaseConfig {
        DatabaseConfig::new(&self.database_url).max_connections(self.database_max_connections)
    }

    /// Pool for advisory locks, kept apart so lock holders never starve
    /// the queries they guard
    pub fn lock_database(&self) -> DatabaseConfig {
        DatabaseConfig::new(&self.database_url)
            .max_connections(self.database_lock_connections)
            .min_connections(1)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.notification_max_retries,
            Duration::from_millis(self.notification_base_delay_ms),
        )
    }
}
