//! API server configuration.
//!
//! Configuration is loaded from environment variables with fallback to defaults.
//!
//! | Variable | Default |
//! |---|---|
//! | `HOST` | `0.0.0.0` |
//! | `PORT` | `5000` |
//! | `DATABASE_PATH` | `./hisaab.db` |
//! | `DB_MAX_CONNECTIONS` | `5` |
//! | `JWT_SECRET` | development secret (logged as a warning) |
//! | `JWT_LIFETIME_SECS` | `3600` |
//! | `ALLOW_NEGATIVE_STOCK` | `false` |
//! | `CORS_ORIGIN` | `http://localhost:3000` |

use std::env;
use std::path::PathBuf;

use hisaab_core::StockPolicy;
use hisaab_db::DbConfig;

/// Secret used when `JWT_SECRET` is unset. Never acceptable in production.
pub const DEV_JWT_SECRET: &str = "dev-secret-change-me";

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Bind address
    pub host: String,

    /// HTTP port
    pub port: u16,

    /// SQLite database file
    pub database_path: PathBuf,

    /// Pool size
    pub db_max_connections: u32,

    /// HMAC key for signing tokens
    pub jwt_secret: String,

    /// Token lifetime in seconds
    pub jwt_lifetime_secs: i64,

    /// Let sales drive stock below zero
    pub allow_negative_stock: bool,

    /// Browser origin allowed by CORS
    pub cors_origin: String,
}

impl ApiConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key lookup (the process
    /// environment in production, a map in tests).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let config = ApiConfig {
            host: var("HOST", "0.0.0.0"),

            port: var("PORT", "5000")
                .parse()
                .map_err(|_| ConfigError::InvalidValue("PORT".to_string()))?,

            database_path: PathBuf::from(var("DATABASE_PATH", "./hisaab.db")),

            db_max_connections: var("DB_MAX_CONNECTIONS", "5")
                .parse()
                .map_err(|_| ConfigError::InvalidValue("DB_MAX_CONNECTIONS".to_string()))?,

            jwt_secret: var("JWT_SECRET", DEV_JWT_SECRET),

            jwt_lifetime_secs: var("JWT_LIFETIME_SECS", "3600") // 1 hour
                .parse()
                .map_err(|_| ConfigError::InvalidValue("JWT_LIFETIME_SECS".to_string()))?,

            allow_negative_stock: parse_flag(&var("ALLOW_NEGATIVE_STOCK", "false"))
                .ok_or_else(|| ConfigError::InvalidValue("ALLOW_NEGATIVE_STOCK".to_string()))?,

            cors_origin: var("CORS_ORIGIN", "http://localhost:3000"),
        };

        if config.db_max_connections == 0 {
            return Err(ConfigError::InvalidValue("DB_MAX_CONNECTIONS".to_string()));
        }
        if config.jwt_lifetime_secs <= 0 {
            return Err(ConfigError::InvalidValue("JWT_LIFETIME_SECS".to_string()));
        }
        if config.jwt_secret.is_empty() {
            return Err(ConfigError::MissingRequired("JWT_SECRET".to_string()));
        }

        Ok(config)
    }

    /// `host:port` for the listener.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn stock_policy(&self) -> StockPolicy {
        if self.allow_negative_stock {
            StockPolicy::Backorder
        } else {
            StockPolicy::Reject
        }
    }

    /// True when tokens are signed with [`DEV_JWT_SECRET`].
    pub fn uses_dev_secret(&self) -> bool {
        self.jwt_secret == DEV_JWT_SECRET
    }

    /// Database settings derived from this configuration.
    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(self.database_path.clone())
            .max_connections(self.db_max_connections)
            .stock_policy(self.stock_policy())
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}
