//! Configuration management for the server.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use stockroom_engine::{ShopConfig, MILLIS_PER_SECOND};

/// Server configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server host address
    pub host: String,
    /// Server port
    pub port: u16,
    /// PostgreSQL connection URL
    pub database_url: String,
    /// Admin password; admin routes refuse everything when unset
    pub admin_password: Option<String>,
    /// Consecutive failed admin logins before the lockout
    pub admin_max_attempts: u32,
    /// Admin lockout length in seconds
    pub admin_lockout_secs: u64,
    /// Cart time-to-live in seconds
    pub cart_ttl_secs: u64,
    /// Seconds between expiry sweeps
    pub sweep_interval_secs: u64,
    /// Open orders at which the shop closes itself
    pub auto_close_threshold: Option<u64>,
    /// Advertised length of an automatic close, in seconds
    pub close_window_secs: u64,
    /// Age in hours after which pending orders are cancelled
    pub stale_order_hours: Option<u64>,
    /// Path of a catalog seed applied at startup
    pub catalog_seed: Option<String>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());

        let port = env::var("PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidPort)?;

        let database_url = env::var("DATABASE_URL").map_err(|_| ConfigError::MissingDatabaseUrl)?;

        let admin_password = env::var("ADMIN_PASSWORD").ok().filter(|p| !p.is_empty());

        Ok(Self {
            host,
            port,
            database_url,
            admin_password,
            admin_max_attempts: parse_or("ADMIN_MAX_ATTEMPTS", 5)?,
            admin_lockout_secs: parse_or("ADMIN_LOCKOUT_SECS", 300)?,
            cart_ttl_secs: parse_or("CART_TTL_SECS", 600)?,
            sweep_interval_secs: parse_or("SWEEP_INTERVAL_SECS", 60)?,
            auto_close_threshold: parse_opt("AUTO_CLOSE_THRESHOLD")?,
            close_window_secs: parse_or("CLOSE_WINDOW_SECS", 7200)?,
            stale_order_hours: parse_opt("STALE_ORDER_HOURS")?,
            catalog_seed: env::var("CATALOG_SEED").ok().filter(|p| !p.is_empty()),
        })
    }

    /// Engine settings derived from this configuration.
    pub fn shop_config(&self) -> ShopConfig {
        ShopConfig {
            cart_ttl_ms: self.cart_ttl_secs * MILLIS_PER_SECOND,
            auto_close_threshold: self.auto_close_threshold,
            close_window_ms: self.close_window_secs * MILLIS_PER_SECOND,
            stale_order_after_ms: self
                .stale_order_hours
                .map(|hours| hours * 60 * 60 * MILLIS_PER_SECOND),
        }
    }

    /// Time between two sweeper passes.
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs.max(1))
    }
}

fn parse_or<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    Ok(parse_opt(name)?.unwrap_or(default))
}

fn parse_opt<T: FromStr>(name: &'static str) -> Result<Option<T>, ConfigError> {
    match env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue(name)),
        _ => Ok(None),
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("DATABASE_URL environment variable is required")]
    MissingDatabaseUrl,

    #[error("Invalid PORT value")]
    InvalidPort,

    #[error("Invalid value for {0}")]
    InvalidValue(&'static str),
}
