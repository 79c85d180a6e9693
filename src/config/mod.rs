//! Application configuration module
//!
//! This module provides type-safe configuration loading from environment variables
//! using the `config` and `dotenvy` crates. Configuration is loaded with the
//! `XO_` prefix and nested values use double underscores as separators.
//!
//! # Example
//!
//! ```no_run
//! use xo_backend::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Game store backend: {:?}", config.store.backend);
//! ```

mod error;
mod logging;
mod redis;
mod store;

pub use error::{ConfigError, ValidationError};
pub use logging::LoggingConfig;
pub use redis::RedisConfig;
pub use store::{StoreBackend, StoreConfig, MAX_SESSION_TTL_SECS};

use serde::Deserialize;

/// Root application configuration
///
/// Every section has defaults, so an empty environment yields a valid
/// in-memory setup. Load using [`AppConfig::load()`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Game store selection and timings
    #[serde(default)]
    pub store: StoreConfig,

    /// Redis connection (only read for the Redis backend)
    #[serde(default)]
    pub redis: RedisConfig,

    /// Log filter and format
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `XO` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Deserializes into typed configuration structs
    ///
    /// # Environment Variable Format
    ///
    /// - `XO__STORE__BACKEND=redis` -> `store.backend = redis`
    /// - `XO__REDIS__URL=...` -> `redis.url = ...`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if values cannot be parsed into expected types.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(config::Environment::default().prefix("XO").separator("__"))
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Load and validate in one step; the usual startup path.
    pub fn load_validated() -> Result<Self, ConfigError> {
        let config = Self::load()?;
        config.validate()?;
        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// The Redis section is only checked when the Redis backend is selected.
    /// A locked join or move makes two Redis round trips (read, then write),
    /// so the lock lease must outlast two command timeouts.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.store.validate()?;
        if self.store.backend == StoreBackend::Redis {
            self.redis.validate()?;
            let round_trips = self.redis.timeout().checked_mul(2);
            if round_trips.map_or(true, |limit| self.store.lock_ttl() <= limit) {
                return Err(ValidationError::LockShorterThanCommands);
            }
        }
        self.logging.validate()?;
        Ok(())
    }
}
