//! Game store configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Longest idle time a game may be kept: 30 days.
pub const MAX_SESSION_TTL_SECS: u64 = 30 * 24 * 60 * 60;

/// Which `GameStore` implementation to build.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Process-local map; one server only.
    #[default]
    Memory,
    /// Shared Redis instance; any number of servers.
    Redis,
}

/// Game store configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackend,

    /// Idle time after which a game is evicted
    #[serde(default = "default_session_ttl")]
    pub session_ttl_secs: u64,

    /// How often the in-memory sweeper runs
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,

    /// Lease length of the per-game Redis lock
    #[serde(default = "default_lock_ttl")]
    pub lock_ttl_ms: u64,

    /// Tries before a contended lock reports `Busy`
    #[serde(default = "default_lock_attempts")]
    pub lock_attempts: u32,

    /// Pause between lock tries
    #[serde(default = "default_lock_backoff")]
    pub lock_backoff_ms: u64,
}

impl StoreConfig {
    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    pub fn lock_ttl(&self) -> Duration {
        Duration::from_millis(self.lock_ttl_ms)
    }

    pub fn lock_backoff(&self) -> Duration {
        Duration::from_millis(self.lock_backoff_ms)
    }

    /// Validate store configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.session_ttl_secs == 0 {
            return Err(ValidationError::NonPositive("store.session_ttl_secs"));
        }
        if self.session_ttl_secs > MAX_SESSION_TTL_SECS {
            return Err(ValidationError::TooLarge {
                field: "store.session_ttl_secs",
                max: MAX_SESSION_TTL_SECS,
            });
        }
        if self.sweep_interval_secs == 0 {
            return Err(ValidationError::NonPositive("store.sweep_interval_secs"));
        }
        if self.sweep_interval_secs > MAX_SESSION_TTL_SECS {
            return Err(ValidationError::TooLarge {
                field: "store.sweep_interval_secs",
                max: MAX_SESSION_TTL_SECS,
            });
        }
        if self.lock_ttl_ms == 0 {
            return Err(ValidationError::NonPositive("store.lock_ttl_ms"));
        }
        if self.lock_attempts == 0 {
            return Err(ValidationError::NonPositive("store.lock_attempts"));
        }
        if self.lock_ttl() >= self.session_ttl() {
            return Err(ValidationError::LockOutlivesSession);
        }
        Ok(())
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            session_ttl_secs: default_session_ttl(),
            sweep_interval_secs: default_sweep_interval(),
            lock_ttl_ms: default_lock_ttl(),
            lock_attempts: default_lock_attempts(),
            lock_backoff_ms: default_lock_backoff(),
        }
    }
}

fn default_session_ttl() -> u64 {
    30 * 60
}

fn default_sweep_interval() -> u64 {
    60
}

fn default_lock_ttl() -> u64 {
    3_000
}

fn default_lock_attempts() -> u32 {
    3
}

fn default_lock_backoff() -> u64 {
    100
}
