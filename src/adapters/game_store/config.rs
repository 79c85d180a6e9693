//! Game store adapter configuration types.
//!
//! Built from [`StoreConfig`] and [`RedisConfig`] at startup, or directly
//! with the builder methods in tests.

use std::time::Duration;

use crate::config::{RedisConfig, StoreConfig};

/// Configuration for [`InMemoryGameStore`](super::InMemoryGameStore).
#[derive(Debug, Clone)]
pub struct InMemoryGameStoreConfig {
    /// Idle time after which the sweeper evicts a game.
    pub session_ttl: Duration,

    /// How often the sweeper runs.
    pub sweep_interval: Duration,
}

impl Default for InMemoryGameStoreConfig {
    fn default() -> Self {
        Self {
            session_ttl: Duration::from_secs(30 * 60),
            sweep_interval: Duration::from_secs(60),
        }
    }
}

impl InMemoryGameStoreConfig {
    pub fn with_session_ttl(mut self, ttl: Duration) -> Self {
        self.session_ttl = ttl;
        self
    }

    pub fn with_sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval;
        self
    }
}

impl From<&StoreConfig> for InMemoryGameStoreConfig {
    fn from(store: &StoreConfig) -> Self {
        Self {
            session_ttl: store.session_ttl(),
            sweep_interval: store.sweep_interval(),
        }
    }
}

/// Bounded retry policy for the per-game Redis lock.
///
/// | Setting | Default |
/// |---------|---------|
/// | `lease_ttl` | 3 s |
/// | `attempts` | 3 |
/// | `backoff` | 100 ms |
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockRetryPolicy {
    /// Lease length; a holder that vanishes is forgotten after this.
    pub lease_ttl: Duration,

    /// Total tries, the first included.
    pub attempts: u32,

    /// Fixed pause between tries.
    pub backoff: Duration,
}

impl Default for LockRetryPolicy {
    fn default() -> Self {
        Self {
            lease_ttl: Duration::from_secs(3),
            attempts: 3,
            backoff: Duration::from_millis(100),
        }
    }
}

impl LockRetryPolicy {
    pub fn with_attempts(mut self, attempts: u32) -> Self {
        self.attempts = attempts;
        self
    }

    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn with_lease_ttl(mut self, ttl: Duration) -> Self {
        self.lease_ttl = ttl;
        self
    }
}

/// Configuration for [`RedisGameStore`](super::RedisGameStore).
#[derive(Debug, Clone)]
pub struct RedisGameStoreConfig {
    /// Prefix of every key, e.g. `xo` gives `xo:game:{id}`.
    pub key_namespace: String,

    /// Expiry of game and user-index keys, refreshed on every mutation.
    pub session_ttl: Duration,

    /// Deadline for each individual Redis command.
    pub command_timeout: Duration,

    /// Fresh ids tried before `create_game` gives up.
    pub create_attempts: u32,

    pub lock: LockRetryPolicy,
}

impl Default for RedisGameStoreConfig {
    fn default() -> Self {
        Self {
            key_namespace: "xo".to_string(),
            session_ttl: Duration::from_secs(30 * 60),
            command_timeout: Duration::from_secs(1),
            create_attempts: 5,
            lock: LockRetryPolicy::default(),
        }
    }
}

impl RedisGameStoreConfig {
    pub fn from_settings(store: &StoreConfig, redis: &RedisConfig) -> Self {
        Self {
            key_namespace: redis.key_namespace.clone(),
            session_ttl: store.session_ttl(),
            command_timeout: redis.timeout(),
            lock: LockRetryPolicy {
                lease_ttl: store.lock_ttl(),
                attempts: store.lock_attempts,
                backoff: store.lock_backoff(),
            },
            ..Self::default()
        }
    }

    pub fn with_key_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.key_namespace = namespace.into();
        self
    }

    pub fn with_session_ttl(mut self, ttl: Duration) -> Self {
        self.session_ttl = ttl;
        self
    }

    pub fn with_lock(mut self, lock: LockRetryPolicy) -> Self {
        self.lock = lock;
        self
    }

    /// Session TTL in whole seconds, never below one.
    pub(super) fn session_ttl_secs(&self) -> u64 {
        self.session_ttl.as_secs().max(1)
    }
}
