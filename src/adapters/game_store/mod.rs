//! Game store adapters.
//!
//! Implementations of the GameStore port for different backends.
//!
//! ## Available Adapters
//!
//! - `InMemoryGameStore` - In-memory for testing and single-server
//! - `RedisGameStore` - Redis-backed for production multi-server
//!
//! ## Usage
//!
//! ```ignore
//! use xo_backend::adapters::game_store::{build_game_store, InMemoryGameStore};
//!
//! // For testing
//! let store = InMemoryGameStore::with_defaults();
//!
//! // From configuration
//! let store = build_game_store(&AppConfig::load_validated()?).await?;
//! ```

mod config;
mod in_memory;
mod lock;
mod redis;
mod sweeper;

pub use config::{InMemoryGameStoreConfig, LockRetryPolicy, RedisGameStoreConfig};
pub use in_memory::InMemoryGameStore;
pub use lock::{LockLease, RedisLock};
pub use redis::RedisGameStore;

use std::sync::Arc;

use crate::config::{AppConfig, StoreBackend};
use crate::domain::foundation::UserId;
use crate::domain::game::{GameRejection, GameSnapshot, Mark, MoveOutcome};
use crate::ports::{GameStore, GameStoreError};

/// Build the store selected by `config.store.backend`.
///
/// Expects a validated configuration. For Redis the connection is opened
/// and pinged here, so an unreachable server fails startup.
pub async fn build_game_store(config: &AppConfig) -> Result<Arc<dyn GameStore>, GameStoreError> {
    match config.store.backend {
        StoreBackend::Memory => {
            tracing::info!(
                session_ttl_secs = config.store.session_ttl_secs,
                "using in-memory game store"
            );
            Ok(Arc::new(InMemoryGameStore::new(InMemoryGameStoreConfig::from(
                &config.store,
            ))))
        }
        StoreBackend::Redis => {
            let info = config
                .redis
                .connection_info()
                .map_err(|e| GameStoreError::unavailable(format!("invalid redis address: {e}")))?;
            let store = RedisGameStore::connect(
                info,
                RedisGameStoreConfig::from_settings(&config.store, &config.redis),
            )
            .await?;
            Ok(Arc::new(store))
        }
    }
}

/// Fair coin for the first move after a join.
fn coin_flip() -> Mark {
    if rand::random::<bool>() {
        Mark::X
    } else {
        Mark::O
    }
}

fn rejected(operation: &'static str, user: &UserId, rejection: GameRejection) -> GameStoreError {
    tracing::debug!(operation, user_id = %user, reason = %rejection, "operation rejected");
    rejection.into()
}

fn log_move(snapshot: &GameSnapshot, user: &UserId, coordinate: &str, outcome: MoveOutcome) {
    match outcome {
        MoveOutcome::Continued => {
            tracing::debug!(game_id = %snapshot.id, user_id = %user, coordinate, "move applied");
        }
        MoveOutcome::Won(mark) => {
            tracing::info!(game_id = %snapshot.id, winner = %user, %mark, "game won");
        }
        MoveOutcome::Drawn => {
            tracing::info!(game_id = %snapshot.id, "game drawn");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn default_config_builds_in_memory_store() {
        let store = build_game_store(&AppConfig::default()).await.unwrap();
        let lobby = store
            .list_open_games(&UserId::new("alice").unwrap())
            .await
            .unwrap();
        assert!(lobby.is_empty());
    }

    #[tokio::test]
    async fn unreachable_redis_fails_startup() {
        let mut config = AppConfig::default();
        config.store.backend = StoreBackend::Redis;
        config.redis.url = "redis://127.0.0.1:1/".to_string();
        config.redis.timeout_secs = 1;

        let err = build_game_store(&config).await.err().unwrap();
        assert!(matches!(err, GameStoreError::Unavailable(_)));
    }

    #[test]
    fn coin_flip_produces_both_marks() {
        let flips: Vec<Mark> = (0..200).map(|_| coin_flip()).collect();
        assert!(flips.contains(&Mark::X));
        assert!(flips.contains(&Mark::O));
    }
}
