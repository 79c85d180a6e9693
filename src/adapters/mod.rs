//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `game_store` - Game session storage (in-memory, Redis)

pub mod game_store;

pub use game_store::{
    build_game_store, InMemoryGameStore, InMemoryGameStoreConfig, LockRetryPolicy,
    RedisGameStore, RedisGameStoreConfig, RedisLock,
};
