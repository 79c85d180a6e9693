//! GameSweeper - background eviction of idle in-memory games.
//!
//! ## Configuration
//!
//! | Setting | Default | Description |
//! |---------|---------|-------------|
//! | `sweep_interval` | 60s | Time between sweeps |
//! | `session_ttl` | 30min | Idle time before a game is evicted |
//!
//! ## Shutdown
//!
//! The loop stops when the store sends `true` on its watch channel, when the
//! sender is dropped, or when the store state itself is gone.

use std::sync::{Arc, Weak};
use std::time::Duration;

use tokio::sync::{watch, RwLock};
use tokio::time::{self, Instant};

use crate::domain::foundation::Timestamp;

use super::config::InMemoryGameStoreConfig;
use super::in_memory::StoreState;

/// Background task owned by one [`InMemoryGameStore`](super::InMemoryGameStore).
///
/// Holds only a weak reference so it never keeps a dropped store alive.
pub(super) struct GameSweeper {
    state: Weak<RwLock<StoreState>>,
    config: InMemoryGameStoreConfig,
}

impl GameSweeper {
    pub(super) fn new(state: &Arc<RwLock<StoreState>>, config: InMemoryGameStoreConfig) -> Self {
        Self {
            state: Arc::downgrade(state),
            config,
        }
    }

    /// Run the sweep loop until shutdown.
    ///
    /// The first sweep happens one interval after start.
    pub(super) async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let period = self.config.sweep_interval;
        let mut interval = time::interval_at(Instant::now() + period, period);
        tracing::debug!(interval_secs = period.as_secs(), "game sweeper started");

        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }

                _ = interval.tick() => {
                    let Some(state) = self.state.upgrade() else {
                        break;
                    };
                    sweep_once(&state, Timestamp::now(), self.config.session_ttl).await;
                }
            }
        }

        tracing::debug!("game sweeper stopped");
    }
}

/// Evict every game idle for longer than `ttl` as of `now`.
pub(super) async fn sweep_once(state: &RwLock<StoreState>, now: Timestamp, ttl: Duration) -> usize {
    let cutoff = now.minus(ttl);
    let evicted = state.write().await.evict_idle(&cutoff);

    for game in &evicted {
        tracing::info!(
            game_id = %game.id(),
            idle_since = %game.updated_at().as_datetime(),
            "evicted idle game"
        );
    }
    evicted.len()
}
