//! In-memory game store for tests and single-server deployments.
//!
//! One `RwLock` guards both the game map and the user index, so every
//! mutation sees the two in step. Listing shares the lock; the three
//! mutations hold it exclusively for their whole read-modify-write.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{watch, Mutex, RwLock};
use tokio::task::JoinHandle;

use crate::domain::foundation::{GameId, Timestamp, UserId};
use crate::domain::game::{Game, GameRejection, GameSnapshot, LobbyEntry};
use crate::ports::{GameStore, GameStoreError};

use super::config::InMemoryGameStoreConfig;
use super::sweeper::{self, GameSweeper};
use super::{coin_flip, log_move, rejected};

/// Games plus the user -> current game index.
#[derive(Debug, Default)]
pub(super) struct StoreState {
    games: HashMap<GameId, Game>,
    user_games: HashMap<UserId, GameId>,
}

impl StoreState {
    fn fresh_id(&self) -> GameId {
        loop {
            let id = GameId::generate();
            if !self.games.contains_key(&id) {
                return id;
            }
        }
    }

    /// Removes games idle since before `cutoff` and the index entries
    /// that still point at them.
    pub(super) fn evict_idle(&mut self, cutoff: &Timestamp) -> Vec<Game> {
        let expired: Vec<GameId> = self
            .games
            .values()
            .filter(|game| game.is_idle_since(cutoff))
            .map(|game| game.id().clone())
            .collect();

        let mut evicted = Vec::with_capacity(expired.len());
        for id in expired {
            if let Some(game) = self.games.remove(&id) {
                for user in game.participants() {
                    if self.user_games.get(user) == Some(&id) {
                        self.user_games.remove(user);
                    }
                }
                evicted.push(game);
            }
        }
        evicted
    }
}

/// Process-local [`GameStore`].
///
/// A [`GameSweeper`] task is started with the store when a Tokio runtime
/// is available. It stops on [`shutdown`](Self::shutdown) or when the store
/// is dropped.
#[derive(Debug)]
pub struct InMemoryGameStore {
    state: Arc<RwLock<StoreState>>,
    config: InMemoryGameStoreConfig,
    shutdown: watch::Sender<bool>,
    sweeper: Mutex<Option<JoinHandle<()>>>,
}

impl InMemoryGameStore {
    /// Create a store and start its sweeper.
    pub fn new(config: InMemoryGameStoreConfig) -> Self {
        let state = Arc::new(RwLock::new(StoreState::default()));
        let (shutdown, shutdown_rx) = watch::channel(false);

        let handle = match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                let sweeper = GameSweeper::new(&state, config.clone());
                Some(runtime.spawn(sweeper.run(shutdown_rx)))
            }
            Err(_) => {
                tracing::warn!("no Tokio runtime; idle games will only be swept on demand");
                None
            }
        };

        Self {
            state,
            config,
            shutdown,
            sweeper: Mutex::new(handle),
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(InMemoryGameStoreConfig::default())
    }

    pub fn config(&self) -> &InMemoryGameStoreConfig {
        &self.config
    }

    /// Stop the sweeper and wait for it to finish.
    pub async fn shutdown(&self) {
        self.shutdown.send_replace(true);
        if let Some(handle) = self.sweeper.lock().await.take() {
            if let Err(e) = handle.await {
                tracing::warn!(error = %e, "game sweeper ended abnormally");
            }
        }
    }

    /// True while the sweeper task is alive.
    pub async fn is_sweeping(&self) -> bool {
        self.sweeper
            .lock()
            .await
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Run one sweep as if the clock read `now`; returns evictions.
    pub async fn sweep_expired(&self, now: Timestamp) -> usize {
        sweeper::sweep_once(&self.state, now, self.config.session_ttl).await
    }

    pub async fn game_count(&self) -> usize {
        self.state.read().await.games.len()
    }

    pub async fn indexed_user_count(&self) -> usize {
        self.state.read().await.user_games.len()
    }

    /// Current snapshot of a game, if it still exists.
    pub async fn snapshot_of(&self, game_id: &GameId) -> Option<GameSnapshot> {
        self.state
            .read()
            .await
            .games
            .get(game_id)
            .map(Game::snapshot)
    }
}

impl Default for InMemoryGameStore {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[async_trait]
impl GameStore for InMemoryGameStore {
    async fn create_game(&self, user: &UserId) -> Result<GameSnapshot, GameStoreError> {
        let mut state = self.state.write().await;

        let id = state.fresh_id();
        let game = Game::new(id.clone(), user.clone(), Timestamp::now());
        let snapshot = game.snapshot();

        if let Some(previous) = state.user_games.insert(user.clone(), id.clone()) {
            tracing::debug!(user_id = %user, previous_game = %previous, "user index moved to new game");
        }
        state.games.insert(id, game);

        tracing::info!(game_id = %snapshot.id, user_id = %user, "game created");
        Ok(snapshot)
    }

    async fn list_open_games(&self, user: &UserId) -> Result<Vec<LobbyEntry>, GameStoreError> {
        let state = self.state.read().await;

        let mut open: Vec<LobbyEntry> = state
            .games
            .values()
            .filter(|game| game.is_open())
            .map(Game::lobby_entry)
            .collect();
        open.sort_by(|a, b| (a.waiting_since, &a.game_id).cmp(&(b.waiting_since, &b.game_id)));

        tracing::debug!(user_id = %user, open = open.len(), "listed open games");
        Ok(open)
    }

    async fn join_game(
        &self,
        user: &UserId,
        game_id: &GameId,
    ) -> Result<GameSnapshot, GameStoreError> {
        let mut guard = self.state.write().await;
        let state = &mut *guard;

        let game = state
            .games
            .get_mut(game_id)
            .ok_or_else(|| rejected("join", user, GameRejection::GameNotFound(game_id.clone())))?;
        game.join(user.clone(), coin_flip(), Timestamp::now())
            .map_err(|r| rejected("join", user, r))?;
        let snapshot = game.snapshot();

        state.user_games.insert(user.clone(), game_id.clone());

        tracing::info!(game_id = %game_id, user_id = %user, first = %snapshot.turn, "game joined");
        Ok(snapshot)
    }

    async fn apply_move(
        &self,
        user: &UserId,
        coordinate: &str,
    ) -> Result<GameSnapshot, GameStoreError> {
        let mut guard = self.state.write().await;
        let state = &mut *guard;

        let game_id = state
            .user_games
            .get(user)
            .ok_or_else(|| rejected("move", user, GameRejection::NotInGame))?;
        let game = state
            .games
            .get_mut(game_id)
            .ok_or_else(|| rejected("move", user, GameRejection::GameNotFound(game_id.clone())))?;

        let outcome = game
            .apply_move(user, coordinate, Timestamp::now())
            .map_err(|r| rejected("move", user, r))?;
        let snapshot = game.snapshot();

        log_move(&snapshot, user, coordinate, outcome);
        Ok(snapshot)
    }
}
