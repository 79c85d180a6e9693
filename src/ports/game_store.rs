//! Game store port - the four operations every backend provides.
//!
//! Implementations can keep games in process memory (single server) or
//! in Redis (several servers sharing one store). Both must be safe to
//! call from any number of tasks at once.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::foundation::{ErrorCode, GameId, UserId};
use crate::domain::game::{GameRejection, GameSnapshot, LobbyEntry};

/// Port for game session storage.
///
/// Every operation is atomic: no other caller ever observes a game halfway
/// through a mutation. Operations on the same game are totally ordered;
/// operations on different games are not ordered relative to each other.
#[async_trait]
pub trait GameStore: Send + Sync {
    /// Create a game with `user` seated as X.
    ///
    /// The user index is pointed at the new game even if the user was
    /// already in another one; the older game is left for eviction.
    async fn create_game(&self, user: &UserId) -> Result<GameSnapshot, GameStoreError>;

    /// List games waiting for an opponent, oldest first.
    ///
    /// Each entry was open at some instant during the call; the list as a
    /// whole is not a single consistent point in time.
    async fn list_open_games(&self, user: &UserId) -> Result<Vec<LobbyEntry>, GameStoreError>;

    /// Seat `user` as O in `game_id` and flip a fair coin for the first move.
    ///
    /// # Errors
    ///
    /// - `GameNotFound`, `GameFull`, `Busy` rejections
    async fn join_game(
        &self,
        user: &UserId,
        game_id: &GameId,
    ) -> Result<GameSnapshot, GameStoreError>;

    /// Play `coordinate` in the caller's current game.
    ///
    /// A move that ends the game still returns the final snapshot.
    ///
    /// # Errors
    ///
    /// - `NotInGame`, `GameNotFound`, `NotYourTurn`, `IllegalMove`, `Busy`
    ///   rejections
    async fn apply_move(
        &self,
        user: &UserId,
        coordinate: &str,
    ) -> Result<GameSnapshot, GameStoreError>;
}

/// Errors returned by game store operations.
#[derive(Debug, Clone, Error)]
pub enum GameStoreError {
    /// The operation was refused; the game is unchanged.
    #[error(transparent)]
    Rejected(#[from] GameRejection),

    /// Backend unreachable or a command ran past its deadline.
    #[error("game store unavailable: {0}")]
    Unavailable(String),

    /// A stored record could not be decoded.
    #[error("corrupted record for game {game_id}: {reason}")]
    Corrupted { game_id: GameId, reason: String },
}

impl GameStoreError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        GameStoreError::Unavailable(message.into())
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            GameStoreError::Rejected(rejection) => rejection.code(),
            GameStoreError::Unavailable(_) => ErrorCode::StoreUnavailable,
            GameStoreError::Corrupted { .. } => ErrorCode::CorruptedRecord,
        }
    }

    /// Returns the rejection, if this is one.
    pub fn rejection(&self) -> Option<&GameRejection> {
        match self {
            GameStoreError::Rejected(rejection) => Some(rejection),
            _ => None,
        }
    }

    /// True for outcomes the user may simply retry.
    pub fn is_retryable(&self) -> bool {
        match self {
            GameStoreError::Rejected(rejection) => rejection.is_retryable(),
            GameStoreError::Unavailable(_) => true,
            GameStoreError::Corrupted { .. } => false,
        }
    }
}
