//! Game-specific rejection reasons.

use thiserror::Error;

use crate::domain::foundation::{ErrorCode, GameId};

/// Why a store operation refused to mutate a game.
///
/// Rejections are ordinary outcomes: the user can correct the input or
/// simply try again. None of them leave any trace on the game.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameRejection {
    #[error("game {0} not found")]
    GameNotFound(GameId),

    #[error("game {0} already has two players")]
    GameFull(GameId),

    #[error("it is not your turn")]
    NotYourTurn,

    #[error("illegal move: {0}")]
    IllegalMove(String),

    #[error("you are not in a game")]
    NotInGame,

    /// Another request holds the game; retrying shortly will usually work.
    #[error("game {0} is busy, try again")]
    Busy(GameId),
}

impl GameRejection {
    pub fn code(&self) -> ErrorCode {
        match self {
            GameRejection::GameNotFound(_) => ErrorCode::GameNotFound,
            GameRejection::GameFull(_) => ErrorCode::GameFull,
            GameRejection::NotYourTurn => ErrorCode::NotYourTurn,
            GameRejection::IllegalMove(_) => ErrorCode::IllegalMove,
            GameRejection::NotInGame => ErrorCode::NotInGame,
            GameRejection::Busy(_) => ErrorCode::Busy,
        }
    }

    /// True when the same request may succeed if simply repeated.
    pub fn is_retryable(&self) -> bool {
        matches!(self, GameRejection::Busy(_))
    }

    pub(crate) fn illegal_move(reason: impl Into<String>) -> Self {
        GameRejection::IllegalMove(reason.into())
    }
}
