//! Read-only views of a game handed to callers.

use serde::Serialize;

use crate::domain::foundation::{GameId, Timestamp, UserId};

use super::board::{Board, Coordinate, Mark};
use super::rules::open_coordinates;
use super::status::GameStatus;

/// Immutable copy of a game taken right after a store operation.
///
/// Renderers read it; nothing writes it back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GameSnapshot {
    pub id: GameId,
    pub player_x: UserId,
    pub player_o: Option<UserId>,
    pub turn: UserId,
    pub board: Board,
    pub finished: bool,
    pub winner: Option<UserId>,
    pub updated_at: Timestamp,
    pub status: GameStatus,
}

impl GameSnapshot {
    /// Cells still available for a move, in label order.
    ///
    /// Empty once the game is finished, so a move menu built from it
    /// disappears with the last move.
    pub fn open_coordinates(&self) -> Vec<Coordinate> {
        open_coordinates(&self.board, self.finished)
    }

    /// Returns the mark a user plays with, if seated.
    pub fn mark_of(&self, user: &UserId) -> Option<Mark> {
        if user == &self.player_x {
            Some(Mark::X)
        } else if self.player_o.as_ref() == Some(user) {
            Some(Mark::O)
        } else {
            None
        }
    }

    pub fn is_draw(&self) -> bool {
        self.finished && self.winner.is_none()
    }
}

/// One joinable game in a lobby listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LobbyEntry {
    pub game_id: GameId,
    /// Creator, waiting as X.
    pub host: UserId,
    pub waiting_since: Timestamp,
}
