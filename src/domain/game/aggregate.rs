//! Game aggregate entity.
//!
//! A game is one two-player tic-tac-toe session. Stores own every `Game`
//! instance and only mutate it while holding that game's lock; callers
//! only ever see [`GameSnapshot`] copies.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{GameId, StateMachine, Timestamp, UserId};

use super::board::{Board, Coordinate, Mark};
use super::errors::GameRejection;
use super::rules::{detect_winner, is_draw};
use super::snapshot::{GameSnapshot, LobbyEntry};
use super::status::GameStatus;

/// What a legal move did to the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    /// Turn passed to the opponent.
    Continued,
    /// The mover completed a line.
    Won(Mark),
    /// The board filled up without a line.
    Drawn,
}

/// Game aggregate.
///
/// # Invariants
///
/// - `id` never changes after creation
/// - a marked cell is never overwritten
/// - `turn` is one of the seated players while the game is not finished
/// - `finished` goes from false to true once and stays there
/// - `winner` is only set together with `finished`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Game {
    id: GameId,
    player_x: UserId,
    player_o: Option<UserId>,
    turn: UserId,
    board: Board,
    finished: bool,
    winner: Option<UserId>,
    updated_at: Timestamp,
}

impl Game {
    /// Create a game with `creator` seated as X and holding the turn.
    pub fn new(id: GameId, creator: UserId, now: Timestamp) -> Self {
        Self {
            id,
            turn: creator.clone(),
            player_x: creator,
            player_o: None,
            board: Board::new(),
            finished: false,
            winner: None,
            updated_at: now,
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────────────────────

    pub fn id(&self) -> &GameId {
        &self.id
    }

    pub fn player_x(&self) -> &UserId {
        &self.player_x
    }

    pub fn player_o(&self) -> Option<&UserId> {
        self.player_o.as_ref()
    }

    /// Returns the player expected to move next.
    pub fn turn(&self) -> &UserId {
        &self.turn
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn winner(&self) -> Option<&UserId> {
        self.winner.as_ref()
    }

    pub fn updated_at(&self) -> &Timestamp {
        &self.updated_at
    }

    /// Derives the lifecycle status from the fields.
    pub fn status(&self) -> GameStatus {
        if self.finished {
            GameStatus::Finished
        } else if self.player_o.is_none() {
            GameStatus::AwaitingOpponent
        } else {
            GameStatus::InProgress
        }
    }

    /// True while the game is listed in the lobby.
    pub fn is_open(&self) -> bool {
        self.status() == GameStatus::AwaitingOpponent
    }

    /// Seated players, X first.
    pub fn participants(&self) -> impl Iterator<Item = &UserId> {
        std::iter::once(&self.player_x).chain(self.player_o.as_ref())
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

    /// True if `updated_at` lies strictly before `cutoff`.
    pub fn is_idle_since(&self, cutoff: &Timestamp) -> bool {
        self.updated_at.is_before(cutoff)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Mutations
    // ─────────────────────────────────────────────────────────────────────────

    /// Seat `user` as O and hand the first move to `first_mover`.
    ///
    /// The caller decides `first_mover`; stores flip a fair coin.
    ///
    /// # Errors
    ///
    /// - `GameFull` if O is already seated or the game is over
    pub fn join(
        &mut self,
        user: UserId,
        first_mover: Mark,
        now: Timestamp,
    ) -> Result<(), GameRejection> {
        self.status()
            .transition_to(GameStatus::InProgress)
            .map_err(|_| GameRejection::GameFull(self.id.clone()))?;

        self.turn = match first_mover {
            Mark::X => self.player_x.clone(),
            Mark::O => user.clone(),
        };
        self.player_o = Some(user);
        self.updated_at = now;
        Ok(())
    }

    /// Play `user`'s mark at the cell named by `label`.
    ///
    /// On rejection the game is left exactly as it was.
    ///
    /// # Errors
    ///
    /// - `NotYourTurn` if the game is not in progress or `user` does not
    ///   hold the turn
    /// - `IllegalMove` if `label` is not a cell or the cell is taken
    pub fn apply_move(
        &mut self,
        user: &UserId,
        label: &str,
        now: Timestamp,
    ) -> Result<MoveOutcome, GameRejection> {
        if self.status() != GameStatus::InProgress || &self.turn != user {
            return Err(GameRejection::NotYourTurn);
        }

        let at = Coordinate::decode(label)
            .ok_or_else(|| GameRejection::illegal_move(format!("unknown cell '{}'", label)))?;
        let mark = if user == &self.player_x { Mark::X } else { Mark::O };
        if !self.board.place(at, mark) {
            return Err(GameRejection::illegal_move(format!("cell {} is already taken", at)));
        }
        self.updated_at = now;

        if detect_winner(&self.board).is_some() {
            self.finished = true;
            self.winner = Some(user.clone());
            return Ok(MoveOutcome::Won(mark));
        }
        if is_draw(&self.board) {
            self.finished = true;
            return Ok(MoveOutcome::Drawn);
        }

        if let Some(next) = self.opponent_of(user).cloned() {
            self.turn = next;
        }
        Ok(MoveOutcome::Continued)
    }

    fn opponent_of(&self, user: &UserId) -> Option<&UserId> {
        if user == &self.player_x {
            self.player_o.as_ref()
        } else {
            Some(&self.player_x)
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Views
    // ─────────────────────────────────────────────────────────────────────────

    /// Immutable copy handed back to callers.
    pub fn snapshot(&self) -> GameSnapshot {
        GameSnapshot {
            id: self.id.clone(),
            player_x: self.player_x.clone(),
            player_o: self.player_o.clone(),
            turn: self.turn.clone(),
            board: self.board,
            finished: self.finished,
            winner: self.winner.clone(),
            updated_at: self.updated_at,
            status: self.status(),
        }
    }

    pub fn lobby_entry(&self) -> LobbyEntry {
        LobbyEntry {
            game_id: self.id.clone(),
            host: self.player_x.clone(),
            waiting_since: self.updated_at,
        }
    }
}
