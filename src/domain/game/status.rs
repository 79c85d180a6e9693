//! Game lifecycle status.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::StateMachine;

/// Lifecycle status of a game, derived from its fields.
///
/// ```text
/// AwaitingOpponent --join--> InProgress --win/draw--> Finished
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameStatus {
    /// Created, waiting for a second player.
    AwaitingOpponent,
    /// Both seats taken, moves being played.
    InProgress,
    /// Won or drawn; accepts no further moves.
    Finished,
}

impl GameStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            GameStatus::AwaitingOpponent => "awaiting_opponent",
            GameStatus::InProgress => "in_progress",
            GameStatus::Finished => "finished",
        }
    }
}

impl fmt::Display for GameStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl StateMachine for GameStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        use GameStatus::*;
        matches!(
            (self, target),
            (AwaitingOpponent, InProgress) | (InProgress, Finished)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use GameStatus::*;
        match self {
            AwaitingOpponent => vec![InProgress],
            InProgress => vec![Finished],
            Finished => vec![],
        }
    }
}
