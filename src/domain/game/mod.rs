//! Game domain module.
//!
//! The board and its rules, the `Game` aggregate with its turn state
//! machine, and the snapshots and rejections stores hand back.

mod aggregate;
mod board;
mod errors;
mod rules;
mod snapshot;
mod status;

pub use aggregate::{Game, MoveOutcome};
pub use board::{Board, Coordinate, Mark, BOARD_SIZE};
pub use errors::GameRejection;
pub use rules::{detect_winner, is_draw, open_coordinates};
pub use snapshot::{GameSnapshot, LobbyEntry};
pub use status::GameStatus;
