//! Application handlers.
//!
//! Command handlers that orchestrate store operations.

mod game_command;

pub use game_command::{CommandOutcome, GameCommand, GameCommandError, GameCommandHandler};
