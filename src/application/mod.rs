//! Application layer - Commands and Handlers.
//!
//! This layer turns incoming messages into store operations and hands the
//! results back for rendering.

pub mod handlers;

pub use handlers::{CommandOutcome, GameCommand, GameCommandError, GameCommandHandler};
