//! Foundation module - Shared domain primitives.
//!
//! Identifiers, timestamps, error codes and the state machine trait
//! that the game domain is built from.

mod errors;
mod ids;
mod state_machine;
mod timestamp;

pub use errors::{ErrorCode, ValidationError};
pub use ids::{GameId, UserId};
pub use state_machine::StateMachine;
pub use timestamp::Timestamp;
