//! Domain layer - game rules and the game aggregate.
//!
//! - `foundation` - ids, timestamps, error codes, state machine trait
//! - `game` - board, rules, `Game` aggregate, snapshots, rejections

pub mod foundation;
pub mod game;
