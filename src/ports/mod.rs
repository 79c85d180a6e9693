//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! - `GameStore` - create/list/join/move over a pluggable session store

mod game_store;

pub use game_store::{GameStore, GameStoreError};
