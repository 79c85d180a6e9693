//! XO Backend - Turn-based tic-tac-toe game store
//!
//! This crate keeps two-player game sessions behind a `GameStore` port with
//! an in-memory backend for single servers and a Redis backend, guarded by a
//! per-game distributed lock, for several servers sharing one store.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
pub mod telemetry;
