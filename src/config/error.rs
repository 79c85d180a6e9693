//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid Redis URL format")]
    InvalidRedisUrl,

    #[error("Redis key namespace must be non-empty and contain no ':' or whitespace")]
    InvalidKeyNamespace,

    #[error("{0} must be greater than zero")]
    NonPositive(&'static str),

    #[error("{field} must not exceed {max}")]
    TooLarge { field: &'static str, max: u64 },

    #[error("Lock TTL must be shorter than the session TTL")]
    LockOutlivesSession,

    #[error("Lock TTL must exceed two Redis command timeouts (read plus write)")]
    LockShorterThanCommands,

    #[error("Invalid log filter: {0}")]
    InvalidLogFilter(String),
}
