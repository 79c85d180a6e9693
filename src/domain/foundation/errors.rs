//! Error types for the domain layer.

use std::fmt;
use thiserror::Error;

/// Errors that occur during value object construction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Field '{field}' cannot be empty")]
    EmptyField { field: String },

    #[error("Field '{field}' has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

impl ValidationError {
    /// Creates an empty field validation error.
    pub fn empty_field(field: impl Into<String>) -> Self {
        ValidationError::EmptyField { field: field.into() }
    }

    /// Creates an invalid format validation error.
    pub fn invalid_format(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ValidationError::InvalidFormat {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Stable error codes handed to the front end alongside a rejection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Validation errors
    ValidationFailed,
    UnknownCommand,

    // Game rejections
    GameNotFound,
    GameFull,
    NotYourTurn,
    IllegalMove,
    NotInGame,
    Busy,

    // Infrastructure errors
    StoreUnavailable,
    CorruptedRecord,
}

impl ErrorCode {
    /// Returns the wire representation of the code.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::ValidationFailed => "VALIDATION_FAILED",
            ErrorCode::UnknownCommand => "UNKNOWN_COMMAND",
            ErrorCode::GameNotFound => "GAME_NOT_FOUND",
            ErrorCode::GameFull => "GAME_FULL",
            ErrorCode::NotYourTurn => "NOT_YOUR_TURN",
            ErrorCode::IllegalMove => "ILLEGAL_MOVE",
            ErrorCode::NotInGame => "NOT_IN_GAME",
            ErrorCode::Busy => "BUSY",
            ErrorCode::StoreUnavailable => "STORE_UNAVAILABLE",
            ErrorCode::CorruptedRecord => "CORRUPTED_RECORD",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
