//! UseCase layer errors.

use thiserror::Error;

use crate::domain::ValueObjectError;

/// Reasons a connection attempt is refused before the upgrade.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("missing token")]
    MissingToken,

    #[error("invalid token: {0}")]
    InvalidToken(String),

    #[error("token expired")]
    Expired,

    #[error("user '{0}' not found")]
    UserNotFound(String),

    #[error("token subject '{subject}' does not match user '{claimed}'")]
    IdentityMismatch { claimed: String, subject: String },

    #[error("invalid user id: {0}")]
    InvalidUserId(ValueObjectError),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignalError {
    #[error("user '{0}' cannot signal themself")]
    SelfSignal(String),

    #[error("room '{actual}' does not match the pair room '{expected}'")]
    RoomMismatch { expected: String, actual: String },

    #[error("failed to encode event: {0}")]
    Encode(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RelayError {
    #[error("user '{user}' is not a member of room '{room}'")]
    NotAMember { user: String, room: String },

    #[error("failed to encode event: {0}")]
    Encode(String),
}
