//! Error types for the swapHere client.

use thiserror::Error;

/// Client-specific errors
#[derive(Debug, Error)]
pub enum ClientError {
    /// The relay refused the credential (401). Reconnecting cannot help.
    #[error("Authentication rejected: {0}")]
    AuthRejected(String),

    /// Connecting to the relay failed
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// An established connection dropped
    #[error("Connection lost: {0}")]
    ConnectionLost(String),
}
