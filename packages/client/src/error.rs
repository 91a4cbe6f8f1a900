//! Error types for the Chanoma client.

use thiserror::Error;

/// Client-specific errors
#[derive(Debug, Error)]
pub enum ClientError {
    /// Signaling connection error
    #[error("Connection error: {0}")]
    Connection(String),

    /// The server sent something the client could not handle
    #[error("Protocol error: {0}")]
    Protocol(String),
}
