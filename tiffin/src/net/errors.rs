//! Protocol error types for decoding client frames.

use thiserror::Error;

/// Errors that can occur while decoding an inbound frame
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Frame is not a valid envelope, or its data does not fit its type
    #[error("invalid message format: {0}")]
    InvalidFormat(#[from] serde_json::Error),

    /// Frame size exceeded maximum allowed
    #[error("message size {actual} exceeds maximum {max}")]
    MessageTooLarge { actual: usize, max: usize },
}

/// Result type for protocol operations
pub type Result<T> = std::result::Result<T, ProtocolError>;
