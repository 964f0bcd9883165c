//! Error types for the Freaky Friday client.

use thiserror::Error;

use crate::validator::Rejection;

/// Errors that can occur when using the game client.
#[derive(Debug, Error)]
pub enum GameClientError {
    /// Failed to send a message through the transport.
    #[error("transport send error: {0}")]
    TransportSend(String),

    /// Failed to receive a message from the transport.
    #[error("transport receive error: {0}")]
    TransportReceive(String),

    /// The transport connection was closed.
    #[error("transport connection closed")]
    TransportClosed,

    /// Failed to serialize an outgoing message.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// There is no active channel to the game server.
    #[error("not connected to game server")]
    NotConnected,

    /// A local action was refused by the validator and nothing was sent.
    #[error("action rejected: {0}")]
    Rejected(#[from] Rejection),

    /// An operation timed out.
    #[error("operation timed out")]
    Timeout,

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A single inbound message that could not be turned into an event.
///
/// Decode errors are scoped to one message; the channel and the game state
/// are unaffected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// The payload was not valid JSON.
    #[error("malformed message: {reason}")]
    Malformed { reason: String },

    /// The `type` tag was recognised but its fields were missing or invalid.
    #[error("invalid `{message_type}` message: {reason}")]
    InvalidPayload {
        message_type: String,
        reason: String,
    },
}

/// A specialized [`Result`] type for game client operations.
pub type Result<T> = std::result::Result<T, GameClientError>;
