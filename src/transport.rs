//! Transport abstraction for the game channel.
//!
//! The [`Transport`] trait defines a bidirectional text message channel between
//! the client and the display device running the game. There is at most one
//! active channel; when there is none, [`send`](Transport::send) fails with
//! [`GameClientError::NotConnected`] and the client drops the message with a
//! diagnostic instead of failing.
//!
//! # Connection Setup
//!
//! Discovering the device and establishing the session are NOT part of this
//! trait. Construct a connected transport externally, then pass it to
//! `GameClient::start`.
//!
//! # Implementing a Custom Transport
//!
//! ```rust,no_run
//! use async_trait::async_trait;
//! use freaky_friday_client::error::GameClientError;
//! use freaky_friday_client::transport::Transport;
//!
//! struct MyTransport { /* ... */ }
//!
//! #[async_trait]
//! impl Transport for MyTransport {
//!     async fn send(&mut self, namespace: &str, message: String) -> Result<(), GameClientError> {
//!         // Deliver the JSON text message on `namespace`
//!         todo!()
//!     }
//!
//!     async fn recv(&mut self) -> Option<Result<String, GameClientError>> {
//!         // Receive the next JSON text message
//!         // Return None when the session has ended
//!         todo!()
//!     }
//!
//!     async fn close(&mut self) -> Result<(), GameClientError> {
//!         todo!()
//!     }
//! }
//! ```

use async_trait::async_trait;

use crate::error::GameClientError;

/// A bidirectional text message transport for the game protocol.
///
/// Each call to [`send`](Transport::send) transmits one complete JSON message.
/// Each call to [`recv`](Transport::recv) returns one complete JSON message.
///
/// # Cancel Safety
///
/// The [`recv`](Transport::recv) method **MUST** be cancel-safe because it is used
/// inside `tokio::select!`. Channel-based implementations are naturally
/// cancel-safe.
#[async_trait]
pub trait Transport: Send + 'static {
    /// Send a JSON text message on the given namespace.
    ///
    /// Single-channel transports may ignore `namespace`.
    ///
    /// # Errors
    ///
    /// Returns [`GameClientError::NotConnected`] when no channel is active, or
    /// [`GameClientError::TransportSend`] if the write failed.
    async fn send(&mut self, namespace: &str, message: String) -> Result<(), GameClientError>;

    /// Receive the next JSON text message from the game.
    ///
    /// Returns:
    /// - `Some(Ok(text))`: a complete message was received
    /// - `Some(Err(e))`: a transport error occurred
    /// - `None`: the session ended cleanly
    async fn recv(&mut self) -> Option<Result<String, GameClientError>>;

    /// Close the transport gracefully.
    ///
    /// # Errors
    ///
    /// Returns an error if the graceful shutdown fails. Implementations should
    /// still release resources.
    async fn close(&mut self) -> Result<(), GameClientError>;
}
