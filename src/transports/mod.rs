//! Transport implementations for the game channel.
//!
//! | Feature                | Transport              |
//! |------------------------|------------------------|
//! | *(always)*             | [`ChannelTransport`]   |
//! | `transport-websocket`  | [`WebSocketTransport`] |
//!
//! # Example
//!
//! ```rust,ignore
//! # async fn example() -> Result<(), freaky_friday_client::GameClientError> {
//! use freaky_friday_client::{Transport, WebSocketTransport, GAME_NAMESPACE};
//!
//! let mut ws = WebSocketTransport::connect("ws://192.168.1.20:8008/game").await?;
//! ws.send(GAME_NAMESPACE, r#"{"type":"join","name":"Alice"}"#.to_string()).await?;
//!
//! if let Some(Ok(msg)) = ws.recv().await {
//!     println!("receiver said: {msg}");
//! }
//!
//! ws.close().await?;
//! # Ok(())
//! # }
//! ```

pub mod channel;

#[cfg(feature = "transport-websocket")]
pub mod websocket;

pub use channel::{channel_pair, ChannelTransport, DeviceEnd, Envelope};

#[cfg(feature = "transport-websocket")]
pub use websocket::WebSocketTransport;
