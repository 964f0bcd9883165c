//! # Freaky Friday Client
//!
//! Client-side game logic for Freaky Friday, a turn-based party card game in
//! the style of "fill in the blank" games. A shared display device runs the
//! table; each player's client keeps a hand of answer cards, submits answers
//! to the round's prompt and, when it is their turn, judges the round.
//!
//! The crate is split the same way the protocol is:
//!
//! - [`protocol`]: tagged JSON messages in both directions
//! - [`state`]: a pure reducer from server events to a [`GameView`]
//! - [`validator`]: checks on local actions before anything is sent
//! - [`transport`]: the narrow channel to the device, with
//!   [`transports::ChannelTransport`] and (feature `transport-websocket`)
//!   [`transports::WebSocketTransport`]
//! - [`client`]: an async actor tying the above together
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use freaky_friday_client::{ClientEvent, GameClient, GameClientConfig};
//! use freaky_friday_client::transports::channel_pair;
//!
//! # async fn run() -> freaky_friday_client::Result<()> {
//! let (transport, _device) = channel_pair();
//! let (client, mut events) =
//!     GameClient::start(transport, GameClientConfig::new().with_player_name("Alice"));
//!
//! while let Some(event) = events.recv().await {
//!     match event {
//!         ClientEvent::ViewChanged(view) => {
//!             if let Some(hint) = view.submit_hint() {
//!                 println!("{hint}");
//!             }
//!         }
//!         ClientEvent::Disconnected { .. } => break,
//!         _ => {}
//!     }
//! }
//! # drop(client);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod diagnostic;
pub mod error;
pub mod error_codes;
pub mod event;
pub mod model;
pub mod protocol;
pub mod state;
pub mod transport;
pub mod transports;
pub mod validator;

pub use client::{GameClient, GameClientConfig};
pub use diagnostic::Diagnostic;
pub use error::{DecodeError, GameClientError, Result};
pub use error_codes::ServerErrorCode;
pub use event::ClientEvent;
pub use model::{Card, CardId, PlayerId, Response};
pub use protocol::{ClientMessage, ServerEvent, ServerMessage, GAME_NAMESPACE};
pub use state::{GameStore, GameView, RoundPhase, SubmitHint};
pub use transport::Transport;
pub use transports::{channel_pair, ChannelTransport};
#[cfg(feature = "transport-websocket")]
pub use transports::WebSocketTransport;
pub use validator::Rejection;
