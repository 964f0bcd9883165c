//! Events delivered to the presentation layer.

use crate::diagnostic::Diagnostic;
use crate::state::GameView;

/// Everything the presentation layer needs to observe from a running client.
///
/// Received from the channel returned by `GameClient::start`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    /// The client loop started. Always the first event.
    Connected,
    /// The game view changed; carries the new snapshot.
    ViewChanged(GameView),
    /// Something went wrong that the player may need to know about.
    Diagnostic(Diagnostic),
    /// The channel ended. Always the last event.
    Disconnected {
        /// `None` when the game device closed the channel cleanly.
        reason: Option<String>,
    },
}
