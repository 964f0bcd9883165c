//! Non-fatal problems surfaced to the presentation layer.
//!
//! Nothing in the client is fatal. Bad input from the server, server-side
//! error codes and sends without an active channel are all reported here and
//! processing carries on; the next `gameSync` repairs any drift.

use thiserror::Error;

use crate::error::DecodeError;
use crate::error_codes::ServerErrorCode;
use crate::model::PlayerId;

/// A diagnostic emitted while processing messages or commands.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Diagnostic {
    /// An inbound message could not be decoded. State was left untouched.
    #[error("could not read a message from the server: {0}")]
    Decode(#[from] DecodeError),

    /// The server assigned a negative player id. The id is kept anyway.
    #[error("received a negative player id ({0})")]
    NegativePlayerId(PlayerId),

    /// The server reported an error for the last command.
    #[error("{0}")]
    Server(ServerErrorCode),

    /// An outgoing message was dropped because no channel is active.
    #[error("dropped `{message_type}` message: {reason}")]
    TransportUnavailable {
        message_type: &'static str,
        reason: String,
    },
}

impl Diagnostic {
    /// Whether this diagnostic is meant to be shown to the player rather than
    /// only logged.
    ///
    /// A broken `gameSync` or `judgeSubmissions` is shown: the player's hand or
    /// the judge's choices are now stale. Other decode failures are only logged.
    pub fn is_user_facing(&self) -> bool {
        match self {
            Self::Server(_) | Self::NegativePlayerId(_) => true,
            Self::Decode(DecodeError::InvalidPayload { message_type, .. }) => {
                matches!(message_type.as_str(), "gameSync" | "judgeSubmissions")
            }
            Self::Decode(DecodeError::Malformed { .. }) | Self::TransportUnavailable { .. } => {
                false
            }
        }
    }

    /// Short text for the player, for diagnostics that are user-facing.
    pub fn user_message(&self) -> Option<&'static str> {
        match self {
            Self::Server(code) => Some(code.description()),
            Self::NegativePlayerId(_) => Some("Something went wrong while joining the game."),
            Self::Decode(DecodeError::InvalidPayload { message_type, .. }) => {
                match message_type.as_str() {
                    "gameSync" => Some("Couldn't get your updated hand from the server."),
                    "judgeSubmissions" => {
                        Some("There was a problem getting everyone's responses from the server.")
                    }
                    _ => None,
                }
            }
            Self::Decode(DecodeError::Malformed { .. }) | Self::TransportUnavailable { .. } => {
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_diagnostic_displays_code_description() {
        let diagnostic = Diagnostic::Server(ServerErrorCode::InsufficientPlayers);
        assert_eq!(
            diagnostic.to_string(),
            "There aren't enough players to start the round yet."
        );
        assert!(diagnostic.is_user_facing());
    }

    #[test]
    fn broken_hand_and_submissions_are_shown_to_the_player() {
        let hand = Diagnostic::Decode(DecodeError::InvalidPayload {
            message_type: "gameSync".into(),
            reason: "missing field `player`".into(),
        });
        assert!(hand.is_user_facing());
        assert_eq!(
            hand.user_message(),
            Some("Couldn't get your updated hand from the server.")
        );

        let submissions = Diagnostic::Decode(DecodeError::InvalidPayload {
            message_type: "judgeSubmissions".into(),
            reason: "missing field `responses`".into(),
        });
        assert!(submissions.is_user_facing());
        assert_eq!(
            submissions.user_message(),
            Some("There was a problem getting everyone's responses from the server.")
        );
    }

    #[test]
    fn other_decode_failures_are_log_only() {
        let round = Diagnostic::Decode(DecodeError::InvalidPayload {
            message_type: "roundStarted".into(),
            reason: "missing field `prompt`".into(),
        });
        assert!(!round.is_user_facing());
        assert_eq!(round.user_message(), None);

        let garbage = Diagnostic::Decode(DecodeError::Malformed {
            reason: "expected value".into(),
        });
        assert!(!garbage.is_user_facing());
    }

    #[test]
    fn transport_diagnostic_is_log_only() {
        let diagnostic = Diagnostic::TransportUnavailable {
            message_type: "leave",
            reason: "not connected to game server".into(),
        };
        assert!(!diagnostic.is_user_facing());
        assert!(diagnostic.to_string().contains("`leave`"));
    }
}
