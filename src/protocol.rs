//! Wire protocol for the Freaky Friday game channel.
//!
//! Every message is a flat JSON object tagged by a `type` field, e.g.
//! `{"type":"join","name":"Alice"}`. Tags and field names are fixed by the
//! receiver app running on the display device and must match exactly.
//!
//! Outgoing messages are [`ClientMessage`]s and are produced with [`encode`].
//! Incoming text goes through [`decode`], which parses it into the wire enum
//! [`ServerMessage`] and lifts it into a typed [`ServerEvent`]. Decoding is
//! stateless and each message is handled in isolation: a broken payload
//! yields a [`DecodeError`] for that message only.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::DecodeError;
use crate::error_codes::ServerErrorCode;
use crate::model::{Card, CardId, PlayerId, Response};

/// Cast namespace the receiver app listens on.
pub const GAME_NAMESPACE: &str = "urn:x-cast:com.jelleslaats.freakyfriday";

// ── Outgoing ────────────────────────────────────────────────────────

/// Message types sent from the client to the game server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientMessage {
    /// Join the game under a display name.
    #[serde(rename = "join")]
    Join { name: String },
    /// Leave the game. No reply is expected.
    #[serde(rename = "leave")]
    Leave,
    /// Change the display name.
    #[serde(rename = "updateSettings")]
    UpdateSettings { name: String },
    /// Play cards for the current prompt, in selection order.
    #[serde(rename = "playSubmission")]
    SubmitResponse {
        #[serde(rename = "cardIDs")]
        card_ids: Vec<CardId>,
    },
    /// The judge's pick for the round.
    #[serde(rename = "submissionsJudged")]
    DeclareWinner {
        #[serde(rename = "winningPlayerID")]
        winner_id: PlayerId,
    },
    /// Acknowledge that a submission has been shown to the judge.
    #[serde(rename = "submissionRead")]
    ReadSubmission {
        #[serde(rename = "cardIDs")]
        card_ids: Vec<CardId>,
    },
    /// Ask the server to deal the next round.
    #[serde(rename = "nextRound")]
    StartNextRound,
}

impl ClientMessage {
    /// The wire `type` tag of this message.
    pub fn message_type(&self) -> &'static str {
        match self {
            Self::Join { .. } => "join",
            Self::Leave => "leave",
            Self::UpdateSettings { .. } => "updateSettings",
            Self::SubmitResponse { .. } => "playSubmission",
            Self::DeclareWinner { .. } => "submissionsJudged",
            Self::ReadSubmission { .. } => "submissionRead",
            Self::StartNextRound => "nextRound",
        }
    }
}

// ── Incoming ────────────────────────────────────────────────────────

/// The local player as described by a `gameSync` message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerPayload {
    #[serde(rename = "ID")]
    pub id: PlayerId,
    pub hand: Vec<Card>,
}

/// Message types sent from the game server to the client, as they appear on
/// the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerMessage {
    /// The player is queued and will join at the next round.
    #[serde(rename = "didQueue")]
    DidQueue,
    /// The player joined and was assigned a number.
    #[serde(rename = "didJoin")]
    DidJoin { number: PlayerId },
    /// Submissions are closed and the judge is deciding.
    #[serde(rename = "judging")]
    Judging,
    /// Full resynchronisation of the local player and the current judge.
    #[serde(rename = "gameSync")]
    GameSync {
        player: PlayerPayload,
        judge: PlayerId,
    },
    /// Every submission for the round, sent to the judge.
    #[serde(rename = "judgeSubmissions")]
    JudgeSubmissions { responses: Vec<Response> },
    /// A new prompt has been dealt.
    #[serde(rename = "roundStarted")]
    RoundStarted {
        prompt: String,
        #[serde(rename = "numOfBlanks")]
        num_of_blanks: u32,
    },
    /// The round is over.
    #[serde(rename = "roundEnded")]
    RoundEnded,
    /// Outcome of the last command; zero means success.
    #[serde(rename = "response")]
    CommandResult { code: i32 },
}

impl ServerMessage {
    /// Every `type` tag the server is known to send.
    pub const TAGS: &'static [&'static str] = &[
        "didQueue",
        "didJoin",
        "judging",
        "gameSync",
        "judgeSubmissions",
        "roundStarted",
        "roundEnded",
        "response",
    ];
}

/// A decoded, typed server event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerEvent {
    /// Joined the queue; play begins with the next round.
    PlayerQueued,
    /// The server assigned this client a player id.
    PlayerJoined { id: PlayerId },
    /// The round moved into judging.
    JudgeModeStarted,
    /// Authoritative copy of this player's hand and the current judge.
    GameSync {
        player_id: PlayerId,
        hand: Vec<Card>,
        judge_id: PlayerId,
    },
    /// Submissions for the judge to choose from, in arrival order.
    JudgeResponses { responses: Vec<Response> },
    /// A new round began.
    RoundStarted { prompt: String, blank_count: usize },
    /// The round ended.
    RoundEnded,
    /// The server rejected the last command.
    ServerError { code: ServerErrorCode },
    /// The server accepted the last command.
    Acknowledged,
    /// A message without a recognised `type` tag. Ignored by the state store.
    Unknown { raw: String },
}

impl From<ServerMessage> for ServerEvent {
    fn from(msg: ServerMessage) -> Self {
        match msg {
            ServerMessage::DidQueue => Self::PlayerQueued,
            ServerMessage::DidJoin { number } => Self::PlayerJoined { id: number },
            ServerMessage::Judging => Self::JudgeModeStarted,
            ServerMessage::GameSync { player, judge } => Self::GameSync {
                player_id: player.id,
                hand: player.hand,
                judge_id: judge,
            },
            ServerMessage::JudgeSubmissions { responses } => Self::JudgeResponses { responses },
            ServerMessage::RoundStarted {
                prompt,
                num_of_blanks,
            } => Self::RoundStarted {
                prompt,
                blank_count: num_of_blanks as usize,
            },
            ServerMessage::RoundEnded => Self::RoundEnded,
            ServerMessage::CommandResult { code: 0 } => Self::Acknowledged,
            ServerMessage::CommandResult { code } => Self::ServerError {
                code: ServerErrorCode::from_code(code),
            },
        }
    }
}

// ── Codec ───────────────────────────────────────────────────────────

/// Serialize an outgoing message to its JSON text form.
///
/// # Errors
///
/// Only fails if `serde_json` fails to write, which cannot happen for the
/// plain data carried by [`ClientMessage`].
pub fn encode(msg: &ClientMessage) -> Result<String, serde_json::Error> {
    serde_json::to_string(msg)
}

/// Decode one incoming text message.
///
/// - Text that is not JSON yields [`DecodeError::Malformed`].
/// - JSON without a string `type` field, or with a tag this client does not
///   know, yields [`ServerEvent::Unknown`].
/// - A known tag whose fields are missing or mistyped yields
///   [`DecodeError::InvalidPayload`].
///
/// # Errors
///
/// See above. Errors never carry state; the next message decodes normally.
pub fn decode(raw: &str) -> Result<ServerEvent, DecodeError> {
    let value: Value = serde_json::from_str(raw).map_err(|e| {
        warn!("discarding non-JSON server message: {e}");
        DecodeError::Malformed {
            reason: e.to_string(),
        }
    })?;

    let Some(tag) = value.get("type").and_then(Value::as_str) else {
        debug!("server message has no type tag: {raw}");
        return Ok(ServerEvent::Unknown { raw: raw.to_owned() });
    };

    if !ServerMessage::TAGS.contains(&tag) {
        debug!(message_type = tag, "ignoring unrecognised server message");
        return Ok(ServerEvent::Unknown { raw: raw.to_owned() });
    }

    let message_type = tag.to_owned();
    serde_json::from_value::<ServerMessage>(value)
        .map(ServerEvent::from)
        .map_err(|e| {
            warn!(%message_type, "server message is missing an expected field: {e}");
            DecodeError::InvalidPayload {
                message_type,
                reason: e.to_string(),
            }
        })
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::indexing_slicing
)]
mod tests {
    use super::*;

    #[test]
    fn message_type_matches_serialized_tag() {
        let messages = [
            ClientMessage::Join { name: "A".into() },
            ClientMessage::Leave,
            ClientMessage::UpdateSettings { name: "B".into() },
            ClientMessage::SubmitResponse { card_ids: vec![1] },
            ClientMessage::DeclareWinner { winner_id: 2 },
            ClientMessage::ReadSubmission { card_ids: vec![3] },
            ClientMessage::StartNextRound,
        ];
        for msg in messages {
            let value: Value = serde_json::from_str(&encode(&msg).unwrap()).unwrap();
            assert_eq!(value["type"], msg.message_type());
        }
    }

    #[test]
    fn response_code_zero_is_acknowledgement() {
        let event = decode(r#"{"type":"response","code":0}"#).unwrap();
        assert_eq!(event, ServerEvent::Acknowledged);
    }

    #[test]
    fn non_object_json_is_unknown() {
        let event = decode("[1,2,3]").unwrap();
        assert!(matches!(event, ServerEvent::Unknown { .. }));
    }

    #[test]
    fn non_string_type_is_unknown() {
        let event = decode(r#"{"type":7}"#).unwrap();
        assert!(matches!(event, ServerEvent::Unknown { .. }));
    }

    #[test]
    fn negative_blank_count_is_invalid_payload() {
        let err = decode(r#"{"type":"roundStarted","prompt":"P","numOfBlanks":-1}"#).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::InvalidPayload { ref message_type, .. } if message_type == "roundStarted"
        ));
    }

    #[test]
    fn extra_fields_are_ignored() {
        let event = decode(r#"{"type":"didQueue","position":3}"#).unwrap();
        assert_eq!(event, ServerEvent::PlayerQueued);
    }
}
