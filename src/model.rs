//! Card and response value types.
//!
//! These are the immutable values the server hands out: cards in the local
//! player's hand and the bundled submissions a judge chooses between. Field
//! names on the wire are `ID`/`text` for cards and `submitter`/`cards` for
//! responses.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Server-assigned player number.
///
/// Kept signed because the server is able to send negative numbers, which are
/// recorded as protocol violations rather than rejected.
pub type PlayerId = i32;

/// Server-assigned card number, unique within a hand or round.
pub type CardId = i32;

/// A single playable card.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Card {
    #[serde(rename = "ID")]
    pub id: CardId,
    pub text: String,
}

impl Card {
    pub fn new(id: CardId, text: impl Into<String>) -> Self {
        Self {
            id,
            text: text.into(),
        }
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// One player's full submission for the current prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    /// The player who submitted these cards.
    #[serde(rename = "submitter")]
    pub submitter_id: PlayerId,
    /// Submitted cards, in the order the player chose them.
    pub cards: Vec<Card>,
}

impl Response {
    pub fn new(submitter_id: PlayerId, cards: Vec<Card>) -> Self {
        Self {
            submitter_id,
            cards,
        }
    }

    /// Card ids in submission order, as echoed back in `submissionRead`.
    pub fn card_ids(&self) -> Vec<CardId> {
        self.cards.iter().map(|card| card.id).collect()
    }
}

impl fmt::Display for Response {
    /// Cards joined by newlines, the way a judge reads them out.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, card) in self.cards.iter().enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }
            write!(f, "{card}")?;
        }
        Ok(())
    }
}
