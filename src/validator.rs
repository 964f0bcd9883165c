//! Gatekeeping for local user actions.
//!
//! The same gesture means different things by role: a player toggles cards
//! from the hand, the judge picks one submitter. Which path applies is decided
//! by whether the local player is the judge, and each path is only open in its
//! matching phase. Rejections are returned to the caller and never reach the
//! wire.

use thiserror::Error;
use tracing::{debug, info};

use crate::model::{CardId, PlayerId};
use crate::protocol::ClientMessage;
use crate::state::{GameView, RoundPhase};

/// Why a local action was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    /// The selection does not match the prompt's blank count.
    #[error("this prompt requires exactly {expected} card(s) (you tried to play {actual})")]
    WrongCardCount { expected: usize, actual: usize },

    /// More than one submitter is selected as winner.
    #[error("you're trying to declare more than one winning card")]
    MultipleWinnersSelected,

    /// The judge tried to submit without picking a winner.
    #[error("you need to select a winner")]
    NoWinnerSelected,

    /// The card is not in the local hand.
    #[error("card {0} is not in your hand")]
    CardNotInHand(CardId),

    /// Nobody with this id submitted a response this round.
    #[error("player {0} did not submit a response this round")]
    UnknownSubmitter(PlayerId),

    /// Selection is closed in the current phase.
    #[error("nothing can be selected while {0}")]
    SelectionNotAllowed(RoundPhase),

    /// Submission is closed in the current phase.
    #[error("nothing can be submitted while {0}")]
    SubmissionNotAllowed(RoundPhase),

    /// Player names must not be blank.
    #[error("you've got to supply a name")]
    BlankName,
}

const JUDGE_DECIDING: RoundPhase = RoundPhase::Judging {
    as_judge: true,
    verdict_sent: false,
};

const PLAYER_ANSWERING: RoundPhase = RoundPhase::Answering { submitted: false };

/// Toggle `item_id` in the selection.
///
/// - Player answering: `item_id` must be a card in the hand; it is removed if
///   selected and appended otherwise. The count is not limited here.
/// - Judge deciding: `item_id` must be a submitter; it replaces any earlier pick.
///
/// # Errors
///
/// [`Rejection::CardNotInHand`] or [`Rejection::UnknownSubmitter`] for ids the
/// view does not know, [`Rejection::SelectionNotAllowed`] in any other phase.
pub fn toggle_select(view: &mut GameView, item_id: i32) -> Result<(), Rejection> {
    if view.is_judge() {
        if view.phase != JUDGE_DECIDING {
            return Err(Rejection::SelectionNotAllowed(view.phase));
        }
        if !view.has_response_from(item_id) {
            return Err(Rejection::UnknownSubmitter(item_id));
        }
        view.selection.replace(item_id);
        debug!(winner = item_id, "judge selection changed");
    } else {
        if view.phase != PLAYER_ANSWERING {
            return Err(Rejection::SelectionNotAllowed(view.phase));
        }
        if !view.hand_contains(item_id) {
            return Err(Rejection::CardNotInHand(item_id));
        }
        view.selection.toggle(item_id);
        debug!(
            card = item_id,
            selected = view.selection.len(),
            "card selection changed"
        );
    }
    Ok(())
}

/// Validate the current selection and build the command to send.
///
/// A player's submission moves the view to "submitted, waiting on others";
/// a judge's verdict closes judging for the local player. The move happens
/// here, before anything is sent. A caller whose send fails must put the
/// previous view back; `GameClient` does this.
///
/// # Errors
///
/// - Player: [`Rejection::WrongCardCount`] unless the selection size equals
///   the required count.
/// - Judge: [`Rejection::NoWinnerSelected`] or
///   [`Rejection::MultipleWinnersSelected`] unless exactly one is selected.
/// - [`Rejection::SubmissionNotAllowed`] outside the matching phase.
pub fn try_submit(view: &mut GameView) -> Result<ClientMessage, Rejection> {
    if view.is_judge() {
        if view.phase != JUDGE_DECIDING {
            return Err(Rejection::SubmissionNotAllowed(view.phase));
        }
        let winner_id = match view.selection.as_slice() {
            [winner_id] => *winner_id,
            [] => return Err(Rejection::NoWinnerSelected),
            _ => return Err(Rejection::MultipleWinnersSelected),
        };
        info!(winner_id, "declaring winner");
        view.enter_phase(RoundPhase::Judging {
            as_judge: true,
            verdict_sent: true,
        });
        Ok(ClientMessage::DeclareWinner { winner_id })
    } else {
        if view.phase != PLAYER_ANSWERING {
            return Err(Rejection::SubmissionNotAllowed(view.phase));
        }
        let expected = view.required_response_count;
        let actual = view.selection.len();
        if actual != expected {
            info!(expected, actual, "submission has the wrong number of cards");
            return Err(Rejection::WrongCardCount { expected, actual });
        }
        let card_ids = view.selection.as_slice().to_vec();
        debug!(count = card_ids.len(), "submitting cards");
        view.enter_phase(RoundPhase::Answering { submitted: true });
        Ok(ClientMessage::SubmitResponse { card_ids })
    }
}

/// Validate a join and record the chosen name.
///
/// # Errors
///
/// [`Rejection::BlankName`] if `name` is empty or whitespace.
pub fn prepare_join(view: &mut GameView, name: &str) -> Result<ClientMessage, Rejection> {
    if name.trim().is_empty() {
        return Err(Rejection::BlankName);
    }
    view.identity.name = Some(name.to_owned());
    Ok(ClientMessage::Join {
        name: name.to_owned(),
    })
}

/// Validate a rename. Returns `Ok(None)` when the name is unchanged, in which
/// case nothing needs to be sent.
///
/// # Errors
///
/// [`Rejection::BlankName`] if `name` is empty or whitespace.
pub fn prepare_rename(view: &mut GameView, name: &str) -> Result<Option<ClientMessage>, Rejection> {
    if name.trim().is_empty() {
        return Err(Rejection::BlankName);
    }
    if view.identity.name.as_deref() == Some(name) {
        return Ok(None);
    }
    view.identity.name = Some(name.to_owned());
    Ok(Some(ClientMessage::UpdateSettings {
        name: name.to_owned(),
    }))
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
    use crate::model::{Card, Response};

    fn answering(required: usize, hand: &[CardId]) -> GameView {
        GameView {
            identity: crate::state::PlayerIdentity {
                id: Some(1),
                name: None,
            },
            hand: hand.iter().map(|&id| Card::new(id, "card")).collect(),
            judge_id: Some(9),
            phase: PLAYER_ANSWERING,
            required_response_count: required,
            ..GameView::default()
        }
    }

    fn judging(submitters: &[PlayerId]) -> GameView {
        GameView {
            identity: crate::state::PlayerIdentity {
                id: Some(9),
                name: None,
            },
            judge_id: Some(9),
            phase: JUDGE_DECIDING,
            required_response_count: 1,
            responses: submitters
                .iter()
                .map(|&id| Response::new(id, vec![Card::new(id * 10, "r")]))
                .collect(),
            ..GameView::default()
        }
    }

    #[test]
    fn toggle_twice_restores_selection() {
        let mut view = answering(2, &[1, 2, 3]);
        toggle_select(&mut view, 2).unwrap();
        let before = view.selection.clone();
        toggle_select(&mut view, 3).unwrap();
        toggle_select(&mut view, 3).unwrap();
        assert_eq!(view.selection, before);
    }

    #[test]
    fn toggle_rejects_card_not_in_hand() {
        let mut view = answering(1, &[1]);
        assert_eq!(
            toggle_select(&mut view, 4),
            Err(Rejection::CardNotInHand(4))
        );
        assert!(view.selection.is_empty());
    }

    #[test]
    fn toggle_does_not_cap_selection_size() {
        let mut view = answering(1, &[1, 2, 3]);
        for id in [1, 2, 3] {
            toggle_select(&mut view, id).unwrap();
        }
        assert_eq!(view.selection.as_slice(), &[1, 2, 3]);
    }

    #[test]
    fn submit_with_wrong_count_is_rejected() {
        let mut view = answering(2, &[1, 2]);
        toggle_select(&mut view, 1).unwrap();
        assert_eq!(
            try_submit(&mut view),
            Err(Rejection::WrongCardCount {
                expected: 2,
                actual: 1
            })
        );
        assert_eq!(view.phase, PLAYER_ANSWERING);
    }

    #[test]
    fn submit_preserves_selection_order() {
        let mut view = answering(2, &[1, 2, 3]);
        toggle_select(&mut view, 3).unwrap();
        toggle_select(&mut view, 1).unwrap();
        assert_eq!(
            try_submit(&mut view),
            Ok(ClientMessage::SubmitResponse {
                card_ids: vec![3, 1]
            })
        );
        assert_eq!(view.phase, RoundPhase::Answering { submitted: true });
        assert!(matches!(
            toggle_select(&mut view, 2),
            Err(Rejection::SelectionNotAllowed(_))
        ));
        assert!(matches!(
            try_submit(&mut view),
            Err(Rejection::SubmissionNotAllowed(_))
        ));
    }

    #[test]
    fn judge_pick_replaces_previous_pick() {
        let mut view = judging(&[3, 7]);
        toggle_select(&mut view, 3).unwrap();
        toggle_select(&mut view, 7).unwrap();
        assert_eq!(view.selection.as_slice(), &[7]);
        assert_eq!(
            try_submit(&mut view),
            Ok(ClientMessage::DeclareWinner { winner_id: 7 })
        );
        assert_eq!(
            view.phase,
            RoundPhase::Judging {
                as_judge: true,
                verdict_sent: true
            }
        );
    }

    #[test]
    fn judge_submit_without_pick() {
        let mut view = judging(&[3]);
        assert_eq!(try_submit(&mut view), Err(Rejection::NoWinnerSelected));
    }

    #[test]
    fn judge_submit_with_several_picks() {
        let mut view = judging(&[3, 7]);
        view.selection.toggle(3);
        view.selection.toggle(7);
        assert_eq!(
            try_submit(&mut view),
            Err(Rejection::MultipleWinnersSelected)
        );
    }

    #[test]
    fn judge_cannot_pick_unknown_submitter() {
        let mut view = judging(&[3]);
        assert_eq!(
            toggle_select(&mut view, 4),
            Err(Rejection::UnknownSubmitter(4))
        );
    }

    #[test]
    fn idle_view_rejects_everything() {
        let mut view = GameView::default();
        assert_eq!(
            toggle_select(&mut view, 1),
            Err(Rejection::SelectionNotAllowed(RoundPhase::Idle))
        );
        assert_eq!(
            try_submit(&mut view),
            Err(Rejection::SubmissionNotAllowed(RoundPhase::Idle))
        );
    }

    #[test]
    fn blank_names_are_rejected() {
        let mut view = GameView::default();
        assert_eq!(prepare_join(&mut view, "  "), Err(Rejection::BlankName));
        assert_eq!(prepare_rename(&mut view, ""), Err(Rejection::BlankName));
        assert!(view.identity.name.is_none());
    }

    #[test]
    fn rename_to_same_name_sends_nothing() {
        let mut view = GameView::default();
        prepare_join(&mut view, "Alice").unwrap();
        assert_eq!(prepare_rename(&mut view, "Alice"), Ok(None));
        assert_eq!(
            prepare_rename(&mut view, "Bob"),
            Ok(Some(ClientMessage::UpdateSettings { name: "Bob".into() }))
        );
        assert_eq!(view.identity.name.as_deref(), Some("Bob"));
    }
}
