//! The client's view of the game and the reducer that advances it.
//!
//! [`GameView`] is derived entirely from server events. [`reduce`] applies one
//! [`ServerEvent`] to a view and reports the [`Effects`] of doing so: commands
//! that must go back to the server and diagnostics for the presentation layer.
//! [`GameStore`] owns a view and is the single place where it is mutated,
//! either by events or by validated local actions.

use std::fmt;

use tracing::{debug, warn};

use crate::diagnostic::Diagnostic;
use crate::model::{Card, CardId, PlayerId, Response};
use crate::protocol::{self, ClientMessage, ServerEvent};
use crate::validator::{self, Rejection};

// ── Phase ───────────────────────────────────────────────────────────

/// Where the local player is within the round cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RoundPhase {
    /// No round is running: before joining or between rounds.
    #[default]
    Idle,
    /// Joined the queue; waiting for a round to start.
    Queued,
    /// A non-judge player is choosing cards. `submitted` is set once the
    /// selection has been sent and the player is waiting on the others.
    Answering { submitted: bool },
    /// Submissions are being judged. `as_judge` is set when the local player
    /// is the judge; `verdict_sent` once the winner has been declared.
    Judging { as_judge: bool, verdict_sent: bool },
}

impl fmt::Display for RoundPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Idle => "waiting for a round",
            Self::Queued => "queued",
            Self::Answering { submitted: false } => "answering",
            Self::Answering { submitted: true } => "waiting for other players",
            Self::Judging {
                as_judge: true,
                verdict_sent: false,
            } => "judging",
            Self::Judging { .. } => "waiting for the judge",
        };
        f.write_str(text)
    }
}

// ── Identity ────────────────────────────────────────────────────────

/// Who the local player is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlayerIdentity {
    /// Assigned by the server on `didJoin` or `gameSync`.
    pub id: Option<PlayerId>,
    /// Set locally when a join or rename is accepted.
    pub name: Option<String>,
}

// ── Selection ───────────────────────────────────────────────────────

/// Ids chosen by the local user, in the order they were picked.
///
/// While answering these are card ids from the hand; while judging it holds
/// at most one submitter id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection(Vec<i32>);

impl Selection {
    /// Remove `id` if present, otherwise append it.
    pub fn toggle(&mut self, id: i32) {
        if let Some(pos) = self.0.iter().position(|&selected| selected == id) {
            self.0.remove(pos);
        } else {
            self.0.push(id);
        }
    }

    /// Make `id` the only selected item.
    pub fn replace(&mut self, id: i32) {
        self.0.clear();
        self.0.push(id);
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn contains(&self, id: i32) -> bool {
        self.0.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[i32] {
        &self.0
    }
}

// ── View ────────────────────────────────────────────────────────────

/// Everything the client knows about the game.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GameView {
    pub identity: PlayerIdentity,
    /// Replaced wholesale on every `gameSync`, in server order.
    pub hand: Vec<Card>,
    pub judge_id: Option<PlayerId>,
    pub phase: RoundPhase,
    /// Prompt text of the running round.
    pub prompt: Option<String>,
    /// Cards to play for non-judges; always 1 for the judge.
    pub required_response_count: usize,
    /// Submissions to judge, in arrival order.
    pub responses: Vec<Response>,
    pub selection: Selection,
}

/// What the submit control should currently say.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitHint {
    /// Too few cards are selected.
    SelectMore(usize),
    /// Too many cards are selected.
    SelectFewer(usize),
    /// The selection matches the prompt.
    PlayCards(usize),
    /// The judge has exactly one winner selected.
    ChooseWinner,
    /// The judge has not picked a single winner.
    SelectWinner,
}

impl fmt::Display for SubmitHint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn plural(n: usize) -> &'static str {
            if n == 1 {
                ""
            } else {
                "s"
            }
        }
        match *self {
            Self::SelectMore(n) => write!(f, "Select {n} More Card{}", plural(n)),
            Self::SelectFewer(n) => write!(f, "Select {n} Less Card{}", plural(n)),
            Self::PlayCards(n) => write!(f, "Play {n} Card{}", plural(n)),
            Self::ChooseWinner => f.write_str("Choose Winner"),
            Self::SelectWinner => f.write_str("Select a Winner"),
        }
    }
}

impl GameView {
    /// `true` when the local player is this round's judge.
    ///
    /// An unassigned id is never the judge, even if the judge is unassigned too.
    pub fn is_judge(&self) -> bool {
        self.identity.id.is_some() && self.identity.id == self.judge_id
    }

    /// `true` when the local user may currently select items.
    pub fn can_interact(&self) -> bool {
        if self.is_judge() {
            self.phase
                == RoundPhase::Judging {
                    as_judge: true,
                    verdict_sent: false,
                }
        } else {
            self.phase == RoundPhase::Answering { submitted: false }
        }
    }

    pub fn hand_contains(&self, card_id: CardId) -> bool {
        self.hand.iter().any(|card| card.id == card_id)
    }

    pub fn has_response_from(&self, submitter_id: PlayerId) -> bool {
        self.responses
            .iter()
            .any(|response| response.submitter_id == submitter_id)
    }

    /// Label for the submit control, or `None` when nothing can be submitted.
    pub fn submit_hint(&self) -> Option<SubmitHint> {
        if !self.can_interact() {
            return None;
        }
        let selected = self.selection.len();
        if self.is_judge() {
            return Some(if selected == 1 {
                SubmitHint::ChooseWinner
            } else {
                SubmitHint::SelectWinner
            });
        }
        let required = self.required_response_count;
        Some(match selected.cmp(&required) {
            std::cmp::Ordering::Less => SubmitHint::SelectMore(required - selected),
            std::cmp::Ordering::Greater => SubmitHint::SelectFewer(selected - required),
            std::cmp::Ordering::Equal => SubmitHint::PlayCards(required),
        })
    }

    /// Move to `phase`, clearing the selection if the phase actually changes.
    pub(crate) fn enter_phase(&mut self, phase: RoundPhase) {
        if self.phase != phase {
            debug!(from = %self.phase, to = %phase, "phase transition");
            self.phase = phase;
            self.selection.clear();
        }
    }

    /// Reset performed when a round ends or a new id is assigned.
    fn end_round(&mut self) {
        self.enter_phase(RoundPhase::Idle);
        self.selection.clear();
        self.responses.clear();
        self.required_response_count = 0;
        self.prompt = None;
    }
}

// ── Reducer ─────────────────────────────────────────────────────────

/// Side effects produced by applying one event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Effects {
    /// Commands to send to the server, in order.
    pub commands: Vec<ClientMessage>,
    /// Diagnostics for the presentation layer.
    pub diagnostics: Vec<Diagnostic>,
    /// Whether the view differs from before the event.
    pub view_changed: bool,
}

/// Apply one server event to a view.
///
/// Events are applied strictly in the order given; nothing is reordered or
/// coalesced.
pub fn reduce(mut view: GameView, event: ServerEvent) -> (GameView, Effects) {
    let before = view.clone();
    let mut effects = Effects::default();

    match event {
        ServerEvent::PlayerQueued => {
            view.enter_phase(RoundPhase::Queued);
            view.selection.clear();
        }
        ServerEvent::PlayerJoined { id } => {
            if id < 0 {
                warn!(player_id = id, "server assigned a negative player id");
                effects.diagnostics.push(Diagnostic::NegativePlayerId(id));
            }
            view.identity.id = Some(id);
            view.end_round();
        }
        ServerEvent::JudgeModeStarted => {
            let as_judge = view.is_judge();
            match view.phase {
                // A judge who already holds the submissions keeps their pick.
                RoundPhase::Judging {
                    as_judge: true,
                    verdict_sent,
                } if as_judge => {
                    debug!(verdict_sent, "judging announced while already judging");
                }
                _ => view.enter_phase(RoundPhase::Judging {
                    as_judge,
                    verdict_sent: false,
                }),
            }
        }
        ServerEvent::GameSync {
            player_id,
            hand,
            judge_id,
        } => {
            debug!(player_id, judge_id, cards = hand.len(), "game sync");
            view.identity.id = Some(player_id);
            view.hand = hand;
            view.judge_id = Some(judge_id);
            view.selection.clear();
        }
        ServerEvent::JudgeResponses { responses } => {
            let as_judge = view.is_judge();
            view.enter_phase(RoundPhase::Judging {
                as_judge,
                verdict_sent: false,
            });
            view.selection.clear();
            effects.commands.extend(
                responses
                    .iter()
                    .map(|response| ClientMessage::ReadSubmission {
                        card_ids: response.card_ids(),
                    }),
            );
            debug!(count = responses.len(), as_judge, "received submissions");
            view.responses = responses;
        }
        ServerEvent::RoundStarted {
            prompt,
            blank_count,
        } => {
            if view.is_judge() {
                view.enter_phase(RoundPhase::Judging {
                    as_judge: true,
                    verdict_sent: false,
                });
                view.required_response_count = 1;
            } else {
                view.enter_phase(RoundPhase::Answering { submitted: false });
                view.required_response_count = blank_count;
            }
            view.prompt = Some(prompt);
            view.selection.clear();
            view.responses.clear();
        }
        ServerEvent::RoundEnded => view.end_round(),
        ServerEvent::ServerError { code } => {
            warn!(code = code.code(), "server reported an error: {code}");
            effects.diagnostics.push(Diagnostic::Server(code));
        }
        ServerEvent::Acknowledged => {
            debug!("server acknowledged last command");
        }
        ServerEvent::Unknown { .. } => {}
    }

    effects.view_changed = view != before;
    (view, effects)
}

// ── Store ───────────────────────────────────────────────────────────

/// Owner of the [`GameView`].
///
/// All mutation goes through [`apply`](Self::apply) for server events and the
/// action methods for local input, so the view is never partially updated.
#[derive(Debug, Clone, Default)]
pub struct GameStore {
    view: GameView,
}

impl GameStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The current view.
    pub fn view(&self) -> &GameView {
        &self.view
    }

    /// Apply a decoded server event.
    pub fn apply(&mut self, event: ServerEvent) -> Effects {
        let (view, effects) = reduce(std::mem::take(&mut self.view), event);
        self.view = view;
        effects
    }

    /// Decode raw text from the transport and apply it.
    ///
    /// Decode failures become a diagnostic and leave the view untouched.
    pub fn receive(&mut self, raw: &str) -> Effects {
        match protocol::decode(raw) {
            Ok(event) => self.apply(event),
            Err(e) => Effects {
                diagnostics: vec![Diagnostic::Decode(e)],
                ..Effects::default()
            },
        }
    }

    /// Toggle a card (answering) or pick a winner (judging).
    ///
    /// # Errors
    ///
    /// See [`validator::toggle_select`].
    pub fn toggle_select(&mut self, item_id: i32) -> Result<(), Rejection> {
        validator::toggle_select(&mut self.view, item_id)
    }

    /// Validate the selection and produce the submission command.
    ///
    /// # Errors
    ///
    /// See [`validator::try_submit`].
    pub fn try_submit(&mut self) -> Result<ClientMessage, Rejection> {
        validator::try_submit(&mut self.view)
    }

    /// Put back a view saved before a local action whose command was never
    /// delivered.
    pub(crate) fn restore(&mut self, view: GameView) {
        self.view = view;
    }

    /// Validate a join request.
    ///
    /// # Errors
    ///
    /// Returns [`Rejection::BlankName`] for an empty name.
    pub fn join(&mut self, name: &str) -> Result<ClientMessage, Rejection> {
        validator::prepare_join(&mut self.view, name)
    }

    /// Validate a rename. `Ok(None)` means the name is unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`Rejection::BlankName`] for an empty name.
    pub fn rename(&mut self, name: &str) -> Result<Option<ClientMessage>, Rejection> {
        validator::prepare_rename(&mut self.view, name)
    }
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
    use crate::error_codes::ServerErrorCode;

    fn sync(player_id: PlayerId, judge_id: PlayerId, cards: &[(CardId, &str)]) -> ServerEvent {
        ServerEvent::GameSync {
            player_id,
            hand: cards.iter().map(|&(id, text)| Card::new(id, text)).collect(),
            judge_id,
        }
    }

    fn round(blank_count: usize) -> ServerEvent {
        ServerEvent::RoundStarted {
            prompt: "Prompt".into(),
            blank_count,
        }
    }

    #[test]
    fn queued_from_any_phase() {
        let mut store = GameStore::new();
        store.apply(sync(1, 2, &[(1, "A")]));
        store.apply(round(1));
        store.toggle_select(1).unwrap();

        let effects = store.apply(ServerEvent::PlayerQueued);
        assert!(effects.view_changed);
        assert_eq!(store.view().phase, RoundPhase::Queued);
        assert!(store.view().selection.is_empty());
        assert_eq!(store.view().hand.len(), 1);
    }

    #[test]
    fn negative_join_id_is_kept_and_reported() {
        let mut store = GameStore::new();
        store.apply(sync(1, 2, &[]));
        store.apply(round(2));

        let effects = store.apply(ServerEvent::PlayerJoined { id: -4 });
        assert_eq!(effects.diagnostics, vec![Diagnostic::NegativePlayerId(-4)]);
        assert_eq!(store.view().identity.id, Some(-4));
        assert_eq!(store.view().phase, RoundPhase::Idle);
        assert_eq!(store.view().required_response_count, 0);
        assert!(store.view().prompt.is_none());
    }

    #[test]
    fn round_start_for_non_judge_requires_blank_count() {
        let mut store = GameStore::new();
        store.apply(sync(1, 2, &[(1, "A")]));
        store.apply(round(3));
        assert_eq!(
            store.view().phase,
            RoundPhase::Answering { submitted: false }
        );
        assert_eq!(store.view().required_response_count, 3);
        assert_eq!(store.view().prompt.as_deref(), Some("Prompt"));
    }

    #[test]
    fn judge_responses_emit_one_read_per_submission() {
        let mut store = GameStore::new();
        store.apply(sync(5, 5, &[]));
        store.apply(round(2));

        let responses = vec![
            Response::new(1, vec![Card::new(10, "x"), Card::new(11, "y")]),
            Response::new(2, vec![Card::new(20, "z")]),
        ];
        let effects = store.apply(ServerEvent::JudgeResponses {
            responses: responses.clone(),
        });
        assert_eq!(
            effects.commands,
            vec![
                ClientMessage::ReadSubmission {
                    card_ids: vec![10, 11]
                },
                ClientMessage::ReadSubmission { card_ids: vec![20] },
            ]
        );
        assert_eq!(store.view().responses, responses);
        assert_eq!(
            store.view().phase,
            RoundPhase::Judging {
                as_judge: true,
                verdict_sent: false
            }
        );
    }

    #[test]
    fn judging_announcement_keeps_judge_pick() {
        let mut store = GameStore::new();
        store.apply(sync(5, 5, &[]));
        store.apply(round(1));
        store.apply(ServerEvent::JudgeResponses {
            responses: vec![Response::new(3, vec![Card::new(1, "a")])],
        });
        store.toggle_select(3).unwrap();

        store.apply(ServerEvent::JudgeModeStarted);
        assert_eq!(store.view().selection.as_slice(), &[3]);
    }

    #[test]
    fn judging_announcement_locks_out_non_judge() {
        let mut store = GameStore::new();
        store.apply(sync(1, 5, &[(7, "card")]));
        store.apply(round(1));
        store.toggle_select(7).unwrap();

        store.apply(ServerEvent::JudgeModeStarted);
        assert_eq!(
            store.view().phase,
            RoundPhase::Judging {
                as_judge: false,
                verdict_sent: false
            }
        );
        assert!(store.view().selection.is_empty());
        assert!(!store.view().can_interact());
    }

    #[test]
    fn server_error_does_not_change_view() {
        let mut store = GameStore::new();
        store.apply(sync(1, 2, &[(1, "A")]));
        let before = store.view().clone();

        let effects = store.apply(ServerEvent::ServerError {
            code: ServerErrorCode::WrongCardCount,
        });
        assert!(!effects.view_changed);
        assert_eq!(
            effects.diagnostics,
            vec![Diagnostic::Server(ServerErrorCode::WrongCardCount)]
        );
        assert_eq!(store.view(), &before);
    }

    #[test]
    fn receive_reports_decode_errors() {
        let mut store = GameStore::new();
        let effects = store.receive(r#"{"type":"didJoin"}"#);
        assert!(matches!(
            effects.diagnostics.as_slice(),
            [Diagnostic::Decode(_)]
        ));
        assert_eq!(store.view(), &GameView::default());
    }

    #[test]
    fn unassigned_ids_are_not_the_judge() {
        let view = GameView::default();
        assert!(!view.is_judge());
    }

    #[test]
    fn submit_hint_tracks_selection_count() {
        let mut store = GameStore::new();
        store.apply(sync(1, 2, &[(1, "A"), (2, "B"), (3, "C")]));
        store.apply(round(2));
        assert_eq!(store.view().submit_hint(), Some(SubmitHint::SelectMore(2)));

        store.toggle_select(1).unwrap();
        assert_eq!(
            store.view().submit_hint().unwrap().to_string(),
            "Select 1 More Card"
        );

        store.toggle_select(2).unwrap();
        assert_eq!(store.view().submit_hint(), Some(SubmitHint::PlayCards(2)));

        store.toggle_select(3).unwrap();
        assert_eq!(
            store.view().submit_hint().unwrap().to_string(),
            "Select 1 Less Card"
        );
    }

    #[test]
    fn submit_hint_for_judge() {
        let mut store = GameStore::new();
        store.apply(sync(5, 5, &[]));
        store.apply(round(2));
        assert_eq!(store.view().submit_hint(), Some(SubmitHint::SelectWinner));

        store.apply(ServerEvent::JudgeResponses {
            responses: vec![Response::new(3, vec![])],
        });
        store.toggle_select(3).unwrap();
        assert_eq!(store.view().submit_hint(), Some(SubmitHint::ChooseWinner));
    }

    #[test]
    fn round_phase_display() {
        assert_eq!(
            RoundPhase::Answering { submitted: true }.to_string(),
            "waiting for other players"
        );
        assert_eq!(
            RoundPhase::Judging {
                as_judge: true,
                verdict_sent: false
            }
            .to_string(),
            "judging"
        );
    }
}
