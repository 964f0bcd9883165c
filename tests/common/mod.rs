#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::indexing_slicing,
    dead_code
)]
//! Shared test utilities for the Freaky Friday client integration tests.
//!
//! Provides a scripted [`MockTransport`], helpers for building server message
//! JSON, and an event helper for waiting on the next view.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex as StdMutex};

use async_trait::async_trait;
use freaky_friday_client::protocol::{PlayerPayload, ServerMessage};
use freaky_friday_client::{Card, ClientEvent, GameClientError, GameView, Response, Transport};
use tokio::sync::mpsc;

// ── MockTransport ───────────────────────────────────────────────────

/// Scripted incoming item: a message, an error, or `None` for end of channel.
pub type Scripted = Option<Result<String, GameClientError>>;

/// A mock transport for integration testing.
///
/// Scripted server messages are consumed in order by `recv()`. Every message
/// the client sends is recorded as `(namespace, payload)`. Sends can be made
/// to fail to simulate a missing channel.
pub struct MockTransport {
    incoming: VecDeque<Scripted>,
    pub sent: Arc<StdMutex<Vec<(String, String)>>>,
    pub closed: Arc<AtomicBool>,
    pub fail_sends: Arc<AtomicBool>,
}

/// Handles for inspecting a [`MockTransport`] after it has moved into a client.
#[derive(Clone)]
pub struct MockHandles {
    pub sent: Arc<StdMutex<Vec<(String, String)>>>,
    pub closed: Arc<AtomicBool>,
    pub fail_sends: Arc<AtomicBool>,
}

impl MockHandles {
    /// Payloads sent so far, without namespaces.
    pub fn payloads(&self) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|(_, payload)| payload.clone())
            .collect()
    }
}

impl MockTransport {
    pub fn new(incoming: Vec<Scripted>) -> (Self, MockHandles) {
        let handles = MockHandles {
            sent: Arc::new(StdMutex::new(Vec::new())),
            closed: Arc::new(AtomicBool::new(false)),
            fail_sends: Arc::new(AtomicBool::new(false)),
        };
        let transport = Self {
            incoming: VecDeque::from(incoming),
            sent: Arc::clone(&handles.sent),
            closed: Arc::clone(&handles.closed),
            fail_sends: Arc::clone(&handles.fail_sends),
        };
        (transport, handles)
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&mut self, namespace: &str, message: String) -> Result<(), GameClientError> {
        if self.fail_sends.load(Ordering::Relaxed) {
            return Err(GameClientError::NotConnected);
        }
        self.sent
            .lock()
            .unwrap()
            .push((namespace.to_owned(), message));
        Ok(())
    }

    async fn recv(&mut self) -> Option<Result<String, GameClientError>> {
        if let Some(item) = self.incoming.pop_front() {
            item
        } else {
            // Out of script: stay open until the client shuts down.
            std::future::pending().await
        }
    }

    async fn close(&mut self) -> Result<(), GameClientError> {
        self.closed.store(true, Ordering::Relaxed);
        Ok(())
    }
}

// ── JSON helper functions ───────────────────────────────────────────

fn to_json(msg: &ServerMessage) -> String {
    serde_json::to_string(msg).expect("server message serialization")
}

/// A hand of cards numbered `ids`, with text "card <id>".
pub fn hand(ids: &[i32]) -> Vec<Card> {
    ids.iter()
        .map(|&id| Card::new(id, format!("card {id}")))
        .collect()
}

pub fn did_queue_json() -> String {
    to_json(&ServerMessage::DidQueue)
}

pub fn did_join_json(number: i32) -> String {
    to_json(&ServerMessage::DidJoin { number })
}

pub fn judging_json() -> String {
    to_json(&ServerMessage::Judging)
}

/// A `gameSync` for `player_id` holding cards `card_ids`, with `judge_id` judging.
pub fn game_sync_json(player_id: i32, card_ids: &[i32], judge_id: i32) -> String {
    to_json(&ServerMessage::GameSync {
        player: PlayerPayload {
            id: player_id,
            hand: hand(card_ids),
        },
        judge: judge_id,
    })
}

/// `judgeSubmissions` with one response per `(submitter, card ids)` pair.
pub fn judge_submissions_json(responses: &[(i32, &[i32])]) -> String {
    let responses = responses
        .iter()
        .map(|&(submitter, ids)| Response::new(submitter, hand(ids)))
        .collect();
    to_json(&ServerMessage::JudgeSubmissions { responses })
}

pub fn round_started_json(prompt: &str, blanks: u32) -> String {
    to_json(&ServerMessage::RoundStarted {
        prompt: prompt.into(),
        num_of_blanks: blanks,
    })
}

pub fn round_ended_json() -> String {
    to_json(&ServerMessage::RoundEnded)
}

pub fn response_json(code: i32) -> String {
    to_json(&ServerMessage::CommandResult { code })
}

// ── Event helpers ───────────────────────────────────────────────────

/// Wait for the next `ViewChanged`, skipping other events.
pub async fn next_view(events: &mut mpsc::Receiver<ClientEvent>) -> GameView {
    loop {
        match events.recv().await {
            Some(ClientEvent::ViewChanged(view)) => return view,
            Some(ClientEvent::Disconnected { reason }) => {
                panic!("disconnected while waiting for a view: {reason:?}")
            }
            Some(_) => {}
            None => panic!("event channel closed while waiting for a view"),
        }
    }
}

/// Wait for the first event matching `pred`.
pub async fn wait_for(
    events: &mut mpsc::Receiver<ClientEvent>,
    pred: impl Fn(&ClientEvent) -> bool,
) -> ClientEvent {
    loop {
        let event = events.recv().await.expect("event channel closed");
        if pred(&event) {
            return event;
        }
    }
}
