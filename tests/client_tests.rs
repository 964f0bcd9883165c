#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::indexing_slicing
)]
//! Integration-style tests for `GameClient`.
//!
//! Uses the shared `MockTransport` from `tests/common` to script server
//! messages and verify that the client session applies them, emits the right
//! events and sends the right commands.

mod common;

use freaky_friday_client::diagnostic::Diagnostic;
use freaky_friday_client::transports::channel_pair;
use freaky_friday_client::{
    ClientEvent, GameClient, GameClientConfig, GameClientError, Rejection, RoundPhase,
    ServerErrorCode, GAME_NAMESPACE,
};

use common::{
    game_sync_json, judge_submissions_json, next_view, response_json, round_ended_json,
    round_started_json, wait_for, MockHandles, MockTransport, Scripted,
};

// ════════════════════════════════════════════════════════════════════
// Helper: start a mock client with scripted messages
// ════════════════════════════════════════════════════════════════════

fn start_client(
    incoming: Vec<Scripted>,
) -> (
    GameClient,
    tokio::sync::mpsc::Receiver<ClientEvent>,
    MockHandles,
) {
    let (transport, handles) = MockTransport::new(incoming);
    let (client, events) = GameClient::start(transport, GameClientConfig::new());
    (client, events, handles)
}

fn msg(text: String) -> Scripted {
    Some(Ok(text))
}

// ════════════════════════════════════════════════════════════════════
// Lifecycle
// ════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn connected_is_the_first_event() {
    let (mut client, mut events, _handles) = start_client(vec![]);
    assert_eq!(events.recv().await, Some(ClientEvent::Connected));
    assert!(client.is_connected());
    client.shutdown().await;
}

#[tokio::test]
async fn device_closing_channel_disconnects_cleanly() {
    let (client, mut events, _handles) = start_client(vec![None]);
    let ev = wait_for(&mut events, |e| matches!(e, ClientEvent::Disconnected { .. })).await;
    assert_eq!(ev, ClientEvent::Disconnected { reason: None });
    assert!(!client.is_connected());
    assert!(matches!(
        client.request_leave(),
        Err(GameClientError::NotConnected)
    ));
}

#[tokio::test]
async fn receive_error_disconnects_with_reason() {
    let (_client, mut events, _handles) = start_client(vec![Some(Err(
        GameClientError::TransportReceive("reset by peer".into()),
    ))]);
    let ev = wait_for(&mut events, |e| matches!(e, ClientEvent::Disconnected { .. })).await;
    let ClientEvent::Disconnected { reason: Some(reason) } = ev else {
        panic!("expected a reason, got {ev:?}");
    };
    assert!(reason.contains("reset by peer"));
}

#[tokio::test]
async fn shutdown_closes_transport_and_reports_disconnect() {
    let (mut client, mut events, handles) = start_client(vec![]);
    client.shutdown().await;

    assert!(handles.closed.load(std::sync::atomic::Ordering::Relaxed));
    assert!(!client.is_connected());
    assert_eq!(events.recv().await, Some(ClientEvent::Connected));
    assert_eq!(
        events.recv().await,
        Some(ClientEvent::Disconnected {
            reason: Some("client shut down".into())
        })
    );
}

// ════════════════════════════════════════════════════════════════════
// Answering flow
// ════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn player_selects_and_submits_cards() {
    let (mut client, mut events, handles) = start_client(vec![
        msg(game_sync_json(1, &[10, 11, 12], 4)),
        msg(round_started_json("____ and ____.", 2)),
    ]);
    next_view(&mut events).await;
    let view = next_view(&mut events).await;
    assert_eq!(view.phase, RoundPhase::Answering { submitted: false });
    assert!(view.can_interact());

    client.toggle_select(12).await.unwrap();
    client.toggle_select(10).await.unwrap();
    assert_eq!(client.view().await.selection.as_slice(), &[12, 10]);

    client.try_submit().await.unwrap();
    assert_eq!(
        client.view().await.phase,
        RoundPhase::Answering { submitted: true }
    );

    let sent = handles.sent.lock().unwrap().clone();
    assert_eq!(
        sent,
        vec![(
            GAME_NAMESPACE.to_owned(),
            r#"{"type":"playSubmission","cardIDs":[12,10]}"#.to_owned()
        )]
    );

    client.shutdown().await;
}

#[tokio::test]
async fn rejected_submission_sends_nothing() {
    let (mut client, mut events, handles) = start_client(vec![
        msg(game_sync_json(1, &[10, 11, 12], 4)),
        msg(round_started_json("____ and ____.", 2)),
    ]);
    next_view(&mut events).await;
    next_view(&mut events).await;

    client.toggle_select(11).await.unwrap();
    let err = client.try_submit().await.unwrap_err();
    assert!(matches!(
        err,
        GameClientError::Rejected(Rejection::WrongCardCount {
            expected: 2,
            actual: 1
        })
    ));

    let err = client.toggle_select(99).await.unwrap_err();
    assert!(matches!(
        err,
        GameClientError::Rejected(Rejection::CardNotInHand(99))
    ));

    assert!(handles.payloads().is_empty());
    client.shutdown().await;
}

// ════════════════════════════════════════════════════════════════════
// Judging flow
// ════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn judge_reads_submissions_then_declares_winner() {
    let (mut client, mut events, handles) = start_client(vec![
        msg(game_sync_json(9, &[1, 2], 9)),
        msg(round_started_json("Prompt", 3)),
        msg(judge_submissions_json(&[(3, &[30]), (7, &[70, 71])])),
    ]);
    next_view(&mut events).await;
    let view = next_view(&mut events).await;
    assert!(view.is_judge());
    assert_eq!(view.required_response_count, 1);
    let view = next_view(&mut events).await;
    assert_eq!(view.responses.len(), 2);

    client.toggle_select(3).await.unwrap();
    client.toggle_select(7).await.unwrap();
    client.try_submit().await.unwrap();

    assert_eq!(
        handles.payloads(),
        vec![
            r#"{"type":"submissionRead","cardIDs":[30]}"#.to_owned(),
            r#"{"type":"submissionRead","cardIDs":[70,71]}"#.to_owned(),
            r#"{"type":"submissionsJudged","winningPlayerID":7}"#.to_owned(),
        ]
    );
    assert!(!client.view().await.can_interact());

    client.shutdown().await;
}

#[tokio::test]
async fn round_end_resets_view() {
    let (mut client, mut events, _handles) = start_client(vec![
        msg(game_sync_json(1, &[10], 4)),
        msg(round_started_json("Prompt", 1)),
        msg(round_ended_json()),
    ]);
    next_view(&mut events).await;
    next_view(&mut events).await;
    let view = next_view(&mut events).await;
    assert_eq!(view.phase, RoundPhase::Idle);
    assert_eq!(view.prompt, None);
    assert_eq!(client.view().await, view);
    client.shutdown().await;
}

// ════════════════════════════════════════════════════════════════════
// Diagnostics
// ════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn server_error_code_becomes_diagnostic() {
    let (mut client, mut events, _handles) = start_client(vec![msg(response_json(6))]);
    let ev = wait_for(&mut events, |e| matches!(e, ClientEvent::Diagnostic(_))).await;
    assert_eq!(
        ev,
        ClientEvent::Diagnostic(Diagnostic::Server(ServerErrorCode::InsufficientPlayers))
    );
    client.shutdown().await;
}

#[tokio::test]
async fn malformed_message_does_not_stop_the_session() {
    let (mut client, mut events, _handles) = start_client(vec![
        msg("<html>".into()),
        msg(game_sync_json(2, &[5], 3)),
    ]);
    let ev = wait_for(&mut events, |e| matches!(e, ClientEvent::Diagnostic(_))).await;
    assert!(matches!(ev, ClientEvent::Diagnostic(Diagnostic::Decode(_))));

    let view = next_view(&mut events).await;
    assert_eq!(view.identity.id, Some(2));
    assert!(client.is_connected());
    client.shutdown().await;
}

#[tokio::test]
async fn failed_send_is_reported_and_not_fatal() {
    let (mut client, mut events, handles) = start_client(vec![]);
    handles
        .fail_sends
        .store(true, std::sync::atomic::Ordering::Relaxed);

    client.request_start_next_round().unwrap();
    let ev = wait_for(&mut events, |e| matches!(e, ClientEvent::Diagnostic(_))).await;
    let ClientEvent::Diagnostic(Diagnostic::TransportUnavailable { message_type, .. }) = ev else {
        panic!("expected TransportUnavailable, got {ev:?}");
    };
    assert_eq!(message_type, "nextRound");
    assert!(client.is_connected());

    handles
        .fail_sends
        .store(false, std::sync::atomic::Ordering::Relaxed);
    client.request_join("Alice").await.unwrap();
    assert_eq!(
        handles.payloads(),
        vec![r#"{"type":"join","name":"Alice"}"#.to_owned()]
    );
    client.shutdown().await;
}

#[tokio::test]
async fn undelivered_submission_can_be_retried() {
    let (mut client, mut events, handles) = start_client(vec![
        msg(game_sync_json(1, &[10, 11], 4)),
        msg(round_started_json("Prompt", 1)),
    ]);
    next_view(&mut events).await;
    next_view(&mut events).await;
    client.toggle_select(11).await.unwrap();

    handles
        .fail_sends
        .store(true, std::sync::atomic::Ordering::Relaxed);
    client.try_submit().await.unwrap();
    let view = client.view().await;
    assert_eq!(view.phase, RoundPhase::Answering { submitted: false });
    assert_eq!(view.selection.as_slice(), &[11]);

    handles
        .fail_sends
        .store(false, std::sync::atomic::Ordering::Relaxed);
    client.try_submit().await.unwrap();
    assert_eq!(
        client.view().await.phase,
        RoundPhase::Answering { submitted: true }
    );
    assert_eq!(
        handles.payloads(),
        vec![r#"{"type":"playSubmission","cardIDs":[11]}"#.to_owned()]
    );
    client.shutdown().await;
}

#[tokio::test]
async fn acknowledgement_emits_nothing() {
    let (mut client, mut events, _handles) = start_client(vec![
        msg(response_json(0)),
        msg(game_sync_json(1, &[], 2)),
    ]);
    assert_eq!(events.recv().await, Some(ClientEvent::Connected));
    assert!(matches!(
        events.recv().await,
        Some(ClientEvent::ViewChanged(_))
    ));
    client.shutdown().await;
}

// ════════════════════════════════════════════════════════════════════
// Names and configuration
// ════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn join_and_rename_validate_names() {
    let (mut client, _events, handles) = start_client(vec![]);

    assert!(matches!(
        client.request_join("  ").await,
        Err(GameClientError::Rejected(Rejection::BlankName))
    ));
    client.request_join("Alice").await.unwrap();
    client.request_update_name("Alice").await.unwrap();
    client.request_update_name("Bob").await.unwrap();

    assert_eq!(
        handles.payloads(),
        vec![
            r#"{"type":"join","name":"Alice"}"#.to_owned(),
            r#"{"type":"updateSettings","name":"Bob"}"#.to_owned(),
        ]
    );
    assert_eq!(client.view().await.identity.name.as_deref(), Some("Bob"));
    client.shutdown().await;
}

#[tokio::test]
async fn custom_namespace_is_used_for_sends() {
    let (transport, mut device) = channel_pair();
    let config = GameClientConfig::new().with_namespace("urn:x-cast:test.table");
    let (mut client, _events) = GameClient::start(transport, config);

    client.request_leave().unwrap();
    let envelope = device.rx.recv().await.unwrap();
    assert_eq!(envelope.namespace, "urn:x-cast:test.table");
    assert_eq!(envelope.payload, r#"{"type":"leave"}"#);
    client.shutdown().await;
}

#[tokio::test]
async fn channel_transport_round_trip() {
    let (transport, mut device) = channel_pair();
    let (mut client, mut events) = GameClient::start(transport, GameClientConfig::new());

    device.tx.send(game_sync_json(9, &[], 9)).unwrap();
    device.tx.send(round_started_json("Prompt", 1)).unwrap();
    device
        .tx
        .send(judge_submissions_json(&[(4, &[40])]))
        .unwrap();

    let read = device.rx.recv().await.unwrap();
    assert_eq!(read.payload, r#"{"type":"submissionRead","cardIDs":[40]}"#);

    wait_for(&mut events, |e| {
        matches!(e, ClientEvent::ViewChanged(v) if !v.responses.is_empty())
    })
    .await;

    client.toggle_select(4).await.unwrap();
    client.try_submit().await.unwrap();
    let verdict = device.rx.recv().await.unwrap();
    assert_eq!(
        verdict.payload,
        r#"{"type":"submissionsJudged","winningPlayerID":4}"#
    );

    drop(device);
    let ev = wait_for(&mut events, |e| matches!(e, ClientEvent::Disconnected { .. })).await;
    assert_eq!(ev, ClientEvent::Disconnected { reason: None });
    client.shutdown().await;
}
