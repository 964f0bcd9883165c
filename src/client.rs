//! Async client for the Freaky Friday game protocol.
//!
//! [`GameClient`] is a thin handle that talks to a background session task
//! over an unbounded MPSC channel. The task owns the transport and the
//! [`GameStore`], so inbound messages and local actions are processed one at a
//! time on a single sequence. Events are emitted on a bounded channel
//! ([`tokio::sync::mpsc::Receiver<ClientEvent>`]) returned from
//! [`GameClient::start`].
//!
//! # Example
//!
//! ```rust,ignore
//! let transport = connect_somehow().await;
//! let config = GameClientConfig::new().with_player_name("Alice");
//! let (client, mut events) = GameClient::start(transport, config);
//!
//! while let Some(event) = events.recv().await {
//!     match event {
//!         ClientEvent::ViewChanged(view) if view.can_interact() => { /* … */ }
//!         ClientEvent::Diagnostic(d) if d.is_user_facing() => { /* show it */ }
//!         ClientEvent::Disconnected { .. } => break,
//!         _ => {}
//!     }
//! }
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot, Mutex};
use tracing::{debug, error, info, warn};

use crate::diagnostic::Diagnostic;
use crate::error::{GameClientError, Result};
use crate::event::ClientEvent;
use crate::protocol::{self, ClientMessage, GAME_NAMESPACE};
use crate::state::{Effects, GameStore, GameView};
use crate::transport::Transport;
use crate::validator::Rejection;

/// Default capacity of the bounded event channel.
const DEFAULT_EVENT_CHANNEL_CAPACITY: usize = 256;

/// Default timeout for the graceful shutdown.
const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(1);

// ── Configuration ───────────────────────────────────────────────────

/// Configuration for a [`GameClient`].
///
/// # Example
///
/// ```
/// use freaky_friday_client::client::GameClientConfig;
/// use std::time::Duration;
///
/// let config = GameClientConfig::new()
///     .with_player_name("Alice")
///     .with_event_channel_capacity(64)
///     .with_shutdown_timeout(Duration::from_secs(3));
/// assert_eq!(config.player_name.as_deref(), Some("Alice"));
/// ```
#[derive(Debug, Clone)]
pub struct GameClientConfig {
    /// Namespace passed to every [`Transport::send`].
    pub namespace: String,
    /// Name to join with as soon as the session starts.
    ///
    /// When set, a `join` is the first outgoing message. Leave unset to call
    /// [`GameClient::request_join`] later, e.g. after asking the player.
    pub player_name: Option<String>,
    /// Capacity of the bounded event channel.
    ///
    /// Events are dropped with a warning when the consumer falls behind.
    /// `Disconnected` is always delivered. Defaults to **256**; clamped to 1.
    pub event_channel_capacity: usize,
    /// How long [`GameClient::shutdown`] waits for the session task before
    /// aborting it. Defaults to **1 second**.
    pub shutdown_timeout: Duration,
}

impl GameClientConfig {
    /// Create a configuration with default values.
    pub fn new() -> Self {
        Self {
            namespace: GAME_NAMESPACE.to_owned(),
            player_name: None,
            event_channel_capacity: DEFAULT_EVENT_CHANNEL_CAPACITY,
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
        }
    }

    /// Override the message namespace.
    #[must_use]
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// Join with this name as soon as the session starts.
    #[must_use]
    pub fn with_player_name(mut self, name: impl Into<String>) -> Self {
        self.player_name = Some(name.into());
        self
    }

    /// Set the capacity of the bounded event channel. Values below 1 are
    /// clamped to 1.
    #[must_use]
    pub fn with_event_channel_capacity(mut self, capacity: usize) -> Self {
        self.event_channel_capacity = capacity.max(1);
        self
    }

    /// Set the timeout for the graceful shutdown.
    #[must_use]
    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }
}

impl Default for GameClientConfig {
    fn default() -> Self {
        Self::new()
    }
}

// ── Commands ────────────────────────────────────────────────────────

type Reply = oneshot::Sender<std::result::Result<(), Rejection>>;

/// Local intents forwarded to the session task.
enum Command {
    Join { name: String, reply: Option<Reply> },
    Rename { name: String, reply: Reply },
    ToggleSelect { item_id: i32, reply: Reply },
    Submit { reply: Reply },
    /// Commands that need no validation.
    Send(ClientMessage),
}

// ── Shared state ────────────────────────────────────────────────────

/// State shared between the client handle and the session task.
struct ClientState {
    connected: AtomicBool,
    view: Mutex<GameView>,
}

impl ClientState {
    fn new() -> Self {
        Self {
            connected: AtomicBool::new(true),
            view: Mutex::new(GameView::default()),
        }
    }
}

// ── Client handle ───────────────────────────────────────────────────

/// Async client handle for the game protocol.
///
/// Created via [`GameClient::start`]. Validated actions
/// ([`request_join`](Self::request_join), [`toggle_select`](Self::toggle_select),
/// [`try_submit`](Self::try_submit), [`request_update_name`](Self::request_update_name))
/// wait for the session task to accept or reject them. Plain commands return
/// as soon as they are queued. Nothing waits on the server.
pub struct GameClient {
    cmd_tx: mpsc::UnboundedSender<Command>,
    state: Arc<ClientState>,
    task: Option<tokio::task::JoinHandle<()>>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    shutdown_timeout: Duration,
}

impl GameClient {
    /// Start the session task and return a handle plus event receiver.
    ///
    /// The receiver yields [`ClientEvent::Connected`] first and
    /// [`ClientEvent::Disconnected`] last.
    #[must_use = "the event receiver must be used to receive events"]
    pub fn start(
        transport: impl Transport,
        config: GameClientConfig,
    ) -> (Self, mpsc::Receiver<ClientEvent>) {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel::<Command>();
        let capacity = config.event_channel_capacity.max(1);
        let (event_tx, event_rx) = mpsc::channel::<ClientEvent>(capacity);
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        let state = Arc::new(ClientState::new());

        if let Some(name) = config.player_name {
            // The receiver is alive until the task exits, so this cannot fail.
            let _ = cmd_tx.send(Command::Join { name, reply: None });
        }

        let session = Session {
            transport,
            namespace: config.namespace,
            store: GameStore::new(),
            published: GameView::default(),
            event_tx,
            state: Arc::clone(&state),
        };
        let task = tokio::spawn(session.run(cmd_rx, shutdown_rx));

        let client = Self {
            cmd_tx,
            state,
            task: Some(task),
            shutdown_tx: Some(shutdown_tx),
            shutdown_timeout: config.shutdown_timeout,
        };
        (client, event_rx)
    }

    // ── Intents ─────────────────────────────────────────────────────

    /// Join the game under `name`.
    ///
    /// # Errors
    ///
    /// [`GameClientError::Rejected`] for a blank name,
    /// [`GameClientError::NotConnected`] once the session has ended.
    pub async fn request_join(&self, name: impl Into<String>) -> Result<()> {
        let name = name.into();
        self.request(|reply| Command::Join {
            name,
            reply: Some(reply),
        })
        .await
    }

    /// Change the display name. Unchanged names send nothing.
    ///
    /// # Errors
    ///
    /// [`GameClientError::Rejected`] for a blank name,
    /// [`GameClientError::NotConnected`] once the session has ended.
    pub async fn request_update_name(&self, name: impl Into<String>) -> Result<()> {
        let name = name.into();
        self.request(|reply| Command::Rename { name, reply }).await
    }

    /// Toggle a card in the hand, or pick a submitter as winner when judging.
    ///
    /// # Errors
    ///
    /// [`GameClientError::Rejected`] if the item is unknown or selection is
    /// closed, [`GameClientError::NotConnected`] once the session has ended.
    pub async fn toggle_select(&self, item_id: i32) -> Result<()> {
        self.request(|reply| Command::ToggleSelect { item_id, reply })
            .await
    }

    /// Submit the selected cards, or declare the selected winner.
    ///
    /// # Errors
    ///
    /// [`GameClientError::Rejected`] with the validation failure; nothing is
    /// sent in that case.
    pub async fn try_submit(&self) -> Result<()> {
        self.request(|reply| Command::Submit { reply }).await
    }

    /// Ask the server to start the next round.
    ///
    /// # Errors
    ///
    /// Returns [`GameClientError::NotConnected`] if the session has ended.
    pub fn request_start_next_round(&self) -> Result<()> {
        self.queue(Command::Send(ClientMessage::StartNextRound))
    }

    /// Leave the game. Fire-and-forget; no reply is tracked.
    ///
    /// # Errors
    ///
    /// Returns [`GameClientError::NotConnected`] if the session has ended.
    pub fn request_leave(&self) -> Result<()> {
        self.queue(Command::Send(ClientMessage::Leave))
    }

    /// Shut down the client, closing the transport and stopping the session task.
    pub async fn shutdown(&mut self) {
        debug!("GameClient: shutdown requested");

        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }

        if let Some(mut task) = self.task.take() {
            match tokio::time::timeout(self.shutdown_timeout, &mut task).await {
                Ok(Ok(())) => {}
                Ok(Err(join_err)) => {
                    warn!("session task terminated with join error: {join_err}");
                }
                Err(_) => {
                    warn!("session task did not exit within timeout; aborting task");
                    task.abort();
                    if let Err(join_err) = task.await {
                        debug!("session task aborted: {join_err}");
                    }
                }
            }
        }

        self.state.connected.store(false, Ordering::Release);
    }

    // ── State accessors ─────────────────────────────────────────────

    /// Returns `true` while the session task is running.
    pub fn is_connected(&self) -> bool {
        self.state.connected.load(Ordering::Acquire)
    }

    /// Snapshot of the current game view.
    pub async fn view(&self) -> GameView {
        self.state.view.lock().await.clone()
    }

    // ── Internal helpers ────────────────────────────────────────────

    fn queue(&self, cmd: Command) -> Result<()> {
        if !self.state.connected.load(Ordering::Acquire) {
            return Err(GameClientError::NotConnected);
        }
        self.cmd_tx
            .send(cmd)
            .map_err(|_| GameClientError::NotConnected)
    }

    /// Queue a validated command and wait for the verdict.
    async fn request(&self, build: impl FnOnce(Reply) -> Command) -> Result<()> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.queue(build(reply_tx))?;
        match reply_rx.await {
            Ok(verdict) => verdict.map_err(GameClientError::from),
            Err(_) => Err(GameClientError::NotConnected),
        }
    }
}

impl std::fmt::Debug for GameClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameClient")
            .field("connected", &self.is_connected())
            .field("has_task", &self.task.is_some())
            .finish()
    }
}

impl Drop for GameClient {
    fn drop(&mut self) {
        // No executor is available here to drive a graceful close.
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

// ── Session task ────────────────────────────────────────────────────

/// The single actor that owns the transport and the game state.
struct Session<T> {
    transport: T,
    namespace: String,
    store: GameStore,
    /// Last view sent out as `ViewChanged`.
    published: GameView,
    event_tx: mpsc::Sender<ClientEvent>,
    state: Arc<ClientState>,
}

impl<T: Transport> Session<T> {
    /// Multiplex local commands, shutdown and inbound messages.
    ///
    /// Exits when the handle is dropped or shut down, the device closes the
    /// channel, or a receive error occurs. Send failures do not end the session.
    async fn run(
        mut self,
        mut cmd_rx: mpsc::UnboundedReceiver<Command>,
        mut shutdown_rx: oneshot::Receiver<()>,
    ) {
        debug!("session started");
        emit_event(&self.event_tx, ClientEvent::Connected).await;

        loop {
            tokio::select! {
                cmd = cmd_rx.recv() => {
                    match cmd {
                        Some(cmd) => self.handle_command(cmd).await,
                        None => {
                            debug!("command channel closed, ending session");
                            let _ = self.transport.close().await;
                            let reason = Some("client shut down".to_owned());
                            emit_disconnected(&self.event_tx, &self.state, reason).await;
                            break;
                        }
                    }
                }

                _ = &mut shutdown_rx => {
                    debug!("shutdown signal received");
                    let _ = self.transport.close().await;
                    let reason = Some("client shut down".to_owned());
                    emit_disconnected(&self.event_tx, &self.state, reason).await;
                    break;
                }

                incoming = self.transport.recv() => {
                    match incoming {
                        Some(Ok(text)) => {
                            debug!("received: {text}");
                            let effects = self.store.receive(&text);
                            self.apply_effects(effects).await;
                        }
                        Some(Err(e)) => {
                            error!("transport receive error: {e}");
                            emit_disconnected(
                                &self.event_tx,
                                &self.state,
                                Some(format!("transport receive error: {e}")),
                            )
                            .await;
                            break;
                        }
                        None => {
                            info!("game channel closed by device");
                            emit_disconnected(&self.event_tx, &self.state, None).await;
                            break;
                        }
                    }
                }
            }
        }

        debug!("session exited");
    }

    async fn handle_command(&mut self, cmd: Command) {
        match cmd {
            Command::Join { name, reply } => {
                let outcome = self.store.join(&name).map(Some);
                if let (None, Err(rejection)) = (&reply, &outcome) {
                    warn!("configured player name was rejected: {rejection}");
                }
                self.conclude(outcome, reply, None).await;
            }
            Command::Rename { name, reply } => {
                let outcome = self.store.rename(&name);
                self.conclude(outcome, Some(reply), None).await;
            }
            Command::ToggleSelect { item_id, reply } => {
                let outcome = self.store.toggle_select(item_id).map(|()| None);
                self.conclude(outcome, Some(reply), None).await;
            }
            Command::Submit { reply } => {
                let before = self.store.view().clone();
                let outcome = self.store.try_submit().map(Some);
                self.conclude(outcome, Some(reply), Some(before)).await;
            }
            Command::Send(msg) => {
                self.send(msg).await;
            }
        }
    }

    /// Send the command of an accepted local action, publish the resulting
    /// view, then answer the caller.
    ///
    /// When the send fails and `undo` is given, the view goes back to `undo`
    /// so the player is not left waiting on a message the server never got.
    async fn conclude(
        &mut self,
        outcome: std::result::Result<Option<ClientMessage>, Rejection>,
        reply: Option<Reply>,
        undo: Option<GameView>,
    ) {
        let verdict = match outcome {
            Ok(Some(msg)) => {
                if !self.send(msg).await {
                    if let Some(view) = undo {
                        debug!("submission not delivered, reopening selection");
                        self.store.restore(view);
                    }
                }
                Ok(())
            }
            Ok(None) => Ok(()),
            Err(rejection) => {
                debug!("local action rejected: {rejection}");
                Err(rejection)
            }
        };
        self.publish_view().await;
        if let Some(reply) = reply {
            // The caller may have stopped waiting; that is fine.
            let _ = reply.send(verdict);
        }
    }

    async fn apply_effects(&mut self, effects: Effects) {
        self.publish_view().await;
        for diagnostic in effects.diagnostics {
            emit_event(&self.event_tx, ClientEvent::Diagnostic(diagnostic)).await;
        }
        for msg in effects.commands {
            self.send(msg).await;
        }
    }

    /// Emit `ViewChanged` if the store's view differs from the last one sent.
    async fn publish_view(&mut self) {
        if self.store.view() == &self.published {
            return;
        }
        self.published = self.store.view().clone();
        *self.state.view.lock().await = self.published.clone();
        emit_event(
            &self.event_tx,
            ClientEvent::ViewChanged(self.published.clone()),
        )
        .await;
    }

    /// Encode and send one command. Failures are reported, never fatal.
    ///
    /// Returns `true` if the transport accepted the message.
    async fn send(&mut self, msg: ClientMessage) -> bool {
        let message_type = msg.message_type();
        let json = match protocol::encode(&msg) {
            Ok(json) => json,
            Err(e) => {
                error!(message_type, "failed to serialize ClientMessage: {e}");
                return false;
            }
        };
        debug!(message_type, "sending: {json}");
        match self.transport.send(&self.namespace, json).await {
            Ok(()) => true,
            Err(e) => {
                warn!(message_type, "dropping outgoing message: {e}");
                emit_event(
                    &self.event_tx,
                    ClientEvent::Diagnostic(Diagnostic::TransportUnavailable {
                        message_type,
                        reason: e.to_string(),
                    }),
                )
                .await;
                false
            }
        }
    }
}

/// Mark the session ended and emit the final `Disconnected` event.
///
/// Uses `send().await` rather than `try_send` so the last event is never
/// dropped.
async fn emit_disconnected(
    event_tx: &mpsc::Sender<ClientEvent>,
    state: &ClientState,
    reason: Option<String>,
) {
    state.connected.store(false, Ordering::Release);
    let event = ClientEvent::Disconnected { reason };
    if event_tx.send(event).await.is_err() {
        debug!("event channel closed, receiver dropped");
    }
}

/// Emit an event. If the channel is full, log a warning and drop the event so
/// the session never blocks on a slow consumer.
async fn emit_event(event_tx: &mpsc::Sender<ClientEvent>, event: ClientEvent) {
    match event_tx.try_send(event) {
        Ok(()) => {}
        Err(mpsc::error::TrySendError::Full(dropped)) => {
            warn!(
                "event channel full, dropping event: {:?}",
                std::mem::discriminant(&dropped)
            );
        }
        Err(mpsc::error::TrySendError::Closed(_)) => {
            debug!("event channel closed, receiver dropped");
        }
    }
}

// ── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::indexing_slicing
)]
mod tests {
    use super::*;
    use crate::transports::channel_pair;

    #[test]
    fn config_defaults() {
        let config = GameClientConfig::new();
        assert_eq!(config.namespace, GAME_NAMESPACE);
        assert!(config.player_name.is_none());
        assert_eq!(config.event_channel_capacity, 256);
        assert_eq!(config.shutdown_timeout, Duration::from_secs(1));
    }

    #[test]
    fn event_channel_capacity_is_clamped_to_one() {
        let config = GameClientConfig::new().with_event_channel_capacity(0);
        assert_eq!(config.event_channel_capacity, 1);
    }

    #[tokio::test]
    async fn configured_name_joins_first() {
        let (transport, mut device) = channel_pair();
        let config = GameClientConfig::new().with_player_name("Alice");
        let (mut client, mut events) = GameClient::start(transport, config);

        assert_eq!(events.recv().await, Some(ClientEvent::Connected));
        let envelope = device.rx.recv().await.unwrap();
        assert_eq!(envelope.namespace, GAME_NAMESPACE);
        assert_eq!(envelope.payload, r#"{"type":"join","name":"Alice"}"#);

        let Some(ClientEvent::ViewChanged(view)) = events.recv().await else {
            panic!("expected ViewChanged after join");
        };
        assert_eq!(view.identity.name.as_deref(), Some("Alice"));
        assert_eq!(client.view().await, view);

        client.shutdown().await;
    }

    #[tokio::test]
    async fn blank_configured_name_sends_nothing() {
        let (transport, mut device) = channel_pair();
        let config = GameClientConfig::new().with_player_name("   ");
        let (mut client, _events) = GameClient::start(transport, config);

        client.request_leave().unwrap();
        let envelope = device.rx.recv().await.unwrap();
        assert_eq!(envelope.payload, r#"{"type":"leave"}"#);

        client.shutdown().await;
    }

    /// A transport that is `Send` but not `Sync`.
    struct UnsyncTransport {
        inner: crate::transports::ChannelTransport,
        _not_sync: std::cell::Cell<()>,
    }

    #[async_trait::async_trait]
    impl Transport for UnsyncTransport {
        async fn send(&mut self, namespace: &str, message: String) -> Result<()> {
            self.inner.send(namespace, message).await
        }

        async fn recv(&mut self) -> Option<Result<String>> {
            self.inner.recv().await
        }

        async fn close(&mut self) -> Result<()> {
            self.inner.close().await
        }
    }

    #[tokio::test]
    async fn session_runs_with_transport_that_is_not_sync() {
        let (inner, device) = channel_pair();
        let transport = UnsyncTransport {
            inner,
            _not_sync: std::cell::Cell::new(()),
        };
        let (mut client, mut events) = GameClient::start(transport, GameClientConfig::new());
        assert_eq!(events.recv().await, Some(ClientEvent::Connected));

        drop(device);
        assert_eq!(
            events.recv().await,
            Some(ClientEvent::Disconnected { reason: None })
        );
        client.shutdown().await;
    }

    #[tokio::test]
    async fn undelivered_submission_reopens_selection() {
        use crate::state::RoundPhase;

        let (transport, device) = channel_pair();
        let (mut client, mut events) = GameClient::start(transport, GameClientConfig::new());
        device
            .tx
            .send(r#"{"type":"gameSync","player":{"ID":1,"hand":[{"ID":5,"text":"x"}]},"judge":2}"#.into())
            .unwrap();
        device
            .tx
            .send(r#"{"type":"roundStarted","prompt":"p","numOfBlanks":1}"#.into())
            .unwrap();
        loop {
            if let Some(ClientEvent::ViewChanged(view)) = events.recv().await {
                if view.can_interact() {
                    break;
                }
            }
        }

        client.toggle_select(5).await.unwrap();
        // Only the receiving half goes away; the client can still read.
        let crate::transports::DeviceEnd { rx, tx } = device;
        drop(rx);

        client.try_submit().await.unwrap();
        let view = client.view().await;
        assert_eq!(view.phase, RoundPhase::Answering { submitted: false });
        assert_eq!(view.selection.as_slice(), &[5]);
        assert!(view.can_interact());

        let diagnostic = loop {
            match events.recv().await {
                Some(ClientEvent::Diagnostic(d)) => break d,
                Some(_) => {}
                None => panic!("event channel closed"),
            }
        };
        assert!(matches!(
            diagnostic,
            Diagnostic::TransportUnavailable {
                message_type: "playSubmission",
                ..
            }
        ));

        drop(tx);
        client.shutdown().await;
    }

    #[tokio::test]
    async fn not_connected_after_shutdown() {
        let (transport, _device) = channel_pair();
        let (mut client, _events) = GameClient::start(transport, GameClientConfig::new());
        client.shutdown().await;

        assert!(!client.is_connected());
        assert!(matches!(
            client.request_start_next_round(),
            Err(GameClientError::NotConnected)
        ));
        assert!(matches!(
            client.try_submit().await,
            Err(GameClientError::NotConnected)
        ));
    }

    #[tokio::test]
    async fn debug_impl_for_client() {
        let (transport, _device) = channel_pair();
        let (mut client, _events) = GameClient::start(transport, GameClientConfig::new());
        let text = format!("{client:?}");
        assert!(text.contains("GameClient"));
        assert!(text.contains("connected"));
        client.shutdown().await;
    }
}
