//! # Table Session Example
//!
//! Joins a running table over WebSocket and plays on autopilot:
//!
//! 1. Connect to the receiver app's WebSocket endpoint
//! 2. Join under a display name
//! 3. When answering, play the first cards in hand
//! 4. When judging, pick the first submission
//! 5. Shut down gracefully on Ctrl+C or disconnect
//!
//! ## Running
//!
//! ```sh
//! # With a receiver listening on localhost:8008:
//! cargo run --example table_session
//!
//! # Override the endpoint and name:
//! FREAKY_FRIDAY_URL=ws://192.168.1.20:8008/game FREAKY_FRIDAY_NAME=Robo \
//!     cargo run --example table_session
//! ```

use std::time::Duration;

use freaky_friday_client::{
    ClientEvent, GameClient, GameClientConfig, GameView, RoundPhase, WebSocketTransport,
};

/// Default endpoint when `FREAKY_FRIDAY_URL` is not set.
const DEFAULT_URL: &str = "ws://localhost:8008/game";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Set `RUST_LOG=debug` for the full message trace.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let url = std::env::var("FREAKY_FRIDAY_URL").unwrap_or_else(|_| DEFAULT_URL.to_string());
    let name = std::env::var("FREAKY_FRIDAY_NAME").unwrap_or_else(|_| "RustPlayer".to_string());
    tracing::info!("Connecting to {url}");

    let transport = WebSocketTransport::connect_with_timeout(&url, Duration::from_secs(5)).await?;
    let config = GameClientConfig::new().with_player_name(name);
    let (mut client, mut event_rx) = GameClient::start(transport, config);

    loop {
        tokio::select! {
            event = event_rx.recv() => {
                let Some(event) = event else {
                    tracing::info!("Event channel closed, exiting");
                    break;
                };

                match event {
                    ClientEvent::Connected => tracing::info!("Connected, joining table…"),
                    ClientEvent::ViewChanged(view) => {
                        describe(&view);
                        if let Err(e) = autoplay(&client, &view).await {
                            tracing::warn!("autoplay move refused: {e}");
                        }
                    }
                    ClientEvent::Diagnostic(d) if d.is_user_facing() => {
                        tracing::warn!("{}", d.user_message().unwrap_or("Something went wrong."));
                    }
                    ClientEvent::Diagnostic(d) => tracing::debug!("{d}"),
                    ClientEvent::Disconnected { reason } => {
                        tracing::info!(
                            "Disconnected: {}",
                            reason.as_deref().unwrap_or("table closed")
                        );
                        break;
                    }
                }
            }

            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Ctrl+C received, leaving table…");
                if let Err(e) = client.request_leave() {
                    tracing::warn!("could not send leave: {e}");
                }
                break;
            }
        }
    }

    client.shutdown().await;
    tracing::info!("Goodbye!");
    Ok(())
}

fn describe(view: &GameView) {
    match (&view.prompt, view.phase) {
        (Some(prompt), RoundPhase::Answering { submitted: false }) => {
            tracing::info!("Prompt: {prompt} ({} card(s))", view.required_response_count);
        }
        (_, phase) => tracing::info!("Now {phase}"),
    }
    if let Some(hint) = view.submit_hint() {
        tracing::info!("[{hint}]");
    }
}

/// Make one full move if the view allows it.
async fn autoplay(client: &GameClient, view: &GameView) -> freaky_friday_client::Result<()> {
    if !view.can_interact() || !view.selection.is_empty() {
        return Ok(());
    }

    if view.is_judge() {
        let Some(first) = view.responses.first() else {
            return Ok(());
        };
        tracing::info!("Judging: picking\n{first}");
        client.toggle_select(first.submitter_id).await?;
    } else {
        for card in view.hand.iter().take(view.required_response_count) {
            tracing::info!("Playing: {card}");
            client.toggle_select(card.id).await?;
        }
    }
    client.try_submit().await
}
