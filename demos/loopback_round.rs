//! # Loopback Round Example
//!
//! Plays one scripted round against an in-process "receiver" using
//! [`channel_pair`]. The device half stands in for the display: it reads what
//! the client sends and replies with the messages a real table would send.
//!
//! ## Running
//!
//! ```sh
//! cargo run --example loopback_round
//! ```

use freaky_friday_client::transports::{channel_pair, DeviceEnd};
use freaky_friday_client::{ClientEvent, GameClient, GameClientConfig};
use serde_json::json;

/// Reply to the client's messages the way a two-player table would.
async fn run_device(mut device: DeviceEnd) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    while let Some(envelope) = device.rx.recv().await {
        tracing::info!("Device received: {}", envelope.payload);
        let msg: serde_json::Value = serde_json::from_str(&envelope.payload)?;

        match msg["type"].as_str() {
            Some("join") => {
                device.tx.send(json!({"type": "didJoin", "number": 1}).to_string())?;
                let sync = json!({
                    "type": "gameSync",
                    "player": {
                        "ID": 1,
                        "hand": [
                            {"ID": 100, "text": "a sentient toaster"},
                            {"ID": 101, "text": "Grandma's secret recipe"},
                            {"ID": 102, "text": "an awkward silence"}
                        ]
                    },
                    "judge": 2
                });
                device.tx.send(sync.to_string())?;
                device.tx.send(
                    json!({
                        "type": "roundStarted",
                        "prompt": "My superpower? ____ and ____.",
                        "numOfBlanks": 2
                    })
                    .to_string(),
                )?;
            }
            Some("playSubmission") => {
                device.tx.send(json!({"type": "response", "code": 0}).to_string())?;
                device.tx.send(json!({"type": "judging"}).to_string())?;
                device.tx.send(json!({"type": "roundEnded"}).to_string())?;
                // Closing the device ends the session.
                return Ok(());
            }
            _ => {}
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let (transport, device) = channel_pair();
    let device_task = tokio::spawn(run_device(device));

    let config = GameClientConfig::new().with_player_name("Loopback");
    let (mut client, mut event_rx) = GameClient::start(transport, config);

    while let Some(event) = event_rx.recv().await {
        match event {
            ClientEvent::ViewChanged(view) => {
                tracing::info!("View: {} [{:?}]", view.phase, view.submit_hint());
                if view.can_interact() && view.selection.is_empty() {
                    let picks: Vec<i32> = view
                        .hand
                        .iter()
                        .take(view.required_response_count)
                        .map(|card| card.id)
                        .collect();
                    for id in picks {
                        client.toggle_select(id).await?;
                    }
                    client.try_submit().await?;
                }
            }
            ClientEvent::Disconnected { reason } => {
                tracing::info!("Session over: {}", reason.as_deref().unwrap_or("clean"));
                break;
            }
            other => tracing::info!("Event: {other:?}"),
        }
    }

    client.shutdown().await;
    if let Err(e) = device_task.await? {
        tracing::warn!("device script failed: {e}");
    }
    tracing::info!("Done: one round played over the loopback transport.");
    Ok(())
}
