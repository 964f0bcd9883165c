//! In-process transport backed by tokio channels.
//!
//! [`channel_pair`] returns the client half ([`ChannelTransport`]) and the
//! device half ([`DeviceEnd`]). The device half plays the part of the display
//! device: it reads what the client sent and injects server messages. Dropping
//! the device half models the channel going away; sends then fail with
//! [`GameClientError::NotConnected`].

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::GameClientError;
use crate::transport::Transport;

/// One message as it left the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub namespace: String,
    pub payload: String,
}

/// Client half of an in-process channel.
#[derive(Debug)]
pub struct ChannelTransport {
    tx: mpsc::UnboundedSender<Envelope>,
    rx: mpsc::UnboundedReceiver<String>,
    closed: bool,
}

/// Device half of an in-process channel.
#[derive(Debug)]
pub struct DeviceEnd {
    /// Messages sent by the client.
    pub rx: mpsc::UnboundedReceiver<Envelope>,
    /// Messages delivered to the client as if from the game.
    pub tx: mpsc::UnboundedSender<String>,
}

/// Create a connected `(transport, device)` pair.
pub fn channel_pair() -> (ChannelTransport, DeviceEnd) {
    let (client_tx, device_rx) = mpsc::unbounded_channel();
    let (device_tx, client_rx) = mpsc::unbounded_channel();

    let transport = ChannelTransport {
        tx: client_tx,
        rx: client_rx,
        closed: false,
    };
    let device = DeviceEnd {
        rx: device_rx,
        tx: device_tx,
    };
    (transport, device)
}

#[async_trait]
impl Transport for ChannelTransport {
    async fn send(&mut self, namespace: &str, message: String) -> Result<(), GameClientError> {
        if self.closed {
            return Err(GameClientError::TransportClosed);
        }
        self.tx
            .send(Envelope {
                namespace: namespace.to_owned(),
                payload: message,
            })
            .map_err(|_| GameClientError::NotConnected)
    }

    /// Cancel-safe because `UnboundedReceiver::recv` is.
    async fn recv(&mut self) -> Option<Result<String, GameClientError>> {
        if self.closed {
            return None;
        }
        self.rx.recv().await.map(Ok)
    }

    async fn close(&mut self) -> Result<(), GameClientError> {
        self.closed = true;
        self.rx.close();
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn messages_flow_both_ways() {
        let (mut transport, mut device) = channel_pair();

        transport
            .send("urn:x-cast:test", "hello".to_string())
            .await
            .unwrap();
        let envelope = device.rx.recv().await.unwrap();
        assert_eq!(envelope.namespace, "urn:x-cast:test");
        assert_eq!(envelope.payload, "hello");

        device.tx.send("world".to_string()).unwrap();
        assert_eq!(transport.recv().await.unwrap().unwrap(), "world");
    }

    #[tokio::test]
    async fn send_without_device_is_not_connected() {
        let (mut transport, device) = channel_pair();
        drop(device);

        let err = transport.send("ns", "x".to_string()).await.unwrap_err();
        assert!(matches!(err, GameClientError::NotConnected));
    }

    #[tokio::test]
    async fn recv_ends_when_device_drops() {
        let (mut transport, device) = channel_pair();
        drop(device);
        assert!(transport.recv().await.is_none());
    }

    #[tokio::test]
    async fn send_after_close_returns_transport_closed() {
        let (mut transport, _device) = channel_pair();
        transport.close().await.unwrap();
        let err = transport.send("ns", "x".to_string()).await.unwrap_err();
        assert!(matches!(err, GameClientError::TransportClosed));
        assert!(transport.recv().await.is_none());
    }
}
