//! WebSocket transport using `tokio-tungstenite`.
//!
//! For receiver apps that expose the game channel as a WebSocket endpoint.
//! A socket carries exactly one namespace, so the namespace given to
//! [`Transport::send`] is only logged. Only text frames carry game messages;
//! binary frames are skipped.

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio_tungstenite::tungstenite::protocol::Message;
use tracing::{debug, info, trace, warn};

use crate::error::GameClientError;
use crate::transport::Transport;

/// The underlying WebSocket stream.
pub type WsStream =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

/// A [`Transport`] over one WebSocket connection.
///
/// [`recv`](Transport::recv) is cancel-safe: `StreamExt::next` does not lose
/// a frame when its future is dropped.
#[derive(Debug)]
pub struct WebSocketTransport {
    stream: WsStream,
    closed: bool,
}

impl WebSocketTransport {
    /// Connect to a `ws://` or `wss://` URL.
    ///
    /// # Errors
    ///
    /// Returns [`GameClientError::Io`] if the URL is invalid or the device is
    /// unreachable. I/O error kinds are preserved.
    pub async fn connect(url: &str) -> Result<Self, GameClientError> {
        debug!(%url, "connecting to game device");
        let (stream, _response) = tokio_tungstenite::connect_async(url).await.map_err(|e| {
            let kind = match &e {
                tokio_tungstenite::tungstenite::Error::Io(io) => io.kind(),
                _ => std::io::ErrorKind::Other,
            };
            GameClientError::Io(std::io::Error::new(kind, e))
        })?;
        info!(%url, "game channel established");
        Ok(Self::from_stream(stream))
    }

    /// Like [`connect`](Self::connect), bounded by `timeout`.
    ///
    /// # Errors
    ///
    /// [`GameClientError::Timeout`] if the deadline passes first.
    pub async fn connect_with_timeout(
        url: &str,
        timeout: std::time::Duration,
    ) -> Result<Self, GameClientError> {
        tokio::time::timeout(timeout, Self::connect(url))
            .await
            .map_err(|_| GameClientError::Timeout)?
    }

    /// Wrap a stream that was set up elsewhere.
    pub fn from_stream(stream: WsStream) -> Self {
        Self {
            stream,
            closed: false,
        }
    }
}

#[async_trait]
impl Transport for WebSocketTransport {
    async fn send(&mut self, namespace: &str, message: String) -> Result<(), GameClientError> {
        if self.closed {
            return Err(GameClientError::TransportClosed);
        }
        trace!(namespace, "sending text frame");
        self.stream
            .send(Message::Text(message.into()))
            .await
            .map_err(|e| GameClientError::TransportSend(e.to_string()))
    }

    async fn recv(&mut self) -> Option<Result<String, GameClientError>> {
        while let Some(frame) = self.stream.next().await {
            match frame {
                Ok(Message::Text(text)) => return Some(Ok(text.to_string())),
                Ok(Message::Close(frame)) => {
                    debug!(?frame, "game device closed the channel");
                    return None;
                }
                Ok(Message::Binary(_)) => warn!("skipping binary frame on game channel"),
                // Pings are answered by tungstenite.
                Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_)) => {}
                Err(e) => return Some(Err(GameClientError::TransportReceive(e.to_string()))),
            }
        }
        None
    }

    async fn close(&mut self) -> Result<(), GameClientError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.stream
            .close(None)
            .await
            .map_err(|e| GameClientError::TransportSend(e.to_string()))
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
    use crate::protocol::{decode, ServerEvent};
    use tokio::net::TcpListener;

    /// Accept one WebSocket connection on a local port and hand it to `handler`.
    async fn fake_device<F, Fut>(handler: F) -> String
    where
        F: FnOnce(tokio_tungstenite::WebSocketStream<tokio::net::TcpStream>) -> Fut
            + Send
            + 'static,
        Fut: std::future::Future<Output = ()> + Send,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (tcp, _) = listener.accept().await.unwrap();
            let ws = tokio_tungstenite::accept_async(tcp).await.unwrap();
            handler(ws).await;
        });
        format!("ws://{addr}")
    }

    #[tokio::test]
    async fn connect_fails_with_invalid_url() {
        let err = WebSocketTransport::connect("not-a-url").await.unwrap_err();
        assert!(matches!(err, GameClientError::Io(_)));
    }

    #[tokio::test]
    async fn text_frames_carry_game_messages() {
        let url = fake_device(|mut ws| async move {
            ws.send(Message::Binary(vec![0x01].into())).await.unwrap();
            ws.send(Message::Text(r#"{"type":"didQueue"}"#.into()))
                .await
                .unwrap();
            ws.close(None).await.unwrap();
        })
        .await;

        let mut transport = WebSocketTransport::connect(&url).await.unwrap();
        let text = transport.recv().await.unwrap().unwrap();
        assert_eq!(decode(&text).unwrap(), ServerEvent::PlayerQueued);
        assert!(transport.recv().await.is_none());
    }

    #[tokio::test]
    async fn sent_messages_reach_the_device() {
        let url = fake_device(|mut ws| async move {
            if let Some(Ok(Message::Text(text))) = ws.next().await {
                ws.send(Message::Text(text)).await.unwrap();
            }
            ws.close(None).await.unwrap();
        })
        .await;

        let mut transport = WebSocketTransport::connect(&url).await.unwrap();
        transport
            .send("urn:x-cast:test", r#"{"type":"leave"}"#.to_string())
            .await
            .unwrap();
        let echoed = transport.recv().await.unwrap().unwrap();
        assert_eq!(echoed, r#"{"type":"leave"}"#);
    }

    #[tokio::test]
    async fn send_after_close_returns_transport_closed() {
        let url =
            fake_device(|mut ws| async move { while let Some(Ok(_)) = ws.next().await {} }).await;

        let mut transport = WebSocketTransport::connect(&url).await.unwrap();
        transport.close().await.unwrap();
        transport.close().await.unwrap();

        let err = transport.send("ns", "x".to_string()).await.unwrap_err();
        assert!(matches!(err, GameClientError::TransportClosed));
    }
}
