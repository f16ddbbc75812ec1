//! WebSocket client for end-to-end tests.

use std::time::Duration;

use futures::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

/// How long `recv` waits before failing the test.
pub const RECV_TIMEOUT: Duration = Duration::from_secs(2);

/// One signaling connection.
pub struct TestClient {
    ws: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl TestClient {
    /// Open a connection to `url` (see `TestServer::ws_url`).
    pub async fn connect(url: &str) -> Self {
        let (ws, _response) = connect_async(url)
            .await
            .expect("websocket handshake failed");
        Self { ws }
    }

    /// Send a JSON frame.
    pub async fn send(&mut self, frame: Value) {
        self.send_raw(frame.to_string()).await;
    }

    /// Send a text frame verbatim.
    pub async fn send_raw(&mut self, text: impl Into<String>) {
        self.ws
            .send(Message::Text(text.into()))
            .await
            .expect("websocket send failed");
    }

    /// Next text frame, decoded. Panics on timeout or close.
    pub async fn recv(&mut self) -> Value {
        self.recv_text()
            .await
            .map(|text| serde_json::from_str(&text).expect("server sent invalid JSON"))
            .expect("connection closed while waiting for an event")
    }

    /// Next text frame as sent, or `None` once the server closes.
    pub async fn recv_text(&mut self) -> Option<String> {
        loop {
            let frame = tokio::time::timeout(RECV_TIMEOUT, self.ws.next())
                .await
                .expect("timed out waiting for a frame");
            match frame {
                Some(Ok(Message::Text(text))) => return Some(text),
                Some(Ok(Message::Close(_))) | None | Some(Err(_)) => return None,
                Some(Ok(_)) => {}
            }
        }
    }

    /// Next event, asserting its name.
    pub async fn expect_event(&mut self, name: &str) -> Value {
        let event = self.recv().await;
        assert_eq!(event["event"], name, "unexpected event: {event}");
        event
    }

    /// Assert nothing arrives within `window`.
    pub async fn expect_silence(&mut self, window: Duration) {
        loop {
            match tokio::time::timeout(window, self.ws.next()).await {
                Err(_) => return,
                Ok(Some(Ok(Message::Text(text)))) => panic!("unexpected event: {text}"),
                Ok(Some(Ok(Message::Ping(_) | Message::Pong(_)))) => {}
                Ok(other) => panic!("unexpected frame: {other:?}"),
            }
        }
    }

    /// Send a close frame and drain until the server acknowledges.
    pub async fn close(mut self) {
        let _ = self.ws.close(None).await;
        while let Ok(Some(Ok(_))) = tokio::time::timeout(RECV_TIMEOUT, self.ws.next()).await {}
    }
}
