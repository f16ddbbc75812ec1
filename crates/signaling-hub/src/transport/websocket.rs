//! WebSocket endpoint.
//!
//! Each socket is split in two:
//! - the reader (this task) decodes text frames and forwards them to the hub
//!   in arrival order
//! - the writer is a [`ConnectionActor`] draining the hub's outbox
//!
//! When the reader ends for any reason the hub is told the connection is
//! gone, which performs the implicit leave.

use crate::actors::{ConnectedSession, ConnectionActor, HubActorHandle};
use crate::errors::HubError;
use crate::observability::metrics;
use crate::protocol::ClientEvent;
use crate::routes::AppState;
use crate::types::SessionId;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use futures::{Sink, Stream, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// `GET /ws` upgrade handler.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> Response {
    if !state.health.is_ready() {
        return HubError::ShuttingDown.into_response();
    }

    let hub = state.hub.clone();
    let ping_interval = state.config.ping_interval;
    ws.on_upgrade(move |socket| handle_socket(socket, hub, ping_interval))
}

/// Drive one upgraded socket until it closes.
pub async fn handle_socket(socket: WebSocket, hub: HubActorHandle, ping_interval: Duration) {
    let (sink, stream) = socket.split();
    serve_connection(sink, stream, hub, ping_interval).await;
}

/// Transport-independent body of [`handle_socket`].
#[instrument(skip_all, name = "hub.transport.ws")]
pub async fn serve_connection<Tx, Rx, E>(
    sink: Tx,
    mut stream: Rx,
    hub: HubActorHandle,
    ping_interval: Duration,
) where
    Tx: Sink<Message> + Unpin + Send + 'static,
    Tx::Error: std::fmt::Display,
    Rx: Stream<Item = Result<Message, E>> + Unpin,
    E: std::fmt::Display,
{
    let ConnectedSession {
        session_id,
        outbox,
        cancel_token,
        shutdown_token,
    } = match hub.connect().await {
        Ok(session) => session,
        Err(e) => {
            warn!(target: "hub.transport", error = %e, "Failed to register connection");
            return;
        }
    };

    info!(target: "hub.transport", session_id = %session_id, "WebSocket connected");

    let writer = tokio::spawn(
        ConnectionActor::new(
            session_id,
            outbox,
            sink,
            cancel_token.clone(),
            shutdown_token,
            ping_interval,
        )
        .run(),
    );

    loop {
        tokio::select! {
            () = cancel_token.cancelled() => break,

            frame = stream.next() => match frame {
                Some(Ok(Message::Text(text))) => {
                    if forward_text(&hub, session_id, &text).await.is_err() {
                        break;
                    }
                }
                Some(Ok(Message::Close(_))) | None => break,
                // Pings are answered by the socket; pongs and binary frames carry nothing
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    debug!(
                        target: "hub.transport",
                        session_id = %session_id,
                        error = %e,
                        "WebSocket read failed"
                    );
                    break;
                }
            },
        }
    }

    if let Err(e) = hub.disconnect(session_id).await {
        debug!(
            target: "hub.transport",
            session_id = %session_id,
            error = %e,
            "Hub unavailable for disconnect"
        );
    }
    cancel_token.cancel();
    let _ = writer.await;

    info!(target: "hub.transport", session_id = %session_id, "WebSocket disconnected");
}

/// Decode one frame and hand it to the hub.
///
/// Invalid frames are dropped and the connection stays open. Only a hub
/// failure is returned as an error.
async fn forward_text(
    hub: &HubActorHandle,
    session_id: SessionId,
    text: &str,
) -> Result<(), HubError> {
    match ClientEvent::parse(text) {
        Ok(event) => hub.client_event(session_id, event).await,
        Err(e) => {
            metrics::record_event_rejected(e.reason());
            warn!(
                target: "hub.transport",
                session_id = %session_id,
                reason = e.reason(),
                error = %e,
                "Dropping invalid event"
            );
            Ok(())
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use axum::extract::ws::close_code;
    use futures::channel::mpsc as fmpsc;
    use futures::SinkExt;
    use tokio::task::JoinHandle;
    use tokio_util::sync::CancellationToken;

    type Inbound = fmpsc::UnboundedSender<Result<Message, axum::Error>>;

    type Outbound = fmpsc::Receiver<Message>;

    fn spawn_connection(hub: &HubActorHandle) -> (Inbound, Outbound, JoinHandle<()>) {
        let (in_tx, in_rx) = fmpsc::unbounded();
        let (out_tx, out_rx) = fmpsc::channel(32);
        let ping_interval = Duration::from_secs(60);
        let task = tokio::spawn(serve_connection(out_tx, in_rx, hub.clone(), ping_interval));
        (in_tx, out_rx, task)
    }

    async fn next_text(rx: &mut fmpsc::Receiver<Message>) -> serde_json::Value {
        let frame = tokio::time::timeout(Duration::from_secs(1), rx.next())
            .await
            .expect("timed out")
            .expect("socket closed");
        match frame {
            Message::Text(text) => serde_json::from_str(&text).unwrap(),
            other => panic!("unexpected frame: {other:?}"),
        }
    }

    fn join_frame(room: &str, participant: &str) -> Result<Message, axum::Error> {
        let data = serde_json::json!({
            "roomId": room,
            "participantId": participant,
            "participantName": participant,
        });
        let frame = serde_json::json!({"event": "join-room", "data": data});
        Ok(Message::Text(frame.to_string()))
    }

    #[tokio::test]
    async fn test_invalid_frames_do_not_close_connection() {
        let (hub, _task) = HubActorHandle::spawn(64, 8, CancellationToken::new());
        let (mut tx, mut rx, _conn) = spawn_connection(&hub);

        tx.send(Ok(Message::Text("garbage".to_string()))).await.unwrap();
        tx.send(Ok(Message::Text(r#"{"event":"nope"}"#.to_string()))).await.unwrap();
        tx.send(Ok(Message::Binary(vec![1, 2, 3]))).await.unwrap();
        tx.send(join_frame("r1", "p1")).await.unwrap();

        let roster = next_text(&mut rx).await;
        assert_eq!(roster["event"], "room-participants");
        assert_eq!(roster["data"]["isAdmin"], true);
        hub.cancel();
    }

    #[tokio::test]
    async fn test_stream_end_disconnects_session() {
        let (hub, _task) = HubActorHandle::spawn(64, 8, CancellationToken::new());
        let (mut a_tx, mut a_rx, _a) = spawn_connection(&hub);
        let (mut b_tx, _b_rx, b_task) = spawn_connection(&hub);

        a_tx.send(join_frame("r1", "pa")).await.unwrap();
        next_text(&mut a_rx).await;
        b_tx.send(join_frame("r1", "pb")).await.unwrap();
        let joined = next_text(&mut a_rx).await;
        assert_eq!(joined["event"], "user-joined");

        drop(b_tx);
        b_task.await.unwrap();

        let left = next_text(&mut a_rx).await;
        assert_eq!(left["event"], "user-left");
        assert_eq!(left["data"], joined["data"]);

        let stats = hub.stats().await.unwrap();
        assert_eq!(stats.connection_count, 1);
        hub.cancel();
    }

    #[tokio::test]
    async fn test_hub_shutdown_ends_connection() {
        let cancel = CancellationToken::new();
        let (hub, _task) = HubActorHandle::spawn(64, 8, cancel.clone());
        let (_tx, mut rx, conn) = spawn_connection(&hub);

        // Wait until registered
        while hub.stats().await.unwrap().connection_count == 0 {
            tokio::task::yield_now().await;
        }
        cancel.cancel();

        tokio::time::timeout(Duration::from_secs(1), conn)
            .await
            .unwrap()
            .unwrap();
        assert!(matches!(rx.next().await, Some(Message::Close(_))));
    }

    fn close_code_of(frame: Option<Message>) -> u16 {
        match frame {
            Some(Message::Close(Some(frame))) => frame.code,
            other => panic!("expected close frame, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_shutdown_always_sends_going_away() {
        // Readers racing their disconnects against the hub's cancellation
        for _ in 0..50 {
            let cancel = CancellationToken::new();
            let (hub, hub_task) = HubActorHandle::spawn(64, 8, cancel.clone());
            let mut connections: Vec<_> = (0..4).map(|_| spawn_connection(&hub)).collect();

            while hub.stats().await.unwrap().connection_count < connections.len() {
                tokio::task::yield_now().await;
            }
            cancel.cancel();
            hub_task.await.unwrap();

            for (_tx, rx, conn) in &mut connections {
                tokio::time::timeout(Duration::from_secs(1), conn)
                    .await
                    .unwrap()
                    .unwrap();
                assert_eq!(close_code_of(rx.next().await), close_code::AWAY);
            }
        }
    }

    #[tokio::test]
    async fn test_peer_disconnect_closes_normally() {
        let (hub, _task) = HubActorHandle::spawn(64, 8, CancellationToken::new());
        let (tx, mut rx, conn) = spawn_connection(&hub);

        while hub.stats().await.unwrap().connection_count == 0 {
            tokio::task::yield_now().await;
        }
        drop(tx);
        conn.await.unwrap();

        assert_eq!(close_code_of(rx.next().await), close_code::NORMAL);
        hub.cancel();
    }
}
