//! `ConnectionActor` - writer side of one WebSocket.
//!
//! Each `ConnectionActor`:
//! - Drains the connection's outbox filled by the `HubActor`
//! - Encodes each `ServerEvent` as a text frame
//! - Sends keep-alive pings on a fixed interval
//!
//! # Lifecycle
//!
//! 1. Spawned by the transport right after `HubActorHandle::connect`
//! 2. Runs until the socket rejects a write, the outbox closes, a `Close`
//!    message arrives, or its token is cancelled
//! 3. Cancellation comes from the hub (shutdown or disconnect) or from the
//!    transport's reader when the client goes away
//! 4. Every exit except a failed write ends with a close frame; its code
//!    tells a server shutdown apart from an ordinary end of connection

use super::messages::ConnectionMessage;
use super::metrics::{ActorType, MailboxMonitor};
use crate::types::SessionId;

use axum::extract::ws::{close_code, CloseFrame, Message};
use futures::{Sink, SinkExt};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};

/// Why the writer loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// A `Close` message from the hub.
    Requested,
    /// Token cancelled.
    Cancelled,
    /// Hub dropped the outbox.
    OutboxClosed,
    /// The socket rejected a write.
    SocketError,
}

/// The `ConnectionActor` implementation.
pub struct ConnectionActor<S> {
    session_id: SessionId,
    outbox: mpsc::Receiver<ConnectionMessage>,
    sink: S,
    cancel_token: CancellationToken,
    /// The hub's root token, cancelled only on server shutdown.
    shutdown_token: CancellationToken,
    ping_interval: Duration,
    mailbox: MailboxMonitor,
}

impl<S> ConnectionActor<S>
where
    S: Sink<Message> + Unpin,
    S::Error: std::fmt::Display,
{
    #[must_use]
    pub fn new(
        session_id: SessionId,
        outbox: mpsc::Receiver<ConnectionMessage>,
        sink: S,
        cancel_token: CancellationToken,
        shutdown_token: CancellationToken,
        ping_interval: Duration,
    ) -> Self {
        Self {
            session_id,
            outbox,
            sink,
            cancel_token,
            shutdown_token,
            ping_interval,
            mailbox: MailboxMonitor::new(ActorType::Connection, session_id.to_string()),
        }
    }

    /// Run the writer loop until the connection ends.
    #[instrument(skip_all, name = "hub.actor.connection", fields(session_id = %self.session_id))]
    pub async fn run(mut self) -> CloseReason {
        let mut ping = tokio::time::interval(self.ping_interval);
        ping.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // First tick fires immediately
        ping.tick().await;

        let reason = loop {
            tokio::select! {
                () = self.cancel_token.cancelled() => {
                    self.send_exit_close().await;
                    break CloseReason::Cancelled;
                }

                msg = self.outbox.recv() => {
                    let Some(message) = msg else {
                        self.send_exit_close().await;
                        break CloseReason::OutboxClosed;
                    };
                    self.mailbox.record_dequeue(self.outbox.len());

                    match message {
                        ConnectionMessage::Deliver(event) => {
                            let text = match event.to_text() {
                                Ok(text) => text,
                                Err(e) => {
                                    warn!(
                                        target: "hub.transport",
                                        session_id = %self.session_id,
                                        event = event.name(),
                                        error = %e,
                                        "Failed to encode event"
                                    );
                                    continue;
                                }
                            };
                            if let Err(e) = self.sink.send(Message::Text(text)).await {
                                debug!(
                                    target: "hub.transport",
                                    session_id = %self.session_id,
                                    error = %e,
                                    "Socket write failed"
                                );
                                break CloseReason::SocketError;
                            }
                        }
                        ConnectionMessage::Close { reason } => {
                            self.send_close(close_code::AWAY, reason).await;
                            break CloseReason::Requested;
                        }
                    }
                }

                _ = ping.tick() => {
                    if self.sink.send(Message::Ping(Vec::new())).await.is_err() {
                        break CloseReason::SocketError;
                    }
                }
            }
        };

        debug!(
            target: "hub.transport",
            session_id = %self.session_id,
            reason = ?reason,
            messages_processed = self.mailbox.messages_processed(),
            "ConnectionActor stopped"
        );

        reason
    }

    /// Close frame for an exit the hub did not ask for.
    async fn send_exit_close(&mut self) {
        if self.shutdown_token.is_cancelled() {
            self.send_close(close_code::AWAY, "server shutting down").await;
        } else {
            self.send_close(close_code::NORMAL, "connection closed").await;
        }
    }

    async fn send_close(&mut self, code: u16, reason: &'static str) {
        let frame = CloseFrame {
            code,
            reason: reason.into(),
        };
        let _ = self.sink.send(Message::Close(Some(frame))).await;
        let _ = self.sink.close().await;
    }
}
