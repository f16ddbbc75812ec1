//! `HubActor` - singleton owner of all signaling state.
//!
//! Every join, leave, relay and disconnect goes through this actor's mailbox,
//! so membership and admin changes never interleave. For each step the actor
//! asks [`HubState`] for the resulting deliveries and pushes them onto the
//! addressed connections' outboxes with `try_send`. A slow or vanished
//! connection loses that one event; the hub never waits on it.
//!
//! # Graceful Shutdown
//!
//! When the root `CancellationToken` is cancelled the actor:
//! 1. Sends `Close` to every connection outbox
//! 2. Drops the outboxes and the state
//! 3. Exits the message loop

use super::messages::{ConnectedSession, ConnectionMessage, HubMessage};
use super::metrics::{ActorType, MailboxMonitor};
use crate::errors::HubError;
use crate::hub::{Delivery, HubState, HubStats, RoomInfo};
use crate::observability::metrics;
use crate::protocol::ClientEvent;
use crate::types::{RoomId, SessionId};

use std::collections::HashMap;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

/// Handle to the `HubActor`.
///
/// Cheap to clone; every WebSocket task and HTTP handler holds one.
#[derive(Clone, Debug)]
pub struct HubActorHandle {
    sender: mpsc::Sender<HubMessage>,
    cancel_token: CancellationToken,
}

impl HubActorHandle {
    /// Spawn the actor and return a handle to it plus its task handle.
    ///
    /// # Arguments
    ///
    /// * `mailbox_buffer` - Capacity of the hub mailbox
    /// * `connection_buffer` - Capacity of each connection's outbox
    /// * `cancel_token` - Root token; cancelling it shuts the hub down
    #[must_use]
    pub fn spawn(
        mailbox_buffer: usize,
        connection_buffer: usize,
        cancel_token: CancellationToken,
    ) -> (Self, JoinHandle<()>) {
        let (sender, receiver) = mpsc::channel(mailbox_buffer);

        let actor = HubActor {
            receiver,
            cancel_token: cancel_token.clone(),
            connection_buffer,
            state: HubState::new(),
            outboxes: HashMap::new(),
            mailbox: MailboxMonitor::new(ActorType::Hub, "hub"),
        };

        let task_handle = tokio::spawn(actor.run());

        (
            Self {
                sender,
                cancel_token,
            },
            task_handle,
        )
    }

    /// Register a new connection and obtain its outbox.
    pub async fn connect(&self) -> Result<ConnectedSession, HubError> {
        let (tx, rx) = tokio::sync::oneshot::channel();
        self.sender
            .send(HubMessage::Connect { respond_to: tx })
            .await
            .map_err(|e| HubError::Internal(format!("channel send failed: {e}")))?;

        rx.await
            .map_err(|e| HubError::Internal(format!("response receive failed: {e}")))?
    }

    /// Submit a decoded event from a connection.
    pub async fn client_event(
        &self,
        session_id: SessionId,
        event: ClientEvent,
    ) -> Result<(), HubError> {
        self.sender
            .send(HubMessage::ClientEvent { session_id, event })
            .await
            .map_err(|e| HubError::Internal(format!("channel send failed: {e}")))
    }

    /// Report that a connection's transport closed.
    pub async fn disconnect(&self, session_id: SessionId) -> Result<(), HubError> {
        self.sender
            .send(HubMessage::Disconnect { session_id })
            .await
            .map_err(|e| HubError::Internal(format!("channel send failed: {e}")))
    }

    /// Query one room.
    pub async fn room_info(&self, room_id: RoomId) -> Result<RoomInfo, HubError> {
        let (tx, rx) = tokio::sync::oneshot::channel();
        self.sender
            .send(HubMessage::GetRoomInfo {
                room_id,
                respond_to: tx,
            })
            .await
            .map_err(|e| HubError::Internal(format!("channel send failed: {e}")))?;

        rx.await
            .map_err(|e| HubError::Internal(format!("response receive failed: {e}")))?
    }

    /// Hub-wide counters.
    pub async fn stats(&self) -> Result<HubStats, HubError> {
        let (tx, rx) = tokio::sync::oneshot::channel();
        self.sender
            .send(HubMessage::GetStats { respond_to: tx })
            .await
            .map_err(|e| HubError::Internal(format!("channel send failed: {e}")))?;

        rx.await
            .map_err(|e| HubError::Internal(format!("response receive failed: {e}")))
    }

    /// Cancel the actor (for immediate shutdown).
    pub fn cancel(&self) {
        self.cancel_token.cancel();
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel_token.is_cancelled()
    }
}

/// The `HubActor` implementation.
struct HubActor {
    receiver: mpsc::Receiver<HubMessage>,
    cancel_token: CancellationToken,
    connection_buffer: usize,
    state: HubState,
    /// Outbound queue of every registered connection.
    outboxes: HashMap<SessionId, Outbox>,
    mailbox: MailboxMonitor,
}

struct Outbox {
    sender: mpsc::Sender<ConnectionMessage>,
    cancel_token: CancellationToken,
}

impl HubActor {
    #[instrument(skip_all, name = "hub.actor")]
    async fn run(mut self) {
        info!(target: "hub.actor", "HubActor started");

        loop {
            tokio::select! {
                // Shutdown wins over queued disconnects so every outbox gets a Close
                biased;

                () = self.cancel_token.cancelled() => {
                    info!(
                        target: "hub.actor",
                        "HubActor received cancellation signal"
                    );
                    self.graceful_shutdown();
                    break;
                }

                msg = self.receiver.recv() => {
                    match msg {
                        Some(message) => {
                            self.handle_message(message);
                            self.mailbox.record_dequeue(self.receiver.len());
                        }
                        None => {
                            info!(
                                target: "hub.actor",
                                "HubActor channel closed, exiting"
                            );
                            break;
                        }
                    }
                }
            }
        }

        info!(
            target: "hub.actor",
            peak_mailbox_depth = self.mailbox.peak_depth(),
            messages_processed = self.mailbox.messages_processed(),
            "HubActor stopped"
        );
    }

    fn handle_message(&mut self, message: HubMessage) {
        match message {
            HubMessage::Connect { respond_to } => {
                let session = self.connect();
                let _ = respond_to.send(session);
            }

            HubMessage::ClientEvent { session_id, event } => {
                debug!(
                    target: "hub.actor",
                    session_id = %session_id,
                    event = event.name(),
                    "Handling client event"
                );
                let deliveries = self.state.handle(session_id, event);
                self.dispatch(deliveries);
            }

            HubMessage::Disconnect { session_id } => {
                let deliveries = self.state.disconnect(session_id);
                if let Some(outbox) = self.outboxes.remove(&session_id) {
                    outbox.cancel_token.cancel();
                }
                self.dispatch(deliveries);
                debug!(
                    target: "hub.actor",
                    session_id = %session_id,
                    connections = self.outboxes.len(),
                    "Connection unregistered"
                );
            }

            HubMessage::GetRoomInfo {
                room_id,
                respond_to,
            } => {
                let result = self
                    .state
                    .room_info(&room_id)
                    .ok_or(HubError::RoomNotFound(room_id));
                let _ = respond_to.send(result);
            }

            HubMessage::GetStats { respond_to } => {
                let _ = respond_to.send(self.state.stats());
            }
        }
    }

    fn connect(&mut self) -> Result<ConnectedSession, HubError> {
        let session_id = SessionId::new();
        if !self.state.connect(session_id) {
            return Err(HubError::Internal(format!(
                "session id collision: {session_id}"
            )));
        }

        let (sender, outbox) = mpsc::channel(self.connection_buffer);
        let cancel_token = self.cancel_token.child_token();
        self.outboxes.insert(
            session_id,
            Outbox {
                sender,
                cancel_token: cancel_token.clone(),
            },
        );

        debug!(
            target: "hub.actor",
            session_id = %session_id,
            connections = self.outboxes.len(),
            "Connection registered"
        );

        Ok(ConnectedSession {
            session_id,
            outbox,
            cancel_token,
            shutdown_token: self.cancel_token.clone(),
        })
    }

    /// Push deliveries onto their outboxes without waiting.
    fn dispatch(&self, deliveries: Vec<Delivery>) {
        for Delivery { to, event } in deliveries {
            let Some(outbox) = self.outboxes.get(&to) else {
                metrics::record_message_dropped();
                debug!(
                    target: "hub.actor",
                    session_id = %to,
                    event = event.name(),
                    "No outbox for delivery, dropped"
                );
                continue;
            };

            let name = event.name();
            match outbox.sender.try_send(ConnectionMessage::Deliver(event)) {
                Ok(()) => {}
                Err(TrySendError::Full(_)) => {
                    metrics::record_message_dropped();
                    warn!(
                        target: "hub.actor",
                        session_id = %to,
                        event = name,
                        "Connection outbox full, event dropped"
                    );
                }
                Err(TrySendError::Closed(_)) => {
                    metrics::record_message_dropped();
                    debug!(
                        target: "hub.actor",
                        session_id = %to,
                        event = name,
                        "Connection outbox closed, event dropped"
                    );
                }
            }
        }
    }

    fn graceful_shutdown(&mut self) {
        info!(
            target: "hub.actor",
            connections = self.outboxes.len(),
            "Closing all connections"
        );

        for (session_id, outbox) in self.outboxes.drain() {
            if outbox
                .sender
                .try_send(ConnectionMessage::Close { reason: "shutdown" })
                .is_err()
            {
                debug!(
                    target: "hub.actor",
                    session_id = %session_id,
                    "Close not queued, relying on cancellation"
                );
            }
        }

        metrics::set_connections_active(0);
        metrics::set_rooms_active(0);
    }
}
