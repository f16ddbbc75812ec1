//! Actor mailbox message types.

use crate::errors::HubError;
use crate::hub::{HubStats, RoomInfo};
use crate::protocol::{ClientEvent, ServerEvent};
use crate::types::{RoomId, SessionId};
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;

/// Messages handled by the `HubActor`.
#[derive(Debug)]
pub enum HubMessage {
    /// Register a new connection.
    Connect {
        respond_to: oneshot::Sender<Result<ConnectedSession, HubError>>,
    },

    /// A decoded event from a connection. Fire-and-forget so that events from
    /// one connection are applied in arrival order without a round trip.
    ClientEvent {
        session_id: SessionId,
        event: ClientEvent,
    },

    /// The connection's transport closed.
    Disconnect { session_id: SessionId },

    GetRoomInfo {
        room_id: RoomId,
        respond_to: oneshot::Sender<Result<RoomInfo, HubError>>,
    },

    GetStats {
        respond_to: oneshot::Sender<HubStats>,
    },
}

/// Messages delivered to a `ConnectionActor`.
#[derive(Debug)]
pub enum ConnectionMessage {
    /// Write one event to the socket.
    Deliver(ServerEvent),

    /// Send a close frame and stop.
    Close { reason: &'static str },
}

/// Everything a transport needs to drive a freshly registered connection.
#[derive(Debug)]
pub struct ConnectedSession {
    pub session_id: SessionId,
    /// Outbound events addressed to this connection.
    pub outbox: mpsc::Receiver<ConnectionMessage>,
    /// Child of the hub's token; cancelled on shutdown or by the transport.
    pub cancel_token: CancellationToken,
    /// The hub's root token, cancelled only on server shutdown.
    pub shutdown_token: CancellationToken,
}
