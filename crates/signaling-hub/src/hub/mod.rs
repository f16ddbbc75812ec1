//! Core signaling state.
//!
//! [`HubState`] composes the connection registry, room directory and admin
//! elector. It performs no I/O: every operation returns the deliveries the
//! transport should send. The hub actor owns the single instance, so all
//! mutations are serialized by its mailbox.

pub mod admin;
pub mod directory;
pub mod lifecycle;
pub mod registry;
pub mod router;

pub use admin::AdminElector;
pub use directory::{JoinOutcome, LeaveOutcome, RoomDirectory};
pub use lifecycle::{HubState, LeaveCause};
pub use registry::{Attachment, ConnectionRegistry, Session};
pub use router::{Delivery, RelayOutcome, SignalRouter};

use crate::types::RoomId;
use serde::Serialize;

/// Read-only view of one room, served by `GET /rooms/:roomId`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomInfo {
    pub room_id: RoomId,
    pub participant_count: usize,
    pub participants: Vec<RoomMember>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomMember {
    pub participant_id: String,
    pub participant_name: String,
}

/// Hub-wide counters for the health probe.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HubStats {
    /// Rooms with at least one member.
    pub room_count: usize,
    /// Sessions attached to a room.
    pub participant_count: usize,
    /// Open connections, attached or not.
    pub connection_count: usize,
}
