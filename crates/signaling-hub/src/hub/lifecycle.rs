//! Join, leave and disconnect orchestration.
//!
//! # Session state machine
//!
//! ```text
//! Unattached --join--> Attached(room, is_admin) --leave|disconnect--> Unattached | Terminated
//!                         |  ^
//!                         +--+ join (leave-then-join)
//! ```
//!
//! An explicit leave keeps the connection's slot so it can join again. A
//! disconnect removes the slot. Whichever comes first does the room cleanup;
//! the other finds no attachment and does nothing.

use super::admin::AdminElector;
use super::directory::RoomDirectory;
use super::registry::{Attachment, ConnectionRegistry};
use super::router::{Delivery, RelayOutcome, SignalRouter};
use super::{HubStats, RoomInfo, RoomMember};
use crate::observability::metrics;
use crate::protocol::{ClientEvent, RelayKind};
use crate::types::{RoomId, SessionId};
use serde_json::value::RawValue;
use tracing::{debug, info, warn};

/// Why a session is leaving its room.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaveCause {
    /// `leave-room` event.
    Explicit,
    /// Second `join-room` while attached.
    Rejoin,
    /// Transport closed.
    Disconnect,
}

impl LeaveCause {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            LeaveCause::Explicit => "explicit",
            LeaveCause::Rejoin => "rejoin",
            LeaveCause::Disconnect => "disconnect",
        }
    }
}

/// All mutable signaling state of one hub process.
#[derive(Debug, Default)]
pub struct HubState {
    registry: ConnectionRegistry,
    directory: RoomDirectory,
    admins: AdminElector,
}

impl HubState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new connection as an unattached session.
    pub fn connect(&mut self, session_id: SessionId) -> bool {
        let registered = self.registry.register(session_id);
        if registered {
            metrics::set_connections_active(self.registry.len());
            debug!(target: "hub.lifecycle", session_id = %session_id, "Session registered");
        }
        registered
    }

    /// Dispatch one inbound event from `session_id`.
    pub fn handle(&mut self, session_id: SessionId, event: ClientEvent) -> Vec<Delivery> {
        match event {
            ClientEvent::JoinRoom {
                room_id,
                participant_id,
                participant_name,
            } => self.join(session_id, room_id, participant_id, participant_name),
            ClientEvent::LeaveRoom => self.leave(session_id, LeaveCause::Explicit),
            ClientEvent::Relay { kind, to, payload } => self.relay(session_id, kind, to, payload),
        }
    }

    /// Attach a session to a room, leaving its current room first.
    pub fn join(
        &mut self,
        session_id: SessionId,
        room_id: RoomId,
        participant_id: String,
        participant_name: String,
    ) -> Vec<Delivery> {
        if self.registry.lookup(&session_id).is_none() {
            warn!(
                target: "hub.lifecycle",
                session_id = %session_id,
                "Join from unregistered session ignored"
            );
            return Vec::new();
        }

        let mut deliveries = self.leave(session_id, LeaveCause::Rejoin);

        let outcome = self.directory.join_room(&room_id, session_id);
        let attachment = Attachment {
            room_id: room_id.clone(),
            participant_id,
            participant_name,
            is_admin: outcome.is_admin,
        };
        if let Err(e) = self.registry.attach(session_id, attachment) {
            // Roll back so the directory never holds a session the registry lacks
            self.directory.leave_room(&room_id, &session_id);
            warn!(target: "hub.lifecycle", error = %e, "Attach failed during join");
            return deliveries;
        }
        if outcome.is_new_room {
            self.admins.on_room_created(&room_id, session_id);
        }

        deliveries.extend(SignalRouter::announce_join(
            &self.registry,
            &self.directory,
            &room_id,
            session_id,
            outcome.is_admin,
        ));

        metrics::record_join();
        metrics::set_rooms_active(self.directory.room_count());

        info!(
            target: "hub.lifecycle",
            session_id = %session_id,
            room_id = %room_id,
            is_admin = outcome.is_admin,
            room_size = self.directory.members(&room_id, None).len(),
            "Session joined room"
        );

        deliveries
    }

    /// Detach a session from its room.
    ///
    /// A no-op when the session has no attachment, which makes leave and
    /// disconnect idempotent with each other.
    pub fn leave(&mut self, session_id: SessionId, cause: LeaveCause) -> Vec<Delivery> {
        let session = match cause {
            LeaveCause::Explicit | LeaveCause::Rejoin => self.registry.detach(&session_id),
            LeaveCause::Disconnect => self.registry.remove(&session_id),
        };

        let Some(attachment) = session.and_then(|s| s.attachment) else {
            debug!(
                target: "hub.lifecycle",
                session_id = %session_id,
                cause = cause.as_str(),
                "Leave for unattached session ignored"
            );
            return Vec::new();
        };

        let room_id = attachment.room_id;
        let outcome = self.directory.leave_room(&room_id, &session_id);
        if !outcome.was_member {
            warn!(
                target: "hub.lifecycle",
                session_id = %session_id,
                room_id = %room_id,
                "Attached session missing from room, nothing to announce"
            );
            return Vec::new();
        }
        let promoted = self
            .admins
            .reelect(&room_id, &session_id, &outcome, &mut self.registry);

        let mut deliveries = SignalRouter::announce_leave(&outcome.remaining, session_id);

        if let Some(new_admin) = promoted {
            deliveries.push(SignalRouter::admin_promoted(new_admin));
            metrics::record_admin_promotion();
            info!(
                target: "hub.lifecycle",
                room_id = %room_id,
                session_id = %new_admin,
                "Admin promoted"
            );
        }

        metrics::record_leave(cause.as_str());
        metrics::set_rooms_active(self.directory.room_count());

        info!(
            target: "hub.lifecycle",
            session_id = %session_id,
            room_id = %room_id,
            cause = cause.as_str(),
            room_size = outcome.remaining.len(),
            room_deleted = outcome.room_deleted,
            "Session left room"
        );

        deliveries
    }

    /// Transport closed: leave the room (if any) and drop the slot.
    pub fn disconnect(&mut self, session_id: SessionId) -> Vec<Delivery> {
        let deliveries = self.leave(session_id, LeaveCause::Disconnect);
        metrics::set_connections_active(self.registry.len());
        deliveries
    }

    fn relay(
        &mut self,
        from: SessionId,
        kind: RelayKind,
        to: SessionId,
        payload: Box<RawValue>,
    ) -> Vec<Delivery> {
        let outcome = SignalRouter::relay(&self.registry, kind, from, to, payload);
        metrics::record_relay(kind.as_str(), outcome.as_str());

        match outcome {
            RelayOutcome::Delivered(delivery) => vec![delivery],
            dropped => {
                debug!(
                    target: "hub.router",
                    from = %from,
                    to = %to,
                    kind = kind.as_str(),
                    outcome = dropped.as_str(),
                    "Relay dropped"
                );
                Vec::new()
            }
        }
    }

    /// Snapshot of one room, `None` if it does not exist.
    #[must_use]
    pub fn room_info(&self, room_id: &RoomId) -> Option<RoomInfo> {
        if !self.directory.contains(room_id) {
            return None;
        }

        let participants: Vec<RoomMember> = self
            .directory
            .members(room_id, None)
            .iter()
            .filter_map(|id| self.registry.attachment(id))
            .map(|a| RoomMember {
                participant_id: a.participant_id.clone(),
                participant_name: a.participant_name.clone(),
            })
            .collect();

        Some(RoomInfo {
            room_id: room_id.clone(),
            participant_count: participants.len(),
            participants,
        })
    }

    #[must_use]
    pub fn stats(&self) -> HubStats {
        HubStats {
            room_count: self.directory.room_count(),
            participant_count: self.registry.attached_count(),
            connection_count: self.registry.len(),
        }
    }

    /// Verify the cross-component invariants, returning the first violation.
    #[cfg(test)]
    pub(crate) fn check_invariants(&self) -> Result<(), String> {
        for (room_id, members) in self.directory.rooms() {
            if members.is_empty() {
                return Err(format!("room {room_id} exists with no members"));
            }

            let admin = self
                .admins
                .admin_of(room_id)
                .ok_or_else(|| format!("room {room_id} has no admin"))?;
            if !members.contains(&admin) {
                return Err(format!("admin of {room_id} is not a member"));
            }

            for id in members {
                let attachment = self
                    .registry
                    .attachment(id)
                    .ok_or_else(|| format!("member {id} of {room_id} is not attached"))?;
                if &attachment.room_id != room_id {
                    return Err(format!("member {id} is attached to another room"));
                }
                if attachment.is_admin != (*id == admin) {
                    return Err(format!("admin flag of {id} disagrees with elector"));
                }
            }
        }

        for (room_id, _) in self.admins.iter() {
            if !self.directory.contains(room_id) {
                return Err(format!("admin record outlived room {room_id}"));
            }
        }

        for session in self.registry.iter() {
            if let Some(room_id) = session.room_id() {
                if !self
                    .directory
                    .members(room_id, None)
                    .contains(&session.session_id)
                {
                    return Err(format!(
                        "session {} attached to {room_id} but not a member",
                        session.session_id
                    ));
                }
            }
        }

        Ok(())
    }
}
