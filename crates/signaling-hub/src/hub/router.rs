//! Targeted relays and room-scoped broadcasts.
//!
//! The router owns no state. It reads the registry and directory and turns a
//! signaling step into a list of [`Delivery`] values for the transport.

use super::directory::RoomDirectory;
use super::registry::ConnectionRegistry;
use crate::protocol::{ParticipantSummary, RelayKind, RoomParticipants, ServerEvent};
use crate::types::{RoomId, SessionId};
use serde_json::value::RawValue;

/// One outbound event addressed to one connection.
#[derive(Debug, Clone)]
pub struct Delivery {
    pub to: SessionId,
    pub event: ServerEvent,
}

impl Delivery {
    #[must_use]
    pub fn new(to: SessionId, event: ServerEvent) -> Self {
        Self { to, event }
    }
}

/// What happened to a relay request.
#[derive(Debug, Clone)]
pub enum RelayOutcome {
    Delivered(Delivery),
    /// Sender is not in any room.
    SenderUnattached,
    /// Target is unknown, gone, or not in any room.
    TargetUnavailable,
}

impl RelayOutcome {
    /// Bounded label for metrics.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            RelayOutcome::Delivered(_) => "delivered",
            RelayOutcome::SenderUnattached => "sender_unattached",
            RelayOutcome::TargetUnavailable => "target_unavailable",
        }
    }
}

pub struct SignalRouter;

impl SignalRouter {
    /// Forward a negotiation payload, unchanged, from one attached session to
    /// another. Anything else is dropped without an error.
    #[must_use]
    pub fn relay(
        registry: &ConnectionRegistry,
        kind: RelayKind,
        from: SessionId,
        to: SessionId,
        payload: Box<RawValue>,
    ) -> RelayOutcome {
        if registry.attachment(&from).is_none() {
            return RelayOutcome::SenderUnattached;
        }
        if registry.attachment(&to).is_none() {
            return RelayOutcome::TargetUnavailable;
        }
        RelayOutcome::Delivered(Delivery::new(
            to,
            ServerEvent::relayed(kind, payload, from),
        ))
    }

    /// `user-joined` to every other member, then the roster to the joiner.
    #[must_use]
    pub fn announce_join(
        registry: &ConnectionRegistry,
        directory: &RoomDirectory,
        room_id: &RoomId,
        joiner: SessionId,
        joiner_is_admin: bool,
    ) -> Vec<Delivery> {
        let others = directory.members(room_id, Some(&joiner));

        let participants = others
            .iter()
            .filter_map(|id| {
                let attachment = registry.attachment(id)?;
                Some(ParticipantSummary {
                    participant_id: attachment.participant_id.clone(),
                    participant_name: attachment.participant_name.clone(),
                    session_id: *id,
                    is_admin: attachment.is_admin,
                })
            })
            .collect();

        let mut deliveries: Vec<Delivery> = others
            .iter()
            .map(|id| Delivery::new(*id, ServerEvent::UserJoined(joiner)))
            .collect();

        deliveries.push(Delivery::new(
            joiner,
            ServerEvent::RoomParticipants(RoomParticipants {
                participants,
                is_admin: joiner_is_admin,
            }),
        ));

        deliveries
    }

    /// `user-left` to every remaining member.
    ///
    /// `remaining` must be taken after the directory removal so the departing
    /// session is not among the recipients.
    #[must_use]
    pub fn announce_leave(remaining: &[SessionId], departing: SessionId) -> Vec<Delivery> {
        remaining
            .iter()
            .filter(|id| **id != departing)
            .map(|id| Delivery::new(*id, ServerEvent::UserLeft(departing)))
            .collect()
    }

    #[must_use]
    pub fn admin_promoted(session_id: SessionId) -> Delivery {
        Delivery::new(session_id, ServerEvent::AdminPromoted {})
    }
}
