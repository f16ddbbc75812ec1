//! Wire protocol for the signaling channel.
//!
//! Every WebSocket text frame carries one named event:
//!
//! ```json
//! {"event": "join-room",
//!  "data": {"roomId": "r1", "participantId": "p1", "participantName": "Ada"}}
//! ```
//!
//! Negotiation payloads (`offer`, `answer`, `candidate`) are kept as raw JSON
//! and re-emitted verbatim. The hub never looks inside them.

use crate::types::{RoomId, SessionId};
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;
use thiserror::Error;

/// Kind of negotiation message being relayed between two peers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayKind {
    Offer,
    Answer,
    IceCandidate,
}

impl RelayKind {
    /// Event name on the wire (also used as a metric label).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            RelayKind::Offer => "offer",
            RelayKind::Answer => "answer",
            RelayKind::IceCandidate => "ice-candidate",
        }
    }
}

/// An inbound event from a client, after validation.
#[derive(Debug, Clone)]
pub enum ClientEvent {
    JoinRoom {
        room_id: RoomId,
        participant_id: String,
        participant_name: String,
    },
    LeaveRoom,
    Relay {
        kind: RelayKind,
        to: SessionId,
        payload: Box<RawValue>,
    },
}

impl ClientEvent {
    /// Wire name of this event.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            ClientEvent::JoinRoom { .. } => "join-room",
            ClientEvent::LeaveRoom => "leave-room",
            ClientEvent::Relay { kind, .. } => kind.as_str(),
        }
    }

    /// Decode one text frame.
    ///
    /// Any failure is a validation error: the caller drops the frame and keeps
    /// the connection open.
    pub fn parse(text: &str) -> Result<Self, ProtocolError> {
        let envelope: Envelope<'_> = serde_json::from_str(text).map_err(ProtocolError::Envelope)?;

        match envelope.event.as_str() {
            "join-room" => {
                let data: JoinRoomData = decode_payload("join-room", envelope.data)?;
                let room_id = RoomId::new(data.room_id);
                if room_id.is_blank() {
                    return Err(ProtocolError::InvalidField("roomId"));
                }
                if data.participant_id.trim().is_empty() {
                    return Err(ProtocolError::InvalidField("participantId"));
                }
                Ok(ClientEvent::JoinRoom {
                    room_id,
                    participant_id: data.participant_id,
                    participant_name: data.participant_name,
                })
            }
            "leave-room" => Ok(ClientEvent::LeaveRoom),
            "offer" => decode_relay(RelayKind::Offer, envelope.data),
            "answer" => decode_relay(RelayKind::Answer, envelope.data),
            "ice-candidate" => decode_relay(RelayKind::IceCandidate, envelope.data),
            other => Err(ProtocolError::UnknownEvent(other.to_string())),
        }
    }
}

/// Errors decoding an inbound frame.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("Malformed event envelope: {0}")]
    Envelope(#[source] serde_json::Error),

    #[error("Unknown event: {0}")]
    UnknownEvent(String),

    #[error("Missing payload for {0}")]
    MissingPayload(&'static str),

    #[error("Invalid payload for {event}: {source}")]
    InvalidPayload {
        event: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid field: {0}")]
    InvalidField(&'static str),
}

impl ProtocolError {
    /// Bounded reason label for metrics.
    #[must_use]
    pub const fn reason(&self) -> &'static str {
        match self {
            ProtocolError::Envelope(_) => "malformed_envelope",
            ProtocolError::UnknownEvent(_) => "unknown_event",
            ProtocolError::MissingPayload(_) => "missing_payload",
            ProtocolError::InvalidPayload { .. } => "invalid_payload",
            ProtocolError::InvalidField(_) => "invalid_field",
        }
    }
}

#[derive(Deserialize)]
struct Envelope<'a> {
    event: String,
    #[serde(borrow, default)]
    data: Option<&'a RawValue>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct JoinRoomData {
    room_id: String,
    participant_id: String,
    participant_name: String,
}

/// Shared shape of `offer`, `answer` and `ice-candidate` payloads.
///
/// `room` is accepted for client compatibility but routing uses only `to`.
#[derive(Deserialize)]
struct RelayData<'a> {
    to: SessionId,
    #[serde(borrow, default)]
    offer: Option<&'a RawValue>,
    #[serde(borrow, default)]
    answer: Option<&'a RawValue>,
    #[serde(borrow, default)]
    candidate: Option<&'a RawValue>,
    #[serde(default)]
    #[allow(dead_code)]
    room: Option<String>,
}

fn decode_payload<'a, T: Deserialize<'a>>(
    event: &'static str,
    data: Option<&'a RawValue>,
) -> Result<T, ProtocolError> {
    let raw = data.ok_or(ProtocolError::MissingPayload(event))?;
    serde_json::from_str(raw.get())
        .map_err(|source| ProtocolError::InvalidPayload { event, source })
}

fn decode_relay(kind: RelayKind, data: Option<&RawValue>) -> Result<ClientEvent, ProtocolError> {
    let event = kind.as_str();
    let relay: RelayData<'_> = decode_payload(event, data)?;

    let (field, payload) = match kind {
        RelayKind::Offer => ("offer", relay.offer),
        RelayKind::Answer => ("answer", relay.answer),
        RelayKind::IceCandidate => ("candidate", relay.candidate),
    };
    let payload = payload.ok_or(ProtocolError::InvalidField(field))?;

    Ok(ClientEvent::Relay {
        kind,
        to: relay.to,
        payload: payload.to_owned(),
    })
}

/// Roster entry sent to a joining session.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantSummary {
    pub participant_id: String,
    pub participant_name: String,
    pub session_id: SessionId,
    pub is_admin: bool,
}

/// Payload of `room-participants`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomParticipants {
    pub participants: Vec<ParticipantSummary>,
    pub is_admin: bool,
}

/// An outbound event to one connection.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ServerEvent {
    UserJoined(SessionId),
    RoomParticipants(RoomParticipants),
    Offer { offer: Box<RawValue>, from: SessionId },
    Answer { answer: Box<RawValue>, from: SessionId },
    IceCandidate { candidate: Box<RawValue>, from: SessionId },
    UserLeft(SessionId),
    AdminPromoted {},
}

impl ServerEvent {
    /// Build the relayed form of a negotiation payload.
    #[must_use]
    pub fn relayed(kind: RelayKind, payload: Box<RawValue>, from: SessionId) -> Self {
        match kind {
            RelayKind::Offer => ServerEvent::Offer {
                offer: payload,
                from,
            },
            RelayKind::Answer => ServerEvent::Answer {
                answer: payload,
                from,
            },
            RelayKind::IceCandidate => ServerEvent::IceCandidate {
                candidate: payload,
                from,
            },
        }
    }

    /// Wire name of this event.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            ServerEvent::UserJoined(_) => "user-joined",
            ServerEvent::RoomParticipants(_) => "room-participants",
            ServerEvent::Offer { .. } => "offer",
            ServerEvent::Answer { .. } => "answer",
            ServerEvent::IceCandidate { .. } => "ice-candidate",
            ServerEvent::UserLeft(_) => "user-left",
            ServerEvent::AdminPromoted {} => "admin-promoted",
        }
    }

    /// Encode as a text frame.
    pub fn to_text(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
