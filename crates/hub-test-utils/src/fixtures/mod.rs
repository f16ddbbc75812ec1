//! Pre-built event frames and participants.

use serde_json::{json, Value};
use uuid::Uuid;

/// Test participant fixture.
#[derive(Debug, Clone)]
pub struct TestParticipant {
    /// Application-level participant ID.
    pub id: String,
    /// Display name.
    pub name: String,
}

impl TestParticipant {
    /// Create a participant whose ID and name are both `id`.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
        }
    }

    /// Create a participant with a random ID.
    #[must_use]
    pub fn random() -> Self {
        Self::new(format!("participant-{}", Uuid::new_v4()))
    }

    /// Set the display name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

/// Random room ID, so tests sharing a server never collide.
#[must_use]
pub fn random_room() -> String {
    format!("room-{}", Uuid::new_v4())
}

/// `join-room` frame.
#[must_use]
pub fn join_room(room_id: &str, participant: &TestParticipant) -> Value {
    json!({
        "event": "join-room",
        "data": {
            "roomId": room_id,
            "participantId": participant.id,
            "participantName": participant.name,
        }
    })
}

/// `leave-room` frame.
#[must_use]
pub fn leave_room() -> Value {
    json!({"event": "leave-room", "data": {}})
}

/// `offer` frame addressed to `to`.
#[must_use]
pub fn offer(room_id: &str, to: &str, sdp: &str) -> Value {
    json!({
        "event": "offer",
        "data": {"room": room_id, "to": to, "offer": {"type": "offer", "sdp": sdp}}
    })
}

/// `answer` frame addressed to `to`.
#[must_use]
pub fn answer(room_id: &str, to: &str, sdp: &str) -> Value {
    json!({
        "event": "answer",
        "data": {"room": room_id, "to": to, "answer": {"type": "answer", "sdp": sdp}}
    })
}

/// `ice-candidate` frame addressed to `to`.
#[must_use]
pub fn ice_candidate(room_id: &str, to: &str, candidate: &str) -> Value {
    json!({
        "event": "ice-candidate",
        "data": {
            "room": room_id,
            "to": to,
            "candidate": {"candidate": candidate, "sdpMid": "0", "sdpMLineIndex": 0}
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_room_frame_shape() {
        let frame = join_room("r1", &TestParticipant::new("p1").with_name("Ada"));
        assert_eq!(frame["event"], "join-room");
        assert_eq!(frame["data"]["roomId"], "r1");
        assert_eq!(frame["data"]["participantId"], "p1");
        assert_eq!(frame["data"]["participantName"], "Ada");
    }

    #[test]
    fn test_random_rooms_differ() {
        assert_ne!(random_room(), random_room());
    }
}
