//! Room membership.
//!
//! Members are kept in join order so admin re-election can pick the
//! earliest-joined remaining member.

use crate::types::{RoomId, SessionId};
use std::collections::HashMap;

/// Result of adding a session to a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JoinOutcome {
    /// The room did not exist before this join.
    pub is_new_room: bool,
    /// The joiner is the room's admin (true exactly when the room is new).
    pub is_admin: bool,
}

/// Result of removing a session from a room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaveOutcome {
    /// Members left behind, in join order.
    pub remaining: Vec<SessionId>,
    /// The room was deleted because it became empty.
    pub room_deleted: bool,
    /// The session was actually a member.
    pub was_member: bool,
}

#[derive(Debug, Default)]
pub struct RoomDirectory {
    rooms: HashMap<RoomId, Vec<SessionId>>,
}

impl RoomDirectory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a session to a room, creating the room if absent.
    pub fn join_room(&mut self, room_id: &RoomId, session_id: SessionId) -> JoinOutcome {
        let is_new_room = !self.rooms.contains_key(room_id);
        let members = self.rooms.entry(room_id.clone()).or_default();
        if !members.contains(&session_id) {
            members.push(session_id);
        }
        JoinOutcome {
            is_new_room,
            is_admin: is_new_room,
        }
    }

    /// Remove a session; deletes the room when its last member goes.
    pub fn leave_room(&mut self, room_id: &RoomId, session_id: &SessionId) -> LeaveOutcome {
        let Some(members) = self.rooms.get_mut(room_id) else {
            return LeaveOutcome {
                remaining: Vec::new(),
                room_deleted: false,
                was_member: false,
            };
        };

        let before = members.len();
        members.retain(|id| id != session_id);
        let was_member = members.len() != before;
        let remaining = members.clone();

        let room_deleted = remaining.is_empty();
        if room_deleted {
            self.rooms.remove(room_id);
        }

        LeaveOutcome {
            remaining,
            room_deleted,
            was_member,
        }
    }

    /// Point-in-time copy of a room's members in join order, optionally
    /// without one session. Empty if the room does not exist.
    #[must_use]
    pub fn members(&self, room_id: &RoomId, excluding: Option<&SessionId>) -> Vec<SessionId> {
        self.rooms
            .get(room_id)
            .map(|members| {
                members
                    .iter()
                    .filter(|id| Some(*id) != excluding)
                    .copied()
                    .collect()
            })
            .unwrap_or_default()
    }

    #[must_use]
    pub fn contains(&self, room_id: &RoomId) -> bool {
        self.rooms.contains_key(room_id)
    }

    #[must_use]
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    pub fn rooms(&self) -> impl Iterator<Item = (&RoomId, &[SessionId])> {
        self.rooms.iter().map(|(id, members)| (id, members.as_slice()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_first_join_creates_room_with_admin() {
        let mut directory = RoomDirectory::new();
        let room = RoomId::new("r1");
        let a = SessionId::new();

        let outcome = directory.join_room(&room, a);
        assert_eq!(
            outcome,
            JoinOutcome {
                is_new_room: true,
                is_admin: true
            }
        );
        assert!(directory.contains(&room));
        assert_eq!(directory.room_count(), 1);
    }

    #[test]
    fn test_second_join_is_not_admin() {
        let mut directory = RoomDirectory::new();
        let room = RoomId::new("r1");
        directory.join_room(&room, SessionId::new());

        let outcome = directory.join_room(&room, SessionId::new());
        assert!(!outcome.is_new_room);
        assert!(!outcome.is_admin);
        assert_eq!(directory.members(&room, None).len(), 2);
    }

    #[test]
    fn test_members_snapshot_keeps_join_order_and_exclusion() {
        let mut directory = RoomDirectory::new();
        let room = RoomId::new("r1");
        let (a, b, c) = (SessionId::new(), SessionId::new(), SessionId::new());
        directory.join_room(&room, a);
        directory.join_room(&room, b);
        directory.join_room(&room, c);

        assert_eq!(directory.members(&room, None), vec![a, b, c]);
        assert_eq!(directory.members(&room, Some(&b)), vec![a, c]);

        let snapshot = directory.members(&room, None);
        directory.leave_room(&room, &a);
        assert_eq!(snapshot.len(), 3);
    }

    #[test]
    fn test_members_of_unknown_room_is_empty() {
        let directory = RoomDirectory::new();
        assert!(directory.members(&RoomId::new("nope"), None).is_empty());
    }

    #[test]
    fn test_last_leave_deletes_room() {
        let mut directory = RoomDirectory::new();
        let room = RoomId::new("r1");
        let (a, b) = (SessionId::new(), SessionId::new());
        directory.join_room(&room, a);
        directory.join_room(&room, b);

        let outcome = directory.leave_room(&room, &a);
        assert_eq!(outcome.remaining, vec![b]);
        assert!(!outcome.room_deleted);
        assert!(outcome.was_member);

        let outcome = directory.leave_room(&room, &b);
        assert!(outcome.remaining.is_empty());
        assert!(outcome.room_deleted);
        assert!(!directory.contains(&room));
        assert_eq!(directory.room_count(), 0);
    }

    #[test]
    fn test_leave_unknown_room_or_member_is_noop() {
        let mut directory = RoomDirectory::new();
        let room = RoomId::new("r1");
        let a = SessionId::new();

        let outcome = directory.leave_room(&room, &a);
        assert!(!outcome.was_member);
        assert!(!outcome.room_deleted);

        directory.join_room(&room, a);
        let outcome = directory.leave_room(&room, &SessionId::new());
        assert!(!outcome.was_member);
        assert_eq!(outcome.remaining, vec![a]);
        assert!(directory.contains(&room));
    }

    #[test]
    fn test_duplicate_join_does_not_duplicate_member() {
        let mut directory = RoomDirectory::new();
        let room = RoomId::new("r1");
        let a = SessionId::new();
        directory.join_room(&room, a);
        directory.join_room(&room, a);
        assert_eq!(directory.members(&room, None), vec![a]);
    }
}
