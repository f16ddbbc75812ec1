//! One administrator session per room.

use super::directory::LeaveOutcome;
use super::registry::ConnectionRegistry;
use crate::types::{RoomId, SessionId};
use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct AdminElector {
    admins: HashMap<RoomId, SessionId>,
}

impl AdminElector {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the creator of a new room as its admin.
    pub fn on_room_created(&mut self, room_id: &RoomId, creator: SessionId) {
        self.admins.insert(room_id.clone(), creator);
    }

    #[must_use]
    pub fn admin_of(&self, room_id: &RoomId) -> Option<SessionId> {
        self.admins.get(room_id).copied()
    }

    /// Apply the admin consequences of a departure.
    ///
    /// - Room deleted: the admin record goes with it, nobody is promoted.
    /// - Departing session was admin and members remain: the earliest-joined
    ///   remaining member becomes admin and its registry flag is set.
    ///
    /// Returns the newly promoted session, if any.
    pub fn reelect(
        &mut self,
        room_id: &RoomId,
        departing: &SessionId,
        outcome: &LeaveOutcome,
        registry: &mut ConnectionRegistry,
    ) -> Option<SessionId> {
        if outcome.room_deleted {
            self.admins.remove(room_id);
            return None;
        }

        if self.admins.get(room_id) != Some(departing) {
            return None;
        }

        let successor = *outcome.remaining.first()?;
        self.admins.insert(room_id.clone(), successor);
        registry.set_admin(&successor, true);
        Some(successor)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&RoomId, &SessionId)> {
        self.admins.iter()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::hub::directory::RoomDirectory;
    use crate::hub::registry::Attachment;

    fn attach(registry: &mut ConnectionRegistry, id: SessionId, room: &RoomId, is_admin: bool) {
        registry.register(id);
        registry
            .attach(
                id,
                Attachment {
                    room_id: room.clone(),
                    participant_id: id.to_string(),
                    participant_name: "n".to_string(),
                    is_admin,
                },
            )
            .unwrap();
    }

    #[test]
    fn test_admin_leaving_promotes_earliest_joined() {
        let room = RoomId::new("r1");
        let (a, b, c) = (SessionId::new(), SessionId::new(), SessionId::new());
        let mut registry = ConnectionRegistry::new();
        let mut directory = RoomDirectory::new();
        let mut elector = AdminElector::new();

        for (id, admin) in [(a, true), (b, false), (c, false)] {
            attach(&mut registry, id, &room, admin);
            directory.join_room(&room, id);
        }
        elector.on_room_created(&room, a);

        let outcome = directory.leave_room(&room, &a);
        let promoted = elector.reelect(&room, &a, &outcome, &mut registry);

        assert_eq!(promoted, Some(b));
        assert_eq!(elector.admin_of(&room), Some(b));
        assert!(registry.attachment(&b).unwrap().is_admin);
        assert!(!registry.attachment(&c).unwrap().is_admin);
    }

    #[test]
    fn test_non_admin_leaving_keeps_admin() {
        let room = RoomId::new("r1");
        let (a, b) = (SessionId::new(), SessionId::new());
        let mut registry = ConnectionRegistry::new();
        let mut directory = RoomDirectory::new();
        let mut elector = AdminElector::new();

        attach(&mut registry, a, &room, true);
        attach(&mut registry, b, &room, false);
        directory.join_room(&room, a);
        directory.join_room(&room, b);
        elector.on_room_created(&room, a);

        let outcome = directory.leave_room(&room, &b);
        assert_eq!(elector.reelect(&room, &b, &outcome, &mut registry), None);
        assert_eq!(elector.admin_of(&room), Some(a));
    }

    #[test]
    fn test_room_deletion_discards_admin_without_promotion() {
        let room = RoomId::new("r1");
        let a = SessionId::new();
        let mut registry = ConnectionRegistry::new();
        let mut directory = RoomDirectory::new();
        let mut elector = AdminElector::new();

        attach(&mut registry, a, &room, true);
        directory.join_room(&room, a);
        elector.on_room_created(&room, a);

        let outcome = directory.leave_room(&room, &a);
        assert_eq!(elector.reelect(&room, &a, &outcome, &mut registry), None);
        assert_eq!(elector.admin_of(&room), None);
        assert_eq!(elector.iter().count(), 0);
    }
}
