//! Live connection to session mapping.

use crate::errors::HubError;
use crate::types::{RoomId, SessionId};
use std::collections::HashMap;

/// The room-scoped part of a session, present only while attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub room_id: RoomId,
    pub participant_id: String,
    pub participant_name: String,
    pub is_admin: bool,
}

/// Server-side record for one live connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub session_id: SessionId,
    pub attachment: Option<Attachment>,
}

impl Session {
    /// Room this session is attached to, if any.
    #[must_use]
    pub fn room_id(&self) -> Option<&RoomId> {
        self.attachment.as_ref().map(|a| &a.room_id)
    }
}

/// Owns every [`Session`], keyed by the connection's id.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    sessions: HashMap<SessionId, Session>,
}

impl ConnectionRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an unattached slot. Returns `false` if the id is already registered.
    pub fn register(&mut self, session_id: SessionId) -> bool {
        if self.sessions.contains_key(&session_id) {
            return false;
        }
        self.sessions.insert(
            session_id,
            Session {
                session_id,
                attachment: None,
            },
        );
        true
    }

    /// Populate a slot with its room attachment, replacing any previous one.
    pub fn attach(
        &mut self,
        session_id: SessionId,
        attachment: Attachment,
    ) -> Result<(), HubError> {
        let session = self
            .sessions
            .get_mut(&session_id)
            .ok_or(HubError::SessionNotFound(session_id))?;
        session.attachment = Some(attachment);
        Ok(())
    }

    #[must_use]
    pub fn lookup(&self, session_id: &SessionId) -> Option<&Session> {
        self.sessions.get(session_id)
    }

    /// Attachment of a session, `None` if unknown or unattached.
    #[must_use]
    pub fn attachment(&self, session_id: &SessionId) -> Option<&Attachment> {
        self.sessions.get(session_id)?.attachment.as_ref()
    }

    /// Clear the attachment but keep the slot.
    ///
    /// Returns the session as it was while attached, or `None` if the slot is
    /// missing or already unattached. A second call is therefore a no-op.
    pub fn detach(&mut self, session_id: &SessionId) -> Option<Session> {
        let session = self.sessions.get_mut(session_id)?;
        let attachment = session.attachment.take()?;
        Some(Session {
            session_id: *session_id,
            attachment: Some(attachment),
        })
    }

    /// Delete the slot, returning the removed record for cascade cleanup.
    pub fn remove(&mut self, session_id: &SessionId) -> Option<Session> {
        self.sessions.remove(session_id)
    }

    /// Update the admin flag of an attached session.
    ///
    /// Returns `false` if the session is unknown or unattached.
    pub fn set_admin(&mut self, session_id: &SessionId, is_admin: bool) -> bool {
        match self
            .sessions
            .get_mut(session_id)
            .and_then(|s| s.attachment.as_mut())
        {
            Some(attachment) => {
                attachment.is_admin = is_admin;
                true
            }
            None => false,
        }
    }

    /// Number of registered connections.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Number of sessions currently attached to a room.
    #[must_use]
    pub fn attached_count(&self) -> usize {
        self.sessions
            .values()
            .filter(|s| s.attachment.is_some())
            .count()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Session> {
        self.sessions.values()
    }
}
