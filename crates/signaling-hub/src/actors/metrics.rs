//! Mailbox monitoring for the hub and connection actors.
//!
//! | Actor Type | Normal | Warning | Critical |
//! |------------|--------|---------|----------|
//! | Hub        | < 100  | 100-500 | > 500    |
//! | Connection | < 50   | 50-200  | > 200    |

use crate::observability::metrics;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use tracing::{debug, warn};

/// Mailbox depth thresholds for the hub actor.
pub const HUB_MAILBOX_NORMAL: usize = 100;
pub const HUB_MAILBOX_WARNING: usize = 500;

/// Mailbox depth thresholds for connection actors.
pub const CONNECTION_MAILBOX_NORMAL: usize = 50;
pub const CONNECTION_MAILBOX_WARNING: usize = 200;

/// Actor type for metrics labeling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActorType {
    /// HubActor (singleton).
    Hub,
    /// ConnectionActor (one per WebSocket).
    Connection,
}

impl ActorType {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            ActorType::Hub => "hub",
            ActorType::Connection => "connection",
        }
    }

    #[must_use]
    pub const fn warning_threshold(&self) -> usize {
        match self {
            ActorType::Hub => HUB_MAILBOX_WARNING,
            ActorType::Connection => CONNECTION_MAILBOX_WARNING,
        }
    }

    #[must_use]
    pub const fn normal_threshold(&self) -> usize {
        match self {
            ActorType::Hub => HUB_MAILBOX_NORMAL,
            ActorType::Connection => CONNECTION_MAILBOX_NORMAL,
        }
    }
}

/// Mailbox depth level for alerting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MailboxLevel {
    Normal,
    Warning,
    Critical,
}

/// Tracks queue depth observed each time an actor takes a message.
#[derive(Debug)]
pub struct MailboxMonitor {
    actor_type: ActorType,
    actor_id: String,
    depth: AtomicUsize,
    peak_depth: AtomicUsize,
    messages_processed: AtomicU64,
}

impl MailboxMonitor {
    #[must_use]
    pub fn new(actor_type: ActorType, actor_id: impl Into<String>) -> Self {
        Self {
            actor_type,
            actor_id: actor_id.into(),
            depth: AtomicUsize::new(0),
            peak_depth: AtomicUsize::new(0),
            messages_processed: AtomicU64::new(0),
        }
    }

    /// Record one message taken from the mailbox with `remaining` still queued.
    pub fn record_dequeue(&self, remaining: usize) {
        self.messages_processed.fetch_add(1, Ordering::Relaxed);
        let previous = self.depth.swap(remaining, Ordering::Relaxed);
        self.peak_depth.fetch_max(remaining, Ordering::Relaxed);

        if self.actor_type == ActorType::Hub {
            metrics::set_mailbox_depth(remaining);
        }

        match self.level_for_depth(remaining) {
            MailboxLevel::Critical => {
                warn!(
                    target: "hub.actor.mailbox",
                    actor_type = self.actor_type.as_str(),
                    actor_id = %self.actor_id,
                    depth = remaining,
                    threshold = self.actor_type.warning_threshold(),
                    "Mailbox depth critical"
                );
            }
            // Log once when crossing into the warning band
            MailboxLevel::Warning if previous <= self.actor_type.normal_threshold() => {
                debug!(
                    target: "hub.actor.mailbox",
                    actor_type = self.actor_type.as_str(),
                    actor_id = %self.actor_id,
                    depth = remaining,
                    "Mailbox depth elevated"
                );
            }
            _ => {}
        }
    }

    #[must_use]
    pub fn current_depth(&self) -> usize {
        self.depth.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn peak_depth(&self) -> usize {
        self.peak_depth.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn messages_processed(&self) -> u64 {
        self.messages_processed.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn current_level(&self) -> MailboxLevel {
        self.level_for_depth(self.current_depth())
    }

    fn level_for_depth(&self, depth: usize) -> MailboxLevel {
        if depth > self.actor_type.warning_threshold() {
            MailboxLevel::Critical
        } else if depth > self.actor_type.normal_threshold() {
            MailboxLevel::Warning
        } else {
            MailboxLevel::Normal
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_actor_type_as_str() {
        assert_eq!(ActorType::Hub.as_str(), "hub");
        assert_eq!(ActorType::Connection.as_str(), "connection");
    }

    #[test]
    fn test_mailbox_monitor_tracks_depth_and_peak() {
        let monitor = MailboxMonitor::new(ActorType::Hub, "hub");

        monitor.record_dequeue(3);
        monitor.record_dequeue(10);
        monitor.record_dequeue(0);

        assert_eq!(monitor.current_depth(), 0);
        assert_eq!(monitor.peak_depth(), 10);
        assert_eq!(monitor.messages_processed(), 3);
    }

    #[test]
    fn test_mailbox_monitor_levels() {
        let monitor = MailboxMonitor::new(ActorType::Hub, "hub");

        monitor.record_dequeue(HUB_MAILBOX_NORMAL);
        assert_eq!(monitor.current_level(), MailboxLevel::Normal);

        monitor.record_dequeue(HUB_MAILBOX_NORMAL + 1);
        assert_eq!(monitor.current_level(), MailboxLevel::Warning);

        monitor.record_dequeue(HUB_MAILBOX_WARNING + 1);
        assert_eq!(monitor.current_level(), MailboxLevel::Critical);
    }

    #[test]
    fn test_mailbox_monitor_connection_thresholds() {
        let monitor = MailboxMonitor::new(ActorType::Connection, "conn-1");

        monitor.record_dequeue(CONNECTION_MAILBOX_NORMAL + 1);
        assert_eq!(monitor.current_level(), MailboxLevel::Warning);

        monitor.record_dequeue(CONNECTION_MAILBOX_WARNING + 1);
        assert_eq!(monitor.current_level(), MailboxLevel::Critical);
    }
}
