//! Actor model for the signaling hub.
//!
//! ```text
//! HubActor (singleton, owns HubState)
//! └── outbox per connection
//!     └── ConnectionActor (one per WebSocket, writes to the socket)
//! ```
//!
//! The WebSocket reader sends decoded events to the `HubActor`; the
//! `HubActor` answers by filling outboxes; each `ConnectionActor` drains its
//! outbox onto the wire. Cancellation flows from the hub's root token to
//! every connection through child tokens.

pub mod connection;
pub mod hub;
pub mod messages;
pub mod metrics;

pub use connection::{CloseReason, ConnectionActor};
pub use hub::HubActorHandle;
pub use messages::{ConnectedSession, ConnectionMessage, HubMessage};
pub use metrics::{ActorType, MailboxLevel, MailboxMonitor};
