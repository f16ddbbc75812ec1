//! # Hub Test Utilities
//!
//! Shared test utilities for the signaling hub.
//!
//! ## Modules
//!
//! - `server` - In-process hub bound to an ephemeral port
//! - `client` - WebSocket client speaking the signaling protocol
//! - `fixtures` - Pre-built event frames and participants
//!
//! ## Usage
//!
//! ```rust,ignore
//! use hub_test_utils::*;
//!
//! #[tokio::test]
//! async fn test_example() {
//!     let server = TestServer::start().await;
//!     let mut alice = TestClient::connect(&server.ws_url()).await;
//!
//!     alice.send(join_room("standup", &TestParticipant::new("alice"))).await;
//!     let roster = alice.expect_event("room-participants").await;
//!     assert_eq!(roster["data"]["isAdmin"], true);
//!
//!     server.shutdown().await;
//! }
//! ```

pub mod client;
pub mod fixtures;
pub mod server;

// Re-export commonly used items
pub use client::*;
pub use fixtures::*;
pub use server::*;
