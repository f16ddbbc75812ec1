//! Signaling Hub Library
//!
//! A WebSocket signaling server for multi-party peer-to-peer video rooms.
//! It relays session-negotiation messages (offers, answers, ICE candidates)
//! between participants and tracks which sessions are in which room and
//! which session administers each room. It never carries media.
//!
//! # Architecture
//!
//! ```text
//! WebSocket reader ──events──▶ HubActor (owns HubState)
//!                                 │ ConnectionRegistry
//!                                 │ RoomDirectory
//!                                 │ AdminElector
//!                                 ▼
//!                         per-connection outbox ──▶ ConnectionActor ──▶ socket
//! ```
//!
//! All state lives in memory in one process and is lost on restart.
//!
//! # Modules
//!
//! - [`hub`] - Registry, directory, admin election, routing, lifecycle
//! - [`protocol`] - Inbound and outbound event encoding
//! - [`actors`] - Hub and connection actors
//! - [`transport`] - WebSocket endpoint
//! - [`handlers`] / [`routes`] - HTTP surface
//! - [`config`] - Service configuration from environment
//! - [`errors`] - Error types with HTTP mappings

pub mod actors;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod hub;
pub mod observability;
pub mod protocol;
pub mod routes;
pub mod transport;
pub mod types;
