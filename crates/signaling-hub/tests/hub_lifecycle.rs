//! Room lifecycle through the hub actor handle.
//!
//! Drives the hub the way the WebSocket transport does (connect, events,
//! disconnect) and reads each session's outbox directly, without sockets.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::time::Duration;

use serde_json::value::RawValue;
use serde_json::Value;
use signaling_hub::actors::{ConnectedSession, ConnectionMessage, HubActorHandle};
use signaling_hub::errors::HubError;
use signaling_hub::protocol::{ClientEvent, RelayKind};
use signaling_hub::types::{RoomId, SessionId};
use tokio_util::sync::CancellationToken;

// ============================================================================
// Helpers
// ============================================================================

fn spawn_hub() -> (HubActorHandle, CancellationToken) {
    let cancel = CancellationToken::new();
    let (hub, _task) = HubActorHandle::spawn(128, 32, cancel.clone());
    (hub, cancel)
}

async fn join(hub: &HubActorHandle, session: SessionId, room: &str, participant: &str) {
    hub.client_event(
        session,
        ClientEvent::JoinRoom {
            room_id: RoomId::new(room),
            participant_id: participant.to_string(),
            participant_name: participant.to_uppercase(),
        },
    )
    .await
    .unwrap();
}

async fn relay(hub: &HubActorHandle, from: SessionId, to: SessionId, kind: RelayKind, json: &str) {
    hub.client_event(
        from,
        ClientEvent::Relay {
            kind,
            to,
            payload: RawValue::from_string(json.to_string()).unwrap(),
        },
    )
    .await
    .unwrap();
}

/// Round-trip through the mailbox so every earlier event has been applied.
async fn settle(hub: &HubActorHandle) {
    hub.stats().await.unwrap();
}

/// Drain the outbox, returning each delivered event as JSON.
fn drain(session: &mut ConnectedSession) -> Vec<Value> {
    let mut events = Vec::new();
    while let Ok(message) = session.outbox.try_recv() {
        match message {
            ConnectionMessage::Deliver(event) => {
                events.push(serde_json::from_str(&event.to_text().unwrap()).unwrap());
            }
            ConnectionMessage::Close { reason } => panic!("unexpected close: {reason}"),
        }
    }
    events
}

fn names(events: &[Value]) -> Vec<&str> {
    events.iter().map(|e| e["event"].as_str().unwrap()).collect()
}

// ============================================================================
// Lifecycle
// ============================================================================

#[tokio::test]
async fn test_three_party_room_with_admin_handover() {
    let (hub, cancel) = spawn_hub();
    let mut a = hub.connect().await.unwrap();
    let mut b = hub.connect().await.unwrap();
    let mut c = hub.connect().await.unwrap();

    join(&hub, a.session_id, "standup", "a").await;
    join(&hub, b.session_id, "standup", "b").await;
    join(&hub, c.session_id, "standup", "c").await;
    settle(&hub).await;

    let a_events = drain(&mut a);
    assert_eq!(names(&a_events), ["room-participants", "user-joined", "user-joined"]);
    assert_eq!(a_events[0]["data"]["isAdmin"], true);
    assert_eq!(a_events[0]["data"]["participants"], serde_json::json!([]));

    let c_events = drain(&mut c);
    assert_eq!(names(&c_events), ["room-participants"]);
    let roster = c_events[0]["data"]["participants"].as_array().unwrap();
    assert_eq!(roster.len(), 2);
    assert_eq!(roster[0]["participantId"], "a");
    assert_eq!(roster[0]["isAdmin"], true);
    assert_eq!(roster[1]["participantId"], "b");
    assert_eq!(roster[1]["isAdmin"], false);
    assert_eq!(c_events[0]["data"]["isAdmin"], false);
    drain(&mut b);

    // Admin leaves: earliest remaining joiner is promoted
    hub.client_event(a.session_id, ClientEvent::LeaveRoom)
        .await
        .unwrap();
    settle(&hub).await;

    assert_eq!(names(&drain(&mut b)), ["user-left", "admin-promoted"]);
    let c_events = drain(&mut c);
    assert_eq!(names(&c_events), ["user-left"]);
    assert_eq!(c_events[0]["data"], a.session_id.to_string());
    assert!(drain(&mut a).is_empty());

    let info = hub.room_info(RoomId::new("standup")).await.unwrap();
    assert_eq!(info.participant_count, 2);
    let ids: Vec<_> = info.participants.iter().map(|p| p.participant_id.as_str()).collect();
    assert_eq!(ids, ["b", "c"]);

    cancel.cancel();
}

#[tokio::test]
async fn test_last_leave_deletes_room() {
    let (hub, cancel) = spawn_hub();
    let a = hub.connect().await.unwrap();

    join(&hub, a.session_id, "solo", "a").await;
    settle(&hub).await;
    assert_eq!(hub.stats().await.unwrap().room_count, 1);

    hub.disconnect(a.session_id).await.unwrap();
    let stats = hub.stats().await.unwrap();
    assert_eq!(stats.room_count, 0);
    assert_eq!(stats.participant_count, 0);
    assert_eq!(stats.connection_count, 0);

    let err = hub.room_info(RoomId::new("solo")).await.unwrap_err();
    assert!(matches!(err, HubError::RoomNotFound(_)));

    // A fresh join recreates the room with a new admin
    let mut b = hub.connect().await.unwrap();
    join(&hub, b.session_id, "solo", "b").await;
    settle(&hub).await;
    let events = drain(&mut b);
    assert_eq!(events[0]["data"]["isAdmin"], true);

    cancel.cancel();
}

#[tokio::test]
async fn test_disconnect_closes_outbox() {
    let (hub, cancel) = spawn_hub();
    let mut a = hub.connect().await.unwrap();

    hub.disconnect(a.session_id).await.unwrap();
    settle(&hub).await;

    assert!(a.cancel_token.is_cancelled());
    assert!(a.outbox.recv().await.is_none());
    cancel.cancel();
}

#[tokio::test]
async fn test_rejoin_moves_session_between_rooms() {
    let (hub, cancel) = spawn_hub();
    let mut a = hub.connect().await.unwrap();
    let mut b = hub.connect().await.unwrap();

    join(&hub, a.session_id, "r1", "a").await;
    join(&hub, b.session_id, "r1", "b").await;
    settle(&hub).await;
    drain(&mut a);
    drain(&mut b);

    join(&hub, a.session_id, "r2", "a").await;
    settle(&hub).await;

    assert_eq!(names(&drain(&mut b)), ["user-left", "admin-promoted"]);
    let a_events = drain(&mut a);
    assert_eq!(names(&a_events), ["room-participants"]);
    assert_eq!(a_events[0]["data"]["isAdmin"], true);

    let stats = hub.stats().await.unwrap();
    assert_eq!(stats.room_count, 2);
    assert_eq!(stats.participant_count, 2);
    cancel.cancel();
}

// ============================================================================
// Relay
// ============================================================================

#[tokio::test]
async fn test_negotiation_is_relayed_verbatim() {
    let (hub, cancel) = spawn_hub();
    let mut a = hub.connect().await.unwrap();
    let mut b = hub.connect().await.unwrap();

    join(&hub, a.session_id, "call", "a").await;
    join(&hub, b.session_id, "call", "b").await;
    settle(&hub).await;
    drain(&mut a);
    drain(&mut b);

    let offer = r#"{"type":"offer","sdp":"v=0\r\no=- 1 2 IN IP4 0.0.0.0"}"#;
    relay(&hub, a.session_id, b.session_id, RelayKind::Offer, offer).await;
    let answer = r#"{"type":"answer","sdp":"v=0"}"#;
    relay(&hub, b.session_id, a.session_id, RelayKind::Answer, answer).await;
    let candidate = r#"{"candidate":"candidate:1 1 udp 1 10.0.0.1 5000 typ host","sdpMid":"0"}"#;
    relay(&hub, a.session_id, b.session_id, RelayKind::IceCandidate, candidate).await;
    settle(&hub).await;

    let mut delivered = Vec::new();
    while let Ok(ConnectionMessage::Deliver(event)) = b.outbox.try_recv() {
        delivered.push(event.to_text().unwrap());
    }
    assert_eq!(
        delivered,
        [
            format!(r#"{{"event":"offer","data":{{"offer":{offer},"from":"{}"}}}}"#, a.session_id),
            format!(
                r#"{{"event":"ice-candidate","data":{{"candidate":{candidate},"from":"{}"}}}}"#,
                a.session_id
            ),
        ]
    );

    let a_events = drain(&mut a);
    assert_eq!(names(&a_events), ["answer"]);
    assert_eq!(a_events[0]["data"]["from"], b.session_id.to_string());

    cancel.cancel();
}

#[tokio::test]
async fn test_relay_to_departed_session_is_dropped() {
    let (hub, cancel) = spawn_hub();
    let mut a = hub.connect().await.unwrap();
    let b = hub.connect().await.unwrap();

    join(&hub, a.session_id, "call", "a").await;
    join(&hub, b.session_id, "call", "b").await;
    hub.disconnect(b.session_id).await.unwrap();
    settle(&hub).await;
    drain(&mut a);

    relay(&hub, a.session_id, b.session_id, RelayKind::Offer, "{}").await;
    relay(&hub, a.session_id, SessionId::new(), RelayKind::Offer, "{}").await;
    settle(&hub).await;

    assert!(drain(&mut a).is_empty());
    assert_eq!(hub.stats().await.unwrap().connection_count, 1);
    cancel.cancel();
}

#[tokio::test]
async fn test_unattached_sender_cannot_relay() {
    let (hub, cancel) = spawn_hub();
    let lurker = hub.connect().await.unwrap();
    let mut a = hub.connect().await.unwrap();

    join(&hub, a.session_id, "call", "a").await;
    settle(&hub).await;
    drain(&mut a);

    relay(&hub, lurker.session_id, a.session_id, RelayKind::Offer, "{}").await;
    settle(&hub).await;
    assert!(drain(&mut a).is_empty());
    cancel.cancel();
}

// ============================================================================
// Shutdown
// ============================================================================

#[tokio::test]
async fn test_shutdown_closes_every_connection() {
    let cancel = CancellationToken::new();
    let (hub, task) = HubActorHandle::spawn(128, 32, cancel.clone());
    let mut a = hub.connect().await.unwrap();
    let mut b = hub.connect().await.unwrap();
    join(&hub, a.session_id, "r", "a").await;
    settle(&hub).await;
    drain(&mut a);

    cancel.cancel();
    tokio::time::timeout(Duration::from_secs(1), task)
        .await
        .unwrap()
        .unwrap();

    for session in [&mut a, &mut b] {
        assert!(matches!(
            session.outbox.recv().await,
            Some(ConnectionMessage::Close { reason: "shutdown" })
        ));
        assert!(session.cancel_token.is_cancelled());
    }

    let err = hub.stats().await.unwrap_err();
    assert!(matches!(err, HubError::Internal(_)));
}
