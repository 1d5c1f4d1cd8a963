use huddle_client::ClientEvent;
use huddle_core::{MemberId, SessionId};

use super::{E2E_TIMEOUT, spawn_client, start_registry};
use crate::integration::init_tracing;

#[tokio::test]
async fn test_unknown_session_ends_client() {
    init_tracing();

    let (base_url, manager) = start_registry().await;
    let session = SessionId::parse("no-such-meeting").unwrap();
    let alice = MemberId::parse("alice").unwrap();

    let (_handle, mut events) = spawn_client(&base_url, &alice, &session);

    let mut received = Vec::new();
    tokio::time::timeout(E2E_TIMEOUT, async {
        while let Some(event) = events.recv().await {
            received.push(event);
        }
    })
    .await
    .expect("client never stopped");

    let not_found = received
        .iter()
        .filter(|e| matches!(e, ClientEvent::SessionNotFound { session: s } if s == &session))
        .count();
    assert_eq!(not_found, 1, "events: {:?}", received);
    assert!(matches!(received.last(), Some(ClientEvent::SessionNotFound { .. })));
    assert!(!received.iter().any(|e| matches!(e, ClientEvent::Reconnecting { .. })));
    assert!(!manager.contains(&session));
}
