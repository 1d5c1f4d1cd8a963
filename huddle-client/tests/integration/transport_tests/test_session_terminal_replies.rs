use huddle_client::ClientEvent;
use huddle_client::transport::ChannelState;
use huddle_core::ControlMessage;
use std::time::Duration;

use crate::integration::{init_tracing, ready_client};
use crate::utils::{EVENT_TIMEOUT, PeerCall, member, offer_from, test_session};

#[tokio::test(start_paused = true)]
async fn test_session_not_found_mid_session() {
    init_tracing();

    let (mut alice, mut remote) = ready_client("alice").await;
    let bob = member("bob");

    remote.send(&offer_from(&bob, &alice.local));
    remote.recv_within(EVENT_TIMEOUT).await.expect("no answer sent");

    remote.send(&ControlMessage::SessionNotFound {
        session_id: Some(test_session()),
    });

    let event = alice
        .wait_for(|e| matches!(e, ClientEvent::SessionNotFound { .. }))
        .await;
    assert!(matches!(event, ClientEvent::SessionNotFound { session } if session == test_session()));
    assert!(alice.events.recv().await.is_none());

    assert!(remote.is_closed_by_client().await);
    assert_eq!(alice.factory.latest(&bob).calls().last(), Some(&PeerCall::Close));
    assert_eq!(alice.handle.channel_state(), ChannelState::Closed);

    tokio::time::sleep(Duration::from_secs(120)).await;
    assert_eq!(alice.connector.attempts().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_invalid_request_ends_client() {
    init_tracing();

    let (mut alice, mut remote) = ready_client("alice").await;

    remote.send(&ControlMessage::InvalidRequest {
        session_id: Some(test_session()),
        reason: Some("member is required".to_string()),
    });

    let event = alice.next_event().await;
    assert!(matches!(
        event,
        ClientEvent::InvalidRequest { ref reason } if reason == "member is required"
    ));
    assert!(remote.is_closed_by_client().await);

    tokio::time::sleep(Duration::from_secs(120)).await;
    assert_eq!(alice.connector.attempts().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_bare_session_not_found_ends_client() {
    init_tracing();

    let (mut alice, remote) = ready_client("alice").await;

    remote.send_raw(r#"{"type":"SESSION_NOT_FOUND"}"#);

    let event = alice.next_event().await;
    assert!(matches!(event, ClientEvent::SessionNotFound { session } if session == test_session()));
    assert!(alice.events.recv().await.is_none());
    assert_eq!(alice.handle.channel_state(), ChannelState::Closed);
    assert!(alice.handle.is_finished());
}

#[tokio::test(start_paused = true)]
async fn test_bare_invalid_request_ends_client() {
    init_tracing();

    let (mut alice, mut remote) = ready_client("alice").await;

    remote.send_raw(r#"{"type":"INVALID_REQUEST"}"#);

    let event = alice.next_event().await;
    assert!(matches!(event, ClientEvent::InvalidRequest { .. }));
    assert!(remote.is_closed_by_client().await);
}
