use huddle_client::table::{NegotiationPhase, NegotiationRole};
use huddle_client::{ClientEvent, create_session};
use huddle_core::MemberId;
use std::time::Duration;

use super::{spawn_client, start_registry, wait_for_event};
use crate::integration::init_tracing;

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_two_members_negotiate_through_registry() {
    init_tracing();

    let (base_url, manager) = start_registry().await;
    let alice = MemberId::parse("alice").unwrap();
    let bob = MemberId::parse("bob").unwrap();

    let session = create_session(&base_url, &alice).await.unwrap();
    assert!(manager.contains(&session));

    let (alice_handle, mut alice_events) = spawn_client(&base_url, &alice, &session);
    wait_for_event(&mut alice_events, |e| matches!(e, ClientEvent::Joined { .. })).await;

    // Bob's arrival is only announced to members already registered.
    for _ in 0..100 {
        let info = manager.describe(&session).await.unwrap();
        if info.members.contains(&alice) {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    let (bob_handle, mut bob_events) = spawn_client(&base_url, &bob, &session);

    let connected = wait_for_event(&mut alice_events, |e| {
        matches!(e, ClientEvent::PeerConnected { .. } | ClientEvent::PeerFailed { .. })
    })
    .await;
    assert!(
        matches!(connected, ClientEvent::PeerConnected { ref member } if member == &bob),
        "alice saw {:?}",
        connected
    );

    let connected = wait_for_event(&mut bob_events, |e| {
        matches!(e, ClientEvent::PeerConnected { .. } | ClientEvent::PeerFailed { .. })
    })
    .await;
    assert!(
        matches!(connected, ClientEvent::PeerConnected { ref member } if member == &alice),
        "bob saw {:?}",
        connected
    );

    let alice_view = alice_handle.snapshot().await;
    assert_eq!(alice_view.len(), 1);
    assert_eq!(alice_view[0].member, bob);
    assert_eq!(alice_view[0].role, NegotiationRole::Offering);
    assert_eq!(alice_view[0].phase, NegotiationPhase::Connected);

    let bob_view = bob_handle.snapshot().await;
    assert_eq!(bob_view.len(), 1);
    assert_eq!(bob_view[0].member, alice);
    assert_eq!(bob_view[0].role, NegotiationRole::Answering);

    alice_handle.leave().await;
    bob_handle.leave().await;
    wait_for_event(&mut alice_events, |e| matches!(e, ClientEvent::Left)).await;
    wait_for_event(&mut bob_events, |e| matches!(e, ClientEvent::Left)).await;
}
