use huddle_client::peer::PeerConnectionState;
use huddle_client::table::NegotiationPhase;
use huddle_client::{ClientEvent, SignalingError};
use huddle_core::{ControlMessage, IceCandidate, MessageKind};
use std::time::Duration;

use crate::integration::{init_tracing, ready_client};
use crate::utils::{
    EVENT_TIMEOUT, FailAt, PeerCall, answer_from, member, member_joined, offer_from, settle,
};

#[tokio::test(start_paused = true)]
async fn test_local_candidates_sent_immediately() {
    init_tracing();

    let (alice, mut remote) = ready_client("alice").await;
    let bob = member("bob");

    remote.send(&member_joined(&bob));
    remote.recv_within(EVENT_TIMEOUT).await.expect("no offer sent");

    // Before any answer: local candidates are never held back.
    let peer = alice.factory.latest(&bob);
    peer.events.ice_candidate(IceCandidate::new("local-1"));

    match remote.recv_within(EVENT_TIMEOUT).await {
        Some(ControlMessage::Candidate {
            member,
            from,
            candidate,
            ..
        }) => {
            assert_eq!(member, bob);
            assert_eq!(from, Some(alice.local.clone()));
            assert_eq!(candidate.candidate, "local-1");
        }
        other => panic!("expected CANDIDATE, got {:?}", other),
    }
}

#[tokio::test(start_paused = true)]
async fn test_remote_track_reported() {
    init_tracing();

    let (mut alice, remote) = ready_client("alice").await;
    let bob = member("bob");

    remote.send(&offer_from(&bob, &alice.local));
    alice
        .wait_for(|e| matches!(e, ClientEvent::PeerConnected { .. }))
        .await;

    alice
        .factory
        .latest(&bob)
        .events
        .track("video-1".to_string(), "stream-1".to_string());

    let event = alice
        .wait_for(|e| matches!(e, ClientEvent::RemoteTrack { .. }))
        .await;
    assert!(matches!(
        event,
        ClientEvent::RemoteTrack { member, track_id, stream_id }
            if member == bob && track_id == "video-1" && stream_id == "stream-1"
    ));
}

#[tokio::test(start_paused = true)]
async fn test_failed_connection_isolated() {
    init_tracing();

    let (mut alice, mut remote) = ready_client("alice").await;
    let (bob, carol) = (member("bob"), member("carol"));

    remote.send(&offer_from(&bob, &alice.local));
    remote.send(&offer_from(&carol, &alice.local));
    for _ in 0..2 {
        alice
            .wait_for(|e| matches!(e, ClientEvent::PeerConnected { .. }))
            .await;
    }

    let failed = alice.factory.latest(&bob);
    failed.events.state_changed(PeerConnectionState::Failed);

    let event = alice
        .wait_for(|e| matches!(e, ClientEvent::PeerFailed { .. }))
        .await;
    assert!(matches!(
        event,
        ClientEvent::PeerFailed { ref member, error: SignalingError::ConnectionFailed(_) }
            if member == &bob
    ));

    let snapshot = alice.snapshot().await;
    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot[0].member, carol);
    assert_eq!(snapshot[0].phase, NegotiationPhase::Connected);
    assert_eq!(failed.calls().last(), Some(&PeerCall::Close));
    assert!(!alice.factory.latest(&carol).calls().contains(&PeerCall::Close));

    // Events from the torn-down connection are dropped.
    while remote.recv_within(Duration::from_millis(10)).await.is_some() {}
    failed.events.ice_candidate(IceCandidate::new("stale"));
    settle().await;
    assert!(remote.recv_within(Duration::from_secs(5)).await.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_negotiation_failure_isolated() {
    init_tracing();

    let (mut alice, mut remote) = ready_client("alice").await;
    let (bob, carol) = (member("bob"), member("carol"));
    alice.factory.fail(&bob, FailAt::SetRemote);

    remote.send(&offer_from(&bob, &alice.local));
    let event = alice
        .wait_for(|e| matches!(e, ClientEvent::PeerFailed { .. }))
        .await;
    assert!(matches!(
        event,
        ClientEvent::PeerFailed {
            ref member,
            error: SignalingError::Negotiation { stage: "set remote description", .. },
        } if member == &bob
    ));

    remote.send(&member_joined(&carol));
    let offer = remote.recv_within(EVENT_TIMEOUT).await.expect("no offer sent");
    assert_eq!(offer.kind(), MessageKind::Offer);
    remote.send(&answer_from(&carol, &alice.local));
    alice
        .wait_for(|e| matches!(e, ClientEvent::PeerConnected { .. }))
        .await;

    let snapshot = alice.snapshot().await;
    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot[0].member, carol);
}
