use huddle_client::{BackoffPolicy, ClientConfig, ClientEvent, SignalingError, media_readiness};
use huddle_core::{ControlMessage, IceCandidate, MessageKind, SdpKind};
use std::time::Duration;

use crate::integration::{init_tracing, joined_client};
use crate::utils::{EVENT_TIMEOUT, PeerCall, member, member_joined, offer_from, settle};

#[tokio::test(start_paused = true)]
async fn test_offer_delivered_after_reconnect() {
    init_tracing();

    let (signal, media) = media_readiness(false);
    let (mut alice, remote) = joined_client("alice", ClientConfig::default(), media).await;
    let bob = member("bob");

    remote.send(&member_joined(&bob));
    settle().await;
    drop(remote);

    // Media becomes ready while the channel is down.
    tokio::time::sleep(Duration::from_millis(500)).await;
    signal.set_ready(true);
    tokio::time::sleep(Duration::from_millis(200)).await;

    // Gathering starts as soon as the offer is set locally.
    let peer = alice.factory.latest(&bob);
    assert_eq!(
        peer.calls(),
        vec![PeerCall::CreateOffer, PeerCall::SetLocal(SdpKind::Offer)]
    );
    for c in ["gathered-during-outage-1", "gathered-during-outage-2"] {
        peer.events.ice_candidate(IceCandidate::new(c));
    }
    settle().await;

    let mut remote = alice.accept_join().await;
    let offer = remote.recv_within(EVENT_TIMEOUT).await.expect("offer never delivered");
    assert_eq!(offer.kind(), MessageKind::Offer);
    assert_eq!(offer.target(), Some(&bob));

    for expected in ["gathered-during-outage-1", "gathered-during-outage-2"] {
        match remote.recv_within(EVENT_TIMEOUT).await {
            Some(ControlMessage::Candidate {
                member, candidate, ..
            }) => {
                assert_eq!(member, bob);
                assert_eq!(candidate.candidate, expected);
            }
            other => panic!("expected CANDIDATE after the OFFER, got {:?}", other),
        }
    }

    // Created once, sent once.
    assert_eq!(
        peer.calls(),
        vec![PeerCall::CreateOffer, PeerCall::SetLocal(SdpKind::Offer)]
    );
    assert!(remote.recv_within(Duration::from_secs(60)).await.is_none());

    // Once the offer is out, candidates go straight to the channel.
    peer.events.ice_candidate(IceCandidate::new("after-delivery"));
    let next = remote.recv_within(EVENT_TIMEOUT).await.expect("candidate not sent");
    assert!(matches!(next, ControlMessage::Candidate { ref candidate, .. }
        if candidate.candidate == "after-delivery"));
}

#[tokio::test(start_paused = true)]
async fn test_offer_undeliverable_fails_member() {
    init_tracing();

    let config = ClientConfig {
        reconnect: BackoffPolicy {
            base: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            max_attempts: 20,
        },
        offer_retry: BackoffPolicy {
            base: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            max_attempts: 3,
        },
        ..ClientConfig::default()
    };
    let (signal, media) = media_readiness(false);
    let (mut alice, remote) = joined_client("alice", config, media).await;
    let bob = member("bob");

    remote.send(&member_joined(&bob));
    settle().await;
    alice.connector.set_accepting(false);
    drop(remote);
    settle().await;
    signal.set_ready(true);

    let event = alice
        .wait_for(|e| matches!(e, ClientEvent::PeerFailed { .. }))
        .await;
    assert!(matches!(
        event,
        ClientEvent::PeerFailed {
            ref member,
            error: SignalingError::OfferUndeliverable { attempts: 3, .. },
        } if member == &bob
    ));
    assert!(alice.snapshot().await.is_empty());
    assert_eq!(alice.factory.latest(&bob).calls().last(), Some(&PeerCall::Close));
}

#[tokio::test(start_paused = true)]
async fn test_media_timeout_fails_only_that_member() {
    init_tracing();

    let (_signal, media) = media_readiness(false);
    let (mut alice, mut remote) = joined_client("alice", ClientConfig::default(), media).await;
    let (bob, carol) = (member("bob"), member("carol"));

    // Answering never needs local media readiness.
    remote.send(&offer_from(&carol, &alice.local));
    remote.recv_within(EVENT_TIMEOUT).await.expect("no answer sent");
    alice
        .wait_for(|e| matches!(e, ClientEvent::PeerConnected { .. }))
        .await;

    let started = tokio::time::Instant::now();
    remote.send(&member_joined(&bob));

    let event = alice
        .wait_for(|e| matches!(e, ClientEvent::PeerFailed { .. }))
        .await;
    assert!(matches!(
        event,
        ClientEvent::PeerFailed {
            ref member,
            error: SignalingError::MediaUnavailableTimeout { .. },
        } if member == &bob
    ));
    let waited = started.elapsed();
    assert!(waited >= Duration::from_secs(10) && waited < Duration::from_secs(11));

    assert!(!alice.factory.latest(&bob).calls().contains(&PeerCall::CreateOffer));
    assert!(remote.recv_within(Duration::from_secs(5)).await.is_none());

    let snapshot = alice.snapshot().await;
    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot[0].member, carol);
}
