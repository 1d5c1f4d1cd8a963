use huddle_client::ClientEvent;
use huddle_client::table::{NegotiationPhase, NegotiationRole, PeerSummary};
use huddle_core::{ControlMessage, SdpKind};
use tokio::time::Instant;

use crate::integration::{init_tracing, ready_client};
use crate::utils::{EVENT_TIMEOUT, PeerCall, answer_from, member, member_joined};

#[tokio::test(start_paused = true)]
async fn test_offer_to_joined_member() {
    init_tracing();

    let (mut alice, mut remote) = ready_client("alice").await;
    let bob = member("bob");

    let joined_at = Instant::now();
    remote.send(&member_joined(&bob));

    let (target, from, offer) = match remote.recv_within(EVENT_TIMEOUT).await {
        Some(ControlMessage::Offer {
            member, from, offer, ..
        }) => (member, from, offer),
        other => panic!("expected OFFER, got {:?}", other),
    };
    assert_eq!(target, bob);
    assert_eq!(from, Some(alice.local.clone()));
    assert_eq!(offer.kind, SdpKind::Offer);

    let snapshot = alice.snapshot().await;
    let created_at = snapshot[0].created_at;
    assert!(created_at >= joined_at && created_at <= Instant::now());
    assert_eq!(
        snapshot,
        vec![PeerSummary {
            member: bob.clone(),
            role: NegotiationRole::Offering,
            phase: NegotiationPhase::LocalDescriptionSet,
            created_at,
        }]
    );

    remote.send(&answer_from(&bob, &alice.local));

    let connected = alice
        .wait_for(|e| matches!(e, ClientEvent::PeerConnected { .. }))
        .await;
    assert!(matches!(connected, ClientEvent::PeerConnected { member } if member == bob));

    assert_eq!(
        alice.factory.latest(&bob).calls(),
        vec![
            PeerCall::CreateOffer,
            PeerCall::SetLocal(SdpKind::Offer),
            PeerCall::SetRemote(SdpKind::Answer),
        ]
    );
    assert_eq!(alice.snapshot().await[0].phase, NegotiationPhase::Connected);
}
