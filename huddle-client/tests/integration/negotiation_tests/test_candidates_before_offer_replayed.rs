use huddle_client::ClientEvent;
use huddle_core::{ControlMessage, SdpKind};

use crate::integration::{init_tracing, ready_client};
use crate::utils::{EVENT_TIMEOUT, PeerCall, candidate_from, member, offer_from, settle};

#[tokio::test(start_paused = true)]
async fn test_candidates_before_offer_replayed() {
    init_tracing();

    let (mut alice, mut remote) = ready_client("alice").await;
    let bob = member("bob");

    for c in ["c1", "c2", "c3"] {
        remote.send(&candidate_from(&bob, &alice.local, c));
    }
    settle().await;
    assert_eq!(alice.factory.total_created(), 0);

    remote.send(&offer_from(&bob, &alice.local));

    let answer = remote.recv_within(EVENT_TIMEOUT).await.expect("no answer sent");
    assert!(
        matches!(&answer, ControlMessage::Answer { member, from, .. }
            if member == &bob && from.as_ref() == Some(&alice.local)),
        "unexpected {:?}",
        answer
    );
    alice
        .wait_for(|e| matches!(e, ClientEvent::PeerConnected { .. }))
        .await;

    remote.send(&candidate_from(&bob, &alice.local, "c4"));
    settle().await;

    assert_eq!(
        alice.factory.latest(&bob).calls(),
        vec![
            PeerCall::SetRemote(SdpKind::Offer),
            PeerCall::AddCandidate("c1".into()),
            PeerCall::AddCandidate("c2".into()),
            PeerCall::AddCandidate("c3".into()),
            PeerCall::CreateAnswer,
            PeerCall::SetLocal(SdpKind::Answer),
            PeerCall::AddCandidate("c4".into()),
        ]
    );
}
