use huddle_client::ClientEvent;
use huddle_core::{MessageKind, SdpKind};

use crate::integration::{init_tracing, ready_client};
use crate::utils::{
    EVENT_TIMEOUT, PeerCall, answer_from, candidate_from, member, member_joined, settle,
};

#[tokio::test(start_paused = true)]
async fn test_offerer_queues_candidates_until_answer() {
    init_tracing();

    let (mut alice, mut remote) = ready_client("alice").await;
    let bob = member("bob");

    remote.send(&member_joined(&bob));
    let offer = remote.recv_within(EVENT_TIMEOUT).await.expect("no offer sent");
    assert_eq!(offer.kind(), MessageKind::Offer);

    remote.send(&candidate_from(&bob, &alice.local, "early-1"));
    remote.send(&candidate_from(&bob, &alice.local, "early-2"));
    settle().await;

    let calls = alice.factory.latest(&bob).calls();
    assert!(
        !calls.iter().any(|c| matches!(c, PeerCall::AddCandidate(_))),
        "candidate applied before the remote description: {:?}",
        calls
    );

    remote.send(&answer_from(&bob, &alice.local));
    alice
        .wait_for(|e| matches!(e, ClientEvent::PeerConnected { .. }))
        .await;

    assert_eq!(
        alice.factory.latest(&bob).calls(),
        vec![
            PeerCall::CreateOffer,
            PeerCall::SetLocal(SdpKind::Offer),
            PeerCall::SetRemote(SdpKind::Answer),
            PeerCall::AddCandidate("early-1".into()),
            PeerCall::AddCandidate("early-2".into()),
        ]
    );
}
