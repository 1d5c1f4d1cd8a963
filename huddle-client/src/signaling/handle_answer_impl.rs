use crate::SignalingClient;
use crate::error::SignalingError;
use crate::signaling::ClientEvent;
use crate::table::{NegotiationPhase, NegotiationRole};
use huddle_core::{MemberId, SessionDescription};
use tracing::{debug, info};

impl SignalingClient {
    pub(super) async fn handle_answer(&mut self, from: MemberId, answer: SessionDescription) {
        let Some(entry) = self.peers.get(&from) else {
            debug!(
                "Discarding ANSWER: {}",
                SignalingError::UnknownMemberTarget(from)
            );
            return;
        };

        if entry.role() != NegotiationRole::Offering
            || entry.phase() != NegotiationPhase::LocalDescriptionSet
        {
            debug!(
                "Ignoring stale ANSWER from {} ({:?} entry in {:?})",
                from,
                entry.role(),
                entry.phase()
            );
            return;
        }

        info!("Received ANSWER from {}", from);
        let connection = entry.connection();
        if let Err(source) = connection.set_remote_description(answer).await {
            return self
                .negotiation_failed(&from, "set remote description", source)
                .await;
        }
        if !self.advance(&from, NegotiationPhase::RemoteDescriptionSet).await {
            return;
        }
        self.flush_candidates(&from).await;

        if self.advance(&from, NegotiationPhase::Connected).await {
            info!("Negotiation with {} complete (offerer)", from);
            self.emit(ClientEvent::PeerConnected { member: from });
        }
    }
}
