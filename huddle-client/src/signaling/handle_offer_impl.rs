use crate::SignalingClient;
use crate::config::GlarePolicy;
use crate::signaling::ClientEvent;
use crate::table::{NegotiationPhase, NegotiationRole};
use huddle_core::{ControlMessage, MemberId, SessionDescription};
use tracing::{debug, info};

impl SignalingClient {
    pub(super) async fn handle_offer(&mut self, from: MemberId, offer: SessionDescription) {
        if self.peers.contains(&from) && !self.yield_to_offer(&from).await {
            return;
        }

        info!("Received OFFER from {}, answering", from);
        let Some(generation) = self.create_entry(&from, NegotiationRole::Answering).await else {
            return;
        };
        let Some(entry) = self.peers.current(&from, generation) else {
            return;
        };
        let connection = entry.connection();

        if let Err(source) = connection.set_remote_description(offer).await {
            return self
                .negotiation_failed(&from, "set remote description", source)
                .await;
        }
        if !self.advance(&from, NegotiationPhase::RemoteDescriptionSet).await {
            return;
        }
        self.flush_candidates(&from).await;

        let answer = match connection.create_answer().await {
            Ok(answer) => answer,
            Err(source) => return self.negotiation_failed(&from, "create answer", source).await,
        };
        if !self.advance(&from, NegotiationPhase::AnswerCreated).await {
            return;
        }

        if let Err(source) = connection.set_local_description(answer.clone()).await {
            return self
                .negotiation_failed(&from, "set local description", source)
                .await;
        }
        if !self.advance(&from, NegotiationPhase::LocalDescriptionSet).await {
            return;
        }

        self.send_control(ControlMessage::Answer {
            session_id: self.session.clone(),
            member: from.clone(),
            from: Some(self.local.clone()),
            answer,
        });

        if self.advance(&from, NegotiationPhase::Connected).await {
            info!("Negotiation with {} complete (answerer)", from);
            self.emit(ClientEvent::PeerConnected { member: from });
        }
    }

    /// Decides whether an offer from a member we already have an entry for
    /// replaces that entry. The entry is torn down when it does.
    async fn yield_to_offer(&mut self, from: &MemberId) -> bool {
        let Some(entry) = self.peers.get(from) else {
            return true;
        };

        let collision =
            entry.role() == NegotiationRole::Offering && !entry.has_remote_description();

        match self.config.glare {
            GlarePolicy::IgnoreDuplicate => {
                debug!("Ignoring duplicate OFFER from {}", from);
                false
            }
            GlarePolicy::LowerIdentityOffers if collision && self.local > *from => {
                info!(
                    "Offer collision with {}: the lower identity offers, abandoning ours",
                    from
                );
                self.teardown(from).await;
                true
            }
            GlarePolicy::LowerIdentityOffers => {
                debug!("Ignoring OFFER from {}, keeping our entry", from);
                false
            }
        }
    }
}
