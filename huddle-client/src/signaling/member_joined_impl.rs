use crate::SignalingClient;
use crate::config::BackoffPolicy;
use crate::error::SignalingError;
use crate::peer::PeerEventSink;
use crate::signaling::EntryTaskResult;
use crate::table::{NegotiationPhase, NegotiationRole};
use crate::transport::ControlSender;
use huddle_core::{ControlMessage, MemberId};
use tokio::sync::mpsc;
use tokio::time::{Instant, sleep};
use tracing::{debug, info, warn};

impl SignalingClient {
    /// A new member joined: we offer to it.
    pub(super) async fn on_member_joined(&mut self, member: MemberId) {
        if member == self.local {
            debug!("Ignoring MEMBER_JOINED for ourselves");
            return;
        }
        if self.peers.contains(&member) {
            debug!("Entry for {} already exists, ignoring MEMBER_JOINED", member);
            return;
        }

        info!("Member {} joined, offering", member);
        let Some(generation) = self.create_entry(&member, NegotiationRole::Offering).await else {
            return;
        };

        if self.media.is_ready() {
            self.start_offer(&member, generation).await;
            return;
        }

        info!("Local media not ready, deferring offer to {}", member);
        let media = self.media.clone();
        let wait = self.config.media_wait;
        let results = self.task_tx.clone();
        let waiting_for = member.clone();
        let task = tokio::spawn(async move {
            let started = Instant::now();
            let result = if media.wait_until_ready(&wait).await {
                EntryTaskResult::MediaReady {
                    member: waiting_for,
                    generation,
                }
            } else {
                EntryTaskResult::MediaTimedOut {
                    member: waiting_for,
                    generation,
                    waited: started.elapsed(),
                }
            };
            let _ = results.send(result);
        });

        if let Some(entry) = self.peers.current(&member, generation) {
            entry.attach_task(task.abort_handle());
        }
    }

    /// Creates the connection and its entry. Returns the entry generation, or
    /// `None` after reporting a failure.
    pub(super) async fn create_entry(
        &mut self,
        member: &MemberId,
        role: NegotiationRole,
    ) -> Option<u64> {
        let stale = self.pending.reopen(member, self.config.orphan_candidate_ttl);
        if stale > 0 {
            info!("Dropped {} candidates from {} buffered too long ago", stale, member);
        }

        let generation = self.peers.next_generation();
        let sink = PeerEventSink::new(member.clone(), generation, self.notice_tx.clone());

        let connection = match self.factory.create(sink).await {
            Ok(connection) => connection,
            Err(source) => {
                self.report_failure(SignalingError::Negotiation {
                    member: member.clone(),
                    stage: "create connection",
                    source,
                });
                return None;
            }
        };

        match self
            .peers
            .insert(member.clone(), generation, connection, role)
        {
            Ok(_) => Some(generation),
            Err(e) => {
                warn!("{}", e);
                None
            }
        }
    }

    pub(super) async fn start_offer(&mut self, member: &MemberId, generation: u64) {
        let Some(entry) = self.peers.current(member, generation) else {
            debug!("Entry for {} is gone, not offering", member);
            return;
        };
        let connection = entry.connection();

        let offer = match connection.create_offer().await {
            Ok(offer) => offer,
            Err(source) => return self.negotiation_failed(member, "create offer", source).await,
        };
        if !self.advance(member, NegotiationPhase::OfferCreated).await {
            return;
        }

        if let Err(source) = connection.set_local_description(offer.clone()).await {
            return self
                .negotiation_failed(member, "set local description", source)
                .await;
        }
        if !self.advance(member, NegotiationPhase::LocalDescriptionSet).await {
            return;
        }

        let message = ControlMessage::Offer {
            session_id: self.session.clone(),
            member: member.clone(),
            from: Some(self.local.clone()),
            offer,
        };
        self.send_offer(member, generation, message);
    }

    /// Sends now if the channel is open, otherwise hands the offer to a retry
    /// task owned by the entry. Local candidates are held until the retry
    /// gets the offer out.
    fn send_offer(&mut self, member: &MemberId, generation: u64, message: ControlMessage) {
        let message = match self.control.send(message.clone()) {
            Ok(()) => {
                info!("Sent OFFER to {}", member);
                return;
            }
            Err(e) => {
                info!("Cannot send OFFER to {} yet ({}), retrying", member, e);
                message
            }
        };

        if let Some(entry) = self.peers.current(member, generation) {
            entry.hold_candidates();
        }
        let task = tokio::spawn(retry_offer(
            self.control.clone(),
            message,
            self.config.offer_retry,
            self.task_tx.clone(),
            member.clone(),
            generation,
        ));
        if let Some(entry) = self.peers.current(member, generation) {
            entry.attach_task(task.abort_handle());
        }
    }
}

async fn retry_offer(
    control: ControlSender,
    message: ControlMessage,
    policy: BackoffPolicy,
    results: mpsc::UnboundedSender<EntryTaskResult>,
    member: MemberId,
    generation: u64,
) {
    for attempt in 1..=policy.max_attempts {
        sleep(policy.delay_for(attempt)).await;
        match control.send(message.clone()) {
            Ok(()) => {
                info!("Sent OFFER to {} on retry {}", member, attempt);
                let _ = results.send(EntryTaskResult::OfferDelivered { member, generation });
                return;
            }
            Err(e) => debug!("OFFER retry {} to {} failed: {}", attempt, member, e),
        }
    }

    let _ = results.send(EntryTaskResult::OfferUndeliverable {
        member,
        generation,
        attempts: policy.max_attempts,
    });
}
