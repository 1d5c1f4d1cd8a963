use crate::SignalingClient;
use crate::error::SignalingError;
use crate::signaling::ClientEvent;
use crate::table::NegotiationPhase;
use huddle_core::MemberId;
use tracing::{debug, error, info, warn};

impl SignalingClient {
    /// Moves the entry for `member` to `phase`. An illegal move fails the
    /// member and returns false.
    pub(super) async fn advance(&mut self, member: &MemberId, phase: NegotiationPhase) -> bool {
        let Some(entry) = self.peers.get_mut(member) else {
            debug!("Entry for {} disappeared before {:?}", member, phase);
            return false;
        };
        match entry.advance(phase) {
            Ok(()) => true,
            Err(e) => {
                self.negotiation_failed(member, "advance", e.into()).await;
                false
            }
        }
    }

    pub(super) async fn negotiation_failed(
        &mut self,
        member: &MemberId,
        stage: &'static str,
        source: anyhow::Error,
    ) {
        let error = SignalingError::Negotiation {
            member: member.clone(),
            stage,
            source,
        };
        self.fail_peer(member, error).await;
    }

    /// Tears down one member's entry and reports why. Other entries and the
    /// control channel are not affected.
    pub(super) async fn fail_peer(&mut self, member: &MemberId, error: SignalingError) {
        self.teardown(member).await;
        self.report_failure(error);
    }

    pub(super) fn report_failure(&self, error: SignalingError) {
        warn!("{}", error);
        let Some(member) = error.member().cloned() else {
            error!("Per-member failure without a member: {}", error);
            return;
        };
        self.emit(ClientEvent::PeerFailed { member, error });
    }

    /// Removes the entry, cancelling its tasks, discards its queued
    /// candidates and closes the connection. Candidates arriving for the
    /// member afterwards are dropped until a new entry replaces it. Returns false if there was no
    /// entry.
    pub(super) async fn teardown(&mut self, member: &MemberId) -> bool {
        let Some(mut entry) = self.peers.remove(member) else {
            return false;
        };
        let discarded = self.pending.close(member);
        if discarded > 0 {
            debug!("Discarded {} queued candidates from {}", discarded, member);
        }

        let _ = entry.advance(NegotiationPhase::Closed);
        let connection = entry.connection();
        drop(entry);

        if let Err(e) = connection.close().await {
            debug!("Error closing connection to {}: {:?}", member, e);
        }
        info!("Peer entry for {} closed", member);
        true
    }

    pub(super) async fn teardown_all(&mut self) {
        for member in self.peers.members() {
            self.teardown(&member).await;
        }
        self.pending.clear();
    }

    pub(super) async fn leave(&mut self) {
        info!("Member {} leaving session {}", self.local, self.session);
        self.teardown_all().await;
        self.supervisor.shutdown().await;
        self.emit(ClientEvent::Left);
    }

    /// Ends the client after a session-level failure.
    pub(super) async fn terminate(&mut self, event: ClientEvent) {
        self.teardown_all().await;
        self.supervisor.shutdown().await;
        self.emit(event);
    }
}
