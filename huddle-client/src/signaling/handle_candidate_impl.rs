use crate::SignalingClient;
use huddle_core::{IceCandidate, MemberId};
use tracing::{debug, info, warn};

impl SignalingClient {
    pub(super) async fn handle_candidate(&mut self, from: MemberId, candidate: IceCandidate) {
        let connection = match self.peers.get(&from) {
            Some(entry) if entry.has_remote_description() => entry.connection(),
            Some(_) => {
                debug!("Queueing CANDIDATE from {} until its remote description is set", from);
                self.pending.push(&from, candidate);
                return;
            }
            None if self.pending.closed_within(&from, self.config.orphan_candidate_ttl) => {
                debug!("Discarding CANDIDATE from {}: its entry was torn down", from);
                return;
            }
            None => {
                self.prune_orphan_candidates();
                debug!("Queueing CANDIDATE from {} which has no entry yet", from);
                self.pending.push(&from, candidate);
                return;
            }
        };

        if let Err(e) = connection.add_ice_candidate(candidate).await {
            warn!("Failed to add ICE candidate from {}: {:?}", from, e);
        }
    }

    /// Applies every queued candidate for `member` in arrival order. Called
    /// right after its remote description was set.
    pub(super) async fn flush_candidates(&mut self, member: &MemberId) {
        let Some(entry) = self.peers.get(member) else {
            return;
        };
        let connection = entry.connection();

        let queued = self.pending.take(member);
        if queued.is_empty() {
            return;
        }

        info!("Applying {} queued candidates from {}", queued.len(), member);
        for candidate in queued {
            if let Err(e) = connection.add_ice_candidate(candidate).await {
                warn!("Failed to add queued ICE candidate from {}: {:?}", member, e);
            }
        }
    }

    fn prune_orphan_candidates(&mut self) {
        let peers = &self.peers;
        let pruned = self
            .pending
            .prune_orphans(self.config.orphan_candidate_ttl, |member| {
                peers.contains(member)
            });
        for (member, dropped) in pruned {
            info!(
                "Discarded {} candidates from {} which never got an entry",
                dropped, member
            );
        }
    }
}
