use crate::SignalingClient;
use crate::error::SignalingError;
use crate::peer::{PeerConnectionState, PeerEvent, PeerNotice};
use crate::signaling::ClientEvent;
use huddle_core::{ControlMessage, IceCandidate, MemberId};
use tracing::{debug, info};

impl SignalingClient {
    pub(super) async fn handle_peer_notice(&mut self, notice: PeerNotice) {
        let PeerNotice {
            member,
            generation,
            event,
        } = notice;

        if self.peers.current(&member, generation).is_none() {
            debug!("Dropping {:?} from a replaced connection to {}", event, member);
            return;
        }

        match event {
            PeerEvent::IceCandidate(candidate) => {
                let candidate = match self.peers.get_mut(&member) {
                    Some(entry) => entry.hold_candidate(candidate),
                    None => Some(candidate),
                };
                match candidate {
                    Some(candidate) => self.send_candidate(&member, candidate),
                    None => debug!("Holding local candidate for {} until our OFFER is out", member),
                }
            }

            PeerEvent::Track {
                track_id,
                stream_id,
            } => {
                info!("Remote track {} from {}", track_id, member);
                self.emit(ClientEvent::RemoteTrack {
                    member,
                    track_id,
                    stream_id,
                });
            }

            PeerEvent::StateChanged(state) => {
                info!("Connection to {} is {:?}", member, state);
                if !state.is_terminal() {
                    return;
                }
                if state == PeerConnectionState::Failed {
                    let error = SignalingError::ConnectionFailed(member.clone());
                    self.fail_peer(&member, error).await;
                } else if self.teardown(&member).await {
                    self.emit(ClientEvent::PeerClosed { member });
                }
            }
        }
    }

    pub(super) fn send_candidate(&self, member: &MemberId, candidate: IceCandidate) {
        self.send_control(ControlMessage::Candidate {
            session_id: self.session.clone(),
            member: member.clone(),
            from: Some(self.local.clone()),
            candidate,
        });
    }
}
