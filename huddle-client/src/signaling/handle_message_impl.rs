use crate::SignalingClient;
use crate::error::SignalingError;
use crate::signaling::ClientEvent;
use huddle_core::{ControlMessage, MemberId, decode_text};
use std::ops::ControlFlow;
use tracing::{debug, info, warn};

impl SignalingClient {
    pub(super) async fn handle_frame(&mut self, text: &str) -> ControlFlow<()> {
        let message = match decode_text(text) {
            Ok(message) => message,
            Err(e) => {
                warn!("Discarding control message: {}", SignalingError::from(e));
                return ControlFlow::Continue(());
            }
        };

        if let Some(foreign) = message.session_id().filter(|id| *id != &self.session) {
            warn!("Discarding {} for foreign session {}", message.kind(), foreign);
            return ControlFlow::Continue(());
        }

        match message {
            ControlMessage::MemberJoined { member, .. } => {
                self.on_member_joined(member).await;
            }

            ControlMessage::Offer { .. }
            | ControlMessage::Answer { .. }
            | ControlMessage::Candidate { .. } => {
                let Some(from) = self.attribute(&message) else {
                    return ControlFlow::Continue(());
                };
                match message {
                    ControlMessage::Offer { offer, .. } => self.handle_offer(from, offer).await,
                    ControlMessage::Answer { answer, .. } => self.handle_answer(from, answer).await,
                    ControlMessage::Candidate { candidate, .. } => {
                        self.handle_candidate(from, candidate).await
                    }
                    _ => {}
                }
            }

            ControlMessage::SessionNotFound { session_id } => {
                let session = session_id.unwrap_or_else(|| self.session.clone());
                warn!("{}", SignalingError::SessionNotFound(session.clone()));
                self.terminate(ClientEvent::SessionNotFound { session }).await;
                return ControlFlow::Break(());
            }

            ControlMessage::InvalidRequest { reason, .. } => {
                let reason = reason.unwrap_or_else(|| "join rejected".to_string());
                warn!("{}", SignalingError::InvalidRequest(reason.clone()));
                self.terminate(ClientEvent::InvalidRequest { reason }).await;
                return ControlFlow::Break(());
            }

            ControlMessage::Join { member, .. } => {
                debug!("Ignoring JOIN echoed for {}", member);
            }
        }

        ControlFlow::Continue(())
    }

    /// The remote member a relayed negotiation message came from, if it is
    /// addressed to us and carries a usable sender stamp.
    fn attribute(&self, message: &ControlMessage) -> Option<MemberId> {
        if let Some(target) = message.target() {
            if target != &self.local {
                warn!(
                    "Discarding {} addressed to {} (local member is {})",
                    message.kind(),
                    target,
                    self.local
                );
                return None;
            }
        }

        match message.sender() {
            None => {
                warn!("Discarding {} without a sender stamp", message.kind());
                None
            }
            Some(from) if from == &self.local => {
                info!("Discarding {} sent by ourselves", message.kind());
                None
            }
            Some(from) => Some(from.clone()),
        }
    }
}
