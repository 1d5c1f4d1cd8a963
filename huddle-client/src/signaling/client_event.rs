use crate::error::SignalingError;
use huddle_core::{MemberId, SessionId};
use std::time::Duration;

/// What the caller of a [`SignalingClient`](crate::SignalingClient) is told.
///
/// Failures name the member they belong to; only `SessionNotFound`,
/// `SessionUnavailable` and `InvalidRequest` concern the session as a whole,
/// and each of those ends the client.
#[derive(Debug)]
pub enum ClientEvent {
    /// The control channel opened and the join was sent.
    Joined { reconnect: bool },
    Reconnecting { attempt: u32, delay: Duration },
    PeerConnected { member: MemberId },
    PeerFailed { member: MemberId, error: SignalingError },
    PeerClosed { member: MemberId },
    RemoteTrack {
        member: MemberId,
        track_id: String,
        stream_id: String,
    },
    SessionNotFound { session: SessionId },
    SessionUnavailable { attempts: u32 },
    InvalidRequest { reason: String },
    Left,
}

impl ClientEvent {
    /// Whether no further events follow.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ClientEvent::SessionNotFound { .. }
                | ClientEvent::SessionUnavailable { .. }
                | ClientEvent::InvalidRequest { .. }
                | ClientEvent::Left
        )
    }
}
