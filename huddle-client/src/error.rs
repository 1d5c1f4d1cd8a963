use huddle_core::{DecodeError, MemberId, SessionId};
use std::time::Duration;
use thiserror::Error;

/// Failures surfaced by the signaling client.
///
/// Per-member variants carry the member so the caller can tell which
/// connection failed; they never affect other members or the channel.
#[derive(Debug, Error)]
pub enum SignalingError {
    #[error(transparent)]
    MalformedMessage(#[from] DecodeError),

    #[error("message addressed to unknown member {0}")]
    UnknownMemberTarget(MemberId),

    #[error("session {0} does not exist")]
    SessionNotFound(SessionId),

    #[error("registry rejected the join: {0}")]
    InvalidRequest(String),

    #[error("control channel lost: {0}")]
    ChannelLost(String),

    #[error("control channel unavailable after {attempts} reconnect attempts")]
    ReconnectExhausted { attempts: u32 },

    #[error("local media not ready for {member} after {waited:?}")]
    MediaUnavailableTimeout { member: MemberId, waited: Duration },

    #[error("offer for {member} undeliverable after {attempts} attempts")]
    OfferUndeliverable { member: MemberId, attempts: u32 },

    #[error("negotiation with {member} failed at {stage}: {source}")]
    Negotiation {
        member: MemberId,
        stage: &'static str,
        #[source]
        source: anyhow::Error,
    },

    #[error("peer connection to {0} failed")]
    ConnectionFailed(MemberId),
}

impl SignalingError {
    /// The remote member this failure is scoped to, if any.
    pub fn member(&self) -> Option<&MemberId> {
        match self {
            SignalingError::UnknownMemberTarget(member)
            | SignalingError::ConnectionFailed(member)
            | SignalingError::MediaUnavailableTimeout { member, .. }
            | SignalingError::OfferUndeliverable { member, .. }
            | SignalingError::Negotiation { member, .. } => Some(member),
            _ => None,
        }
    }
}
