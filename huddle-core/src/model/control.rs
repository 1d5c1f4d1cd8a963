use crate::model::{IceCandidate, MemberId, SessionDescription, SessionId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Envelope exchanged over the control channel, tagged by `type`.
///
/// For `Offer`, `Answer` and `Candidate` the `member` field names the target.
/// The registry stamps `from` with the sender's identity while relaying.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ControlMessage {
    #[serde(alias = "JOIN_MEETING")]
    Join {
        #[serde(rename = "sessionId", alias = "sessionID")]
        session_id: SessionId,
        member: MemberId,
    },

    #[serde(alias = "NEW_MEMBER")]
    MemberJoined {
        #[serde(rename = "sessionId", alias = "sessionID")]
        session_id: SessionId,
        member: MemberId,
    },

    Offer {
        #[serde(rename = "sessionId", alias = "sessionID")]
        session_id: SessionId,
        member: MemberId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        from: Option<MemberId>,
        offer: SessionDescription,
    },

    Answer {
        #[serde(rename = "sessionId", alias = "sessionID")]
        session_id: SessionId,
        member: MemberId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        from: Option<MemberId>,
        answer: SessionDescription,
    },

    Candidate {
        #[serde(rename = "sessionId", alias = "sessionID")]
        session_id: SessionId,
        member: MemberId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        from: Option<MemberId>,
        candidate: IceCandidate,
    },

    /// Older registries send this without a session id.
    SessionNotFound {
        #[serde(
            default,
            rename = "sessionId",
            alias = "sessionID",
            skip_serializing_if = "Option::is_none"
        )]
        session_id: Option<SessionId>,
    },

    InvalidRequest {
        #[serde(
            default,
            rename = "sessionId",
            alias = "sessionID",
            skip_serializing_if = "Option::is_none"
        )]
        session_id: Option<SessionId>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    Join,
    MemberJoined,
    Offer,
    Answer,
    Candidate,
    SessionNotFound,
    InvalidRequest,
}

impl MessageKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MessageKind::Join => "JOIN",
            MessageKind::MemberJoined => "MEMBER_JOINED",
            MessageKind::Offer => "OFFER",
            MessageKind::Answer => "ANSWER",
            MessageKind::Candidate => "CANDIDATE",
            MessageKind::SessionNotFound => "SESSION_NOT_FOUND",
            MessageKind::InvalidRequest => "INVALID_REQUEST",
        }
    }

    /// Resolves a wire tag, including the legacy `JOIN_MEETING` and `NEW_MEMBER`.
    pub fn from_tag(tag: &str) -> Option<Self> {
        let kind = match tag {
            "JOIN" | "JOIN_MEETING" => MessageKind::Join,
            "MEMBER_JOINED" | "NEW_MEMBER" => MessageKind::MemberJoined,
            "OFFER" => MessageKind::Offer,
            "ANSWER" => MessageKind::Answer,
            "CANDIDATE" => MessageKind::Candidate,
            "SESSION_NOT_FOUND" => MessageKind::SessionNotFound,
            "INVALID_REQUEST" => MessageKind::InvalidRequest,
            _ => return None,
        };
        Some(kind)
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ControlMessage {
    pub fn kind(&self) -> MessageKind {
        match self {
            ControlMessage::Join { .. } => MessageKind::Join,
            ControlMessage::MemberJoined { .. } => MessageKind::MemberJoined,
            ControlMessage::Offer { .. } => MessageKind::Offer,
            ControlMessage::Answer { .. } => MessageKind::Answer,
            ControlMessage::Candidate { .. } => MessageKind::Candidate,
            ControlMessage::SessionNotFound { .. } => MessageKind::SessionNotFound,
            ControlMessage::InvalidRequest { .. } => MessageKind::InvalidRequest,
        }
    }

    /// The session the message belongs to. `None` only for terminal replies
    /// that did not name one.
    pub fn session_id(&self) -> Option<&SessionId> {
        match self {
            ControlMessage::Join { session_id, .. }
            | ControlMessage::MemberJoined { session_id, .. }
            | ControlMessage::Offer { session_id, .. }
            | ControlMessage::Answer { session_id, .. }
            | ControlMessage::Candidate { session_id, .. } => Some(session_id),
            ControlMessage::SessionNotFound { session_id }
            | ControlMessage::InvalidRequest { session_id, .. } => session_id.as_ref(),
        }
    }

    /// Target of a point-to-point negotiation message.
    pub fn target(&self) -> Option<&MemberId> {
        match self {
            ControlMessage::Offer { member, .. }
            | ControlMessage::Answer { member, .. }
            | ControlMessage::Candidate { member, .. } => Some(member),
            _ => None,
        }
    }

    pub fn sender(&self) -> Option<&MemberId> {
        match self {
            ControlMessage::Offer { from, .. }
            | ControlMessage::Answer { from, .. }
            | ControlMessage::Candidate { from, .. } => from.as_ref(),
            _ => None,
        }
    }

    /// Overwrites the sender stamp of a negotiation message. Other kinds are
    /// returned unchanged.
    pub fn stamped_by(mut self, sender: MemberId) -> Self {
        match &mut self {
            ControlMessage::Offer { from, .. }
            | ControlMessage::Answer { from, .. }
            | ControlMessage::Candidate { from, .. } => *from = Some(sender),
            _ => {}
        }
        self
    }
}
