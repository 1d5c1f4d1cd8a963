use crate::registry::MemberOutbox;
use huddle_core::{ControlMessage, MemberId, SessionId};
use std::fmt;
use std::sync::Arc;
use std::time::SystemTime;
use tokio::sync::oneshot;

/// Identifies one accepted WebSocket, so a stale close cannot evict a
/// member that has since rejoined over a newer connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(pub u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Snapshot of a session's metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionInfo {
    pub id: SessionId,
    pub host: MemberId,
    pub created_at: SystemTime,
    pub members: Vec<MemberId>,
}

/// Commands delivered to a session actor by its member connections.
pub enum SessionCommand {
    /// Registers `member` on `connection`, replacing any earlier connection.
    Join {
        member: MemberId,
        connection: ConnectionId,
        outbox: Arc<dyn MemberOutbox>,
    },

    /// Negotiation message to forward to the member it names.
    Relay {
        from: MemberId,
        connection: ConnectionId,
        message: ControlMessage,
    },

    /// The connection closed.
    Leave {
        member: MemberId,
        connection: ConnectionId,
    },

    Describe { reply: oneshot::Sender<SessionInfo> },
}

impl fmt::Debug for SessionCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionCommand::Join {
                member, connection, ..
            } => write!(f, "Join({}, {})", member, connection),
            SessionCommand::Relay {
                from,
                connection,
                message,
            } => write!(f, "Relay({} from {}, {})", message.kind(), from, connection),
            SessionCommand::Leave { member, connection } => {
                write!(f, "Leave({}, {})", member, connection)
            }
            SessionCommand::Describe { .. } => f.write_str("Describe"),
        }
    }
}
