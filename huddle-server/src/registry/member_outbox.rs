use async_trait::async_trait;
use huddle_core::ControlMessage;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("member connection is gone")]
pub struct OutboxClosed;

/// Write side of one member's control channel, as seen by its session.
#[async_trait]
pub trait MemberOutbox: Send + Sync {
    async fn deliver(&self, message: &ControlMessage) -> Result<(), OutboxClosed>;
}
