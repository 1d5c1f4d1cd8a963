use crate::registry::{MemberOutbox, OutboxClosed};
use async_trait::async_trait;
use axum::extract::ws::Message;
use huddle_core::{ControlMessage, encode_text};
use tokio::sync::mpsc;
use tracing::error;

/// Queues control messages onto a socket's send task.
#[derive(Clone)]
pub struct WsOutbox {
    tx: mpsc::UnboundedSender<Message>,
}

impl WsOutbox {
    pub fn new(tx: mpsc::UnboundedSender<Message>) -> Self {
        Self { tx }
    }
}

#[async_trait]
impl MemberOutbox for WsOutbox {
    async fn deliver(&self, message: &ControlMessage) -> Result<(), OutboxClosed> {
        let json = match encode_text(message) {
            Ok(json) => json,
            Err(e) => {
                error!("Failed to serialize {}: {}", message.kind(), e);
                return Ok(());
            }
        };
        self.tx
            .send(Message::Text(json.into()))
            .map_err(|_| OutboxClosed)
    }
}
