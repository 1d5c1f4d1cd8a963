use async_trait::async_trait;
use huddle_core::ControlMessage;
use huddle_server::{MemberOutbox, OutboxClosed};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::mpsc;

/// MemberOutbox that captures everything a session delivers.
#[derive(Clone)]
pub struct MockOutbox {
    tx: mpsc::UnboundedSender<ControlMessage>,
    closed: Arc<AtomicBool>,
}

impl MockOutbox {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ControlMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let outbox = Self {
            tx,
            closed: Arc::new(AtomicBool::new(false)),
        };
        (outbox, rx)
    }

    /// Makes every further delivery fail, like a socket that went away.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl MemberOutbox for MockOutbox {
    async fn deliver(&self, message: &ControlMessage) -> Result<(), OutboxClosed> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(OutboxClosed);
        }
        tracing::debug!("[MockOutbox] deliver {}", message.kind());
        self.tx.send(message.clone()).map_err(|_| OutboxClosed)
    }
}
