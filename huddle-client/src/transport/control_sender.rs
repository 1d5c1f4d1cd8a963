use crate::transport::ChannelState;
use huddle_core::ControlMessage;
use thiserror::Error;
use tokio::sync::{mpsc, watch};

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("control channel is not open ({0:?})")]
pub struct ChannelNotOpen(pub ChannelState);

/// Queues outbound control messages for the supervisor.
///
/// A send is refused unless the channel is open at that moment; callers that
/// need delivery across a reconnect retry on their own.
#[derive(Clone)]
pub struct ControlSender {
    tx: mpsc::UnboundedSender<ControlMessage>,
    state: watch::Receiver<ChannelState>,
}

impl ControlSender {
    pub(crate) fn new(
        tx: mpsc::UnboundedSender<ControlMessage>,
        state: watch::Receiver<ChannelState>,
    ) -> Self {
        Self { tx, state }
    }

    pub fn state(&self) -> ChannelState {
        *self.state.borrow()
    }

    pub fn send(&self, message: ControlMessage) -> Result<(), ChannelNotOpen> {
        let state = self.state();
        if !state.is_open() {
            return Err(ChannelNotOpen(state));
        }
        self.tx
            .send(message)
            .map_err(|_| ChannelNotOpen(ChannelState::Closed))
    }
}
