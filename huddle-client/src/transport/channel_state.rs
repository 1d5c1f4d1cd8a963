use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    Connecting,
    Open,
    Reconnecting { attempt: u32 },
    /// Closed deliberately. Never reopened.
    Closed,
    /// Reconnect attempts exhausted. Never reopened.
    Unavailable,
}

impl ChannelState {
    pub fn is_open(self) -> bool {
        self == ChannelState::Open
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, ChannelState::Closed | ChannelState::Unavailable)
    }
}

/// Lifecycle notifications and inbound frames, in the order they happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelEvent {
    /// The channel opened and the join was sent.
    Opened { reconnect: bool },
    Frame(String),
    Lost { reason: String },
    Reconnecting { attempt: u32, delay: Duration },
    Unavailable { attempts: u32 },
    Closed,
}
