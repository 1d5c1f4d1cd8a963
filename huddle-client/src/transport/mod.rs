//! Control channel lifecycle: connect, join, detect loss, reconnect.

mod channel_state;
mod connector;
mod control_sender;
mod supervisor;

pub use channel_state::{ChannelEvent, ChannelState};
pub use connector::{ChannelLink, Connector, FrameSink, FrameStream, TransportError, WsConnector};
pub use control_sender::{ChannelNotOpen, ControlSender};
pub use supervisor::{SupervisorHandle, TransportSupervisor};
