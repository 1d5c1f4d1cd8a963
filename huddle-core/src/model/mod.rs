mod control;
mod description;
mod ice;
mod member;
mod session;

pub use control::{ControlMessage, MessageKind};
pub use description::{SdpKind, SessionDescription};
pub use ice::{IceCandidate, IceServerConfig};
pub use member::{InvalidIdentifier, MemberId};
pub use session::SessionId;
