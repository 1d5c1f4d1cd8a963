pub mod codec;
pub mod model;
pub mod utils;

pub use codec::{DecodeError, EncodeError, decode, decode_text, encode, encode_text};
pub use model::{
    ControlMessage, IceCandidate, IceServerConfig, InvalidIdentifier, MemberId, MessageKind,
    SdpKind, SessionDescription, SessionId,
};
