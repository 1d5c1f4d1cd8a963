mod config;
mod error;
mod identity;
mod media;
pub mod peer;
mod session_api;
pub mod signaling;
pub mod table;
pub mod transport;

pub use config::{BackoffPolicy, ClientConfig, GlarePolicy, MediaWait};
pub use error::SignalingError;
pub use identity::{ENV_IDENTITY_PATH, IdentityError, IdentityStore};
pub use media::{MediaReadiness, MediaSignal, media_readiness};
pub use session_api::{CreateSessionError, create_session, session_endpoint};
pub use signaling::{ClientEvent, ClientHandle, SignalingClient};
