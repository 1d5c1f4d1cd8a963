//! The peer connection capability consumed by the signaling client.
//!
//! The media stack is opaque here: the client only drives descriptions and
//! candidates and listens to the events a connection reports back.

mod webrtc_peer;

pub use webrtc_peer::{WebRtcPeer, WebRtcPeerFactory};

use async_trait::async_trait;
use huddle_core::{IceCandidate, MemberId, SessionDescription};
use std::sync::Arc;
use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeerConnectionState {
    New,
    Connecting,
    Connected,
    Disconnected,
    Failed,
    Closed,
}

impl PeerConnectionState {
    /// States after which the connection is never usable again.
    pub fn is_terminal(self) -> bool {
        matches!(self, PeerConnectionState::Failed | PeerConnectionState::Closed)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PeerEvent {
    IceCandidate(IceCandidate),
    Track { track_id: String, stream_id: String },
    StateChanged(PeerConnectionState),
}

/// An event tagged with the entry it was produced for.
#[derive(Debug)]
pub(crate) struct PeerNotice {
    pub member: MemberId,
    pub generation: u64,
    pub event: PeerEvent,
}

/// Handed to a new connection so its callbacks can report back to the client
/// that owns it. Events from a connection that was since replaced are dropped
/// by the client.
#[derive(Debug, Clone)]
pub struct PeerEventSink {
    member: MemberId,
    generation: u64,
    tx: mpsc::UnboundedSender<PeerNotice>,
}

impl PeerEventSink {
    pub(crate) fn new(
        member: MemberId,
        generation: u64,
        tx: mpsc::UnboundedSender<PeerNotice>,
    ) -> Self {
        Self {
            member,
            generation,
            tx,
        }
    }

    pub fn member(&self) -> &MemberId {
        &self.member
    }

    pub fn emit(&self, event: PeerEvent) {
        let _ = self.tx.send(PeerNotice {
            member: self.member.clone(),
            generation: self.generation,
            event,
        });
    }

    pub fn ice_candidate(&self, candidate: IceCandidate) {
        self.emit(PeerEvent::IceCandidate(candidate));
    }

    pub fn track(&self, track_id: String, stream_id: String) {
        self.emit(PeerEvent::Track {
            track_id,
            stream_id,
        });
    }

    pub fn state_changed(&self, state: PeerConnectionState) {
        self.emit(PeerEvent::StateChanged(state));
    }
}

#[async_trait]
pub trait PeerConnection: Send + Sync {
    async fn create_offer(&self) -> anyhow::Result<SessionDescription>;

    async fn create_answer(&self) -> anyhow::Result<SessionDescription>;

    async fn set_local_description(&self, description: SessionDescription) -> anyhow::Result<()>;

    async fn set_remote_description(&self, description: SessionDescription)
    -> anyhow::Result<()>;

    async fn add_ice_candidate(&self, candidate: IceCandidate) -> anyhow::Result<()>;

    async fn close(&self) -> anyhow::Result<()>;
}

#[async_trait]
pub trait PeerConnectionFactory: Send + Sync + 'static {
    /// Creates the connection towards `events.member()`.
    async fn create(&self, events: PeerEventSink) -> anyhow::Result<Arc<dyn PeerConnection>>;
}
