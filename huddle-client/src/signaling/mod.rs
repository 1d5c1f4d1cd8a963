mod client;
mod client_event;
mod handle_answer_impl;
mod handle_candidate_impl;
mod handle_message_impl;
mod handle_offer_impl;
mod handle_peer_event_impl;
mod member_joined_impl;
mod teardown_impl;

pub use client::{ClientHandle, SignalingClient};
pub use client_event::ClientEvent;

use crate::table::PeerSummary;
use huddle_core::MemberId;
use std::time::Duration;
use tokio::sync::oneshot;

pub(crate) enum ClientCommand {
    Leave { done: oneshot::Sender<()> },
    Snapshot { reply: oneshot::Sender<Vec<PeerSummary>> },
}

/// Results of background work owned by a peer entry, reported back to the
/// dispatch loop. Ignored when the entry's generation has moved on.
#[derive(Debug)]
pub(crate) enum EntryTaskResult {
    MediaReady {
        member: MemberId,
        generation: u64,
    },
    MediaTimedOut {
        member: MemberId,
        generation: u64,
        waited: Duration,
    },
    OfferDelivered {
        member: MemberId,
        generation: u64,
    },
    OfferUndeliverable {
        member: MemberId,
        generation: u64,
        attempts: u32,
    },
}
