mod candidate_buffer;
mod peer_table;

pub use candidate_buffer::CandidateBuffer;
pub use peer_table::{
    DuplicateEntry, InvalidTransition, NegotiationPhase, NegotiationRole, PeerEntry, PeerSummary,
    PeerTable,
};
