use crate::peer::PeerConnection;
use huddle_core::{IceCandidate, MemberId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tokio::task::AbortHandle;
use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NegotiationRole {
    Offering,
    Answering,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NegotiationPhase {
    Idle,
    OfferCreated,
    AnswerCreated,
    LocalDescriptionSet,
    RemoteDescriptionSet,
    Connected,
    Closed,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{role:?} entry cannot move from {from:?} to {to:?}")]
pub struct InvalidTransition {
    pub role: NegotiationRole,
    pub from: NegotiationPhase,
    pub to: NegotiationPhase,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("an entry for {0} already exists")]
pub struct DuplicateEntry(pub MemberId);

/// One negotiation with one remote member.
///
/// Background work spawned for the entry (readiness polling, offer resend) is
/// registered here and aborted when the entry is dropped.
pub struct PeerEntry {
    connection: Arc<dyn PeerConnection>,
    role: NegotiationRole,
    phase: NegotiationPhase,
    generation: u64,
    created_at: Instant,
    tasks: Vec<AbortHandle>,
    /// Local candidates gathered while our offer waits for the channel.
    /// `None` once the offer went out or when none is pending.
    held_candidates: Option<Vec<IceCandidate>>,
}

impl PeerEntry {
    pub fn connection(&self) -> Arc<dyn PeerConnection> {
        Arc::clone(&self.connection)
    }

    pub fn role(&self) -> NegotiationRole {
        self.role
    }

    pub fn phase(&self) -> NegotiationPhase {
        self.phase
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn created_at(&self) -> Instant {
        self.created_at
    }

    /// Whether candidates may be applied directly to the connection.
    pub fn has_remote_description(&self) -> bool {
        use NegotiationPhase::*;
        match self.role {
            NegotiationRole::Offering => matches!(self.phase, RemoteDescriptionSet | Connected),
            NegotiationRole::Answering => matches!(
                self.phase,
                RemoteDescriptionSet | AnswerCreated | LocalDescriptionSet | Connected
            ),
        }
    }

    pub fn advance(&mut self, to: NegotiationPhase) -> Result<(), InvalidTransition> {
        use NegotiationPhase::*;
        let allowed = match (self.role, self.phase, to) {
            (_, Closed, _) => false,
            (_, _, Closed) => true,
            (NegotiationRole::Offering, Idle, OfferCreated)
            | (NegotiationRole::Offering, OfferCreated, LocalDescriptionSet)
            | (NegotiationRole::Offering, LocalDescriptionSet, RemoteDescriptionSet)
            | (NegotiationRole::Offering, RemoteDescriptionSet, Connected) => true,
            (NegotiationRole::Answering, Idle, RemoteDescriptionSet)
            | (NegotiationRole::Answering, RemoteDescriptionSet, AnswerCreated)
            | (NegotiationRole::Answering, AnswerCreated, LocalDescriptionSet)
            | (NegotiationRole::Answering, LocalDescriptionSet, Connected) => true,
            _ => false,
        };

        if !allowed {
            return Err(InvalidTransition {
                role: self.role,
                from: self.phase,
                to,
            });
        }
        self.phase = to;
        Ok(())
    }

    /// Local candidates are held from now on until [`Self::offer_delivered`].
    pub fn hold_candidates(&mut self) {
        self.held_candidates.get_or_insert_with(Vec::new);
    }

    /// Holds `candidate` if our offer is still pending. Hands it back when it
    /// can be sent right away.
    pub fn hold_candidate(&mut self, candidate: IceCandidate) -> Option<IceCandidate> {
        match &mut self.held_candidates {
            Some(held) => {
                held.push(candidate);
                None
            }
            None => Some(candidate),
        }
    }

    /// Stops holding and returns what was held, in gathering order.
    pub fn offer_delivered(&mut self) -> Vec<IceCandidate> {
        self.held_candidates.take().unwrap_or_default()
    }

    pub fn attach_task(&mut self, task: AbortHandle) {
        self.tasks.retain(|t| !t.is_finished());
        self.tasks.push(task);
    }
}

impl Drop for PeerEntry {
    fn drop(&mut self) {
        for task in self.tasks.drain(..) {
            task.abort();
        }
    }
}

impl fmt::Debug for PeerEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PeerEntry")
            .field("role", &self.role)
            .field("phase", &self.phase)
            .field("generation", &self.generation)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerSummary {
    pub member: MemberId,
    pub role: NegotiationRole,
    pub phase: NegotiationPhase,
    pub created_at: Instant,
}

/// At most one entry per remote member.
#[derive(Default)]
pub struct PeerTable {
    entries: HashMap<MemberId, PeerEntry>,
    last_generation: u64,
}

impl PeerTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates the generation for a connection about to be created, so its
    /// events can be matched against the entry that owns it.
    pub fn next_generation(&mut self) -> u64 {
        self.last_generation += 1;
        self.last_generation
    }

    pub fn insert(
        &mut self,
        member: MemberId,
        generation: u64,
        connection: Arc<dyn PeerConnection>,
        role: NegotiationRole,
    ) -> Result<&mut PeerEntry, DuplicateEntry> {
        use std::collections::hash_map::Entry;
        match self.entries.entry(member) {
            Entry::Occupied(occupied) => Err(DuplicateEntry(occupied.key().clone())),
            Entry::Vacant(vacant) => Ok(vacant.insert(PeerEntry {
                connection,
                role,
                phase: NegotiationPhase::Idle,
                generation,
                created_at: Instant::now(),
                tasks: Vec::new(),
                held_candidates: None,
            })),
        }
    }

    pub fn contains(&self, member: &MemberId) -> bool {
        self.entries.contains_key(member)
    }

    pub fn get(&self, member: &MemberId) -> Option<&PeerEntry> {
        self.entries.get(member)
    }

    pub fn get_mut(&mut self, member: &MemberId) -> Option<&mut PeerEntry> {
        self.entries.get_mut(member)
    }

    /// The entry for `member`, only if it still belongs to `generation`.
    pub fn current(&mut self, member: &MemberId, generation: u64) -> Option<&mut PeerEntry> {
        self.entries
            .get_mut(member)
            .filter(|entry| entry.generation == generation)
    }

    pub fn remove(&mut self, member: &MemberId) -> Option<PeerEntry> {
        self.entries.remove(member)
    }

    pub fn members(&self) -> Vec<MemberId> {
        self.entries.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn snapshot(&self) -> Vec<PeerSummary> {
        let mut summaries: Vec<PeerSummary> = self
            .entries
            .iter()
            .map(|(member, entry)| PeerSummary {
                member: member.clone(),
                role: entry.role,
                phase: entry.phase,
                created_at: entry.created_at,
            })
            .collect();
        summaries.sort_by(|a, b| a.member.cmp(&b.member));
        summaries
    }
}
