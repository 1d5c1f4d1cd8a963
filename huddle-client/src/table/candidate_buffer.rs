use huddle_core::{IceCandidate, MemberId};
use std::collections::{HashMap, VecDeque};
use std::time::Duration;
use tokio::time::Instant;
use tracing::warn;

struct PendingQueue {
    candidates: VecDeque<IceCandidate>,
    first_buffered: Instant,
}

/// Remote ICE candidates that arrived before the remote description for their
/// member was applied, kept in arrival order per member.
///
/// Also remembers when each member's entry was last torn down, so candidates
/// still in flight for the dead connection are not kept for the next one.
pub struct CandidateBuffer {
    queues: HashMap<MemberId, PendingQueue>,
    closed: HashMap<MemberId, Instant>,
    max_per_member: usize,
}

impl CandidateBuffer {
    pub fn new(max_per_member: usize) -> Self {
        Self {
            queues: HashMap::new(),
            closed: HashMap::new(),
            max_per_member,
        }
    }

    /// Appends a candidate. Returns `false` when the member's queue is full and
    /// the candidate was rejected.
    pub fn push(&mut self, member: &MemberId, candidate: IceCandidate) -> bool {
        let queue = self
            .queues
            .entry(member.clone())
            .or_insert_with(|| PendingQueue {
                candidates: VecDeque::new(),
                first_buffered: Instant::now(),
            });

        if queue.candidates.len() >= self.max_per_member {
            warn!(
                "Pending candidate queue for {} is full ({}), rejecting candidate",
                member, self.max_per_member
            );
            return false;
        }
        queue.candidates.push_back(candidate);
        true
    }

    /// Removes and returns everything queued for `member`, oldest first.
    pub fn take(&mut self, member: &MemberId) -> Vec<IceCandidate> {
        self.queues
            .remove(member)
            .map(|q| q.candidates.into_iter().collect())
            .unwrap_or_default()
    }

    /// Drops everything queued for `member`, returning how many were discarded.
    pub fn discard(&mut self, member: &MemberId) -> usize {
        self.queues
            .remove(member)
            .map(|q| q.candidates.len())
            .unwrap_or(0)
    }

    /// Discards the queue of an entry being torn down and records when that
    /// happened.
    pub fn close(&mut self, member: &MemberId) -> usize {
        self.closed.insert(member.clone(), Instant::now());
        self.discard(member)
    }

    /// Whether `member`'s entry was torn down less than `ttl` ago.
    pub fn closed_within(&self, member: &MemberId, ttl: Duration) -> bool {
        self.closed
            .get(member)
            .is_some_and(|at| at.elapsed() < ttl)
    }

    /// Called before a new entry for `member` is created. Forgets the earlier
    /// teardown and drops a queue buffered more than `ttl` ago, returning how
    /// many candidates were dropped. A fresher queue is kept for the new entry.
    pub fn reopen(&mut self, member: &MemberId, ttl: Duration) -> usize {
        self.closed.remove(member);
        let stale = self
            .queues
            .get(member)
            .is_some_and(|q| q.first_buffered.elapsed() >= ttl);
        if !stale {
            return 0;
        }
        self.discard(member)
    }

    pub fn len(&self, member: &MemberId) -> usize {
        self.queues
            .get(member)
            .map(|q| q.candidates.len())
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.queues.is_empty()
    }

    /// Drops queues older than `ttl` whose member has no entry (`has_entry`
    /// returns false). Queues of live entries are never pruned.
    pub fn prune_orphans(
        &mut self,
        ttl: Duration,
        has_entry: impl Fn(&MemberId) -> bool,
    ) -> Vec<(MemberId, usize)> {
        let now = Instant::now();
        self.closed.retain(|_, at| now.duration_since(*at) < ttl);

        let expired: Vec<MemberId> = self
            .queues
            .iter()
            .filter(|(member, q)| {
                !has_entry(*member) && now.duration_since(q.first_buffered) >= ttl
            })
            .map(|(member, _)| member.clone())
            .collect();

        expired
            .into_iter()
            .map(|member| {
                let dropped = self.discard(&member);
                (member, dropped)
            })
            .collect()
    }

    pub fn clear(&mut self) {
        self.queues.clear();
        self.closed.clear();
    }
}
