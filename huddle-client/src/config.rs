use huddle_core::IceServerConfig;
use huddle_core::utils::default_ice_servers;
use std::time::Duration;

/// Exponential backoff: `base * 2^(attempt - 1)`, capped at `max_delay`, for at
/// most `max_attempts` attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    pub base: Duration,
    pub max_delay: Duration,
    pub max_attempts: u32,
}

impl BackoffPolicy {
    pub fn reconnect() -> Self {
        Self {
            base: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            max_attempts: 5,
        }
    }

    pub fn offer_send() -> Self {
        Self {
            base: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            max_attempts: 5,
        }
    }

    /// Delay to wait before `attempt` (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 1u32
            .checked_shl(attempt.saturating_sub(1))
            .unwrap_or(u32::MAX);
        self.base.saturating_mul(factor).min(self.max_delay)
    }

    pub fn allows(&self, attempt: u32) -> bool {
        attempt <= self.max_attempts
    }
}

/// Readiness polling used before an offer can be created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MediaWait {
    pub poll_interval: Duration,
    pub timeout: Duration,
}

impl Default for MediaWait {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(100),
            timeout: Duration::from_secs(10),
        }
    }
}

/// How an incoming offer is treated when an entry for that member already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GlarePolicy {
    /// The later offer is dropped. Mutual offers can stall.
    #[default]
    IgnoreDuplicate,
    /// The member with the lexicographically smaller identity keeps offering;
    /// the other one abandons its own offer and answers.
    LowerIdentityOffers,
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub ice_servers: Vec<IceServerConfig>,
    pub reconnect: BackoffPolicy,
    pub offer_retry: BackoffPolicy,
    pub media_wait: MediaWait,
    pub glare: GlarePolicy,
    pub max_pending_candidates: usize,
    pub orphan_candidate_ttl: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            ice_servers: default_ice_servers(),
            reconnect: BackoffPolicy::reconnect(),
            offer_retry: BackoffPolicy::offer_send(),
            media_wait: MediaWait::default(),
            glare: GlarePolicy::default(),
            max_pending_candidates: 256,
            orphan_candidate_ttl: Duration::from_secs(30),
        }
    }
}
