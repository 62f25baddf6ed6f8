//! Throttle policy.
//!
//! Pure threshold checks over scores already read from the counter store. Comparisons are
//! inclusive: a score equal to the threshold blocks. A key that was never written has score
//! 0 and, since thresholds are at least 1, is never blocked.

use crate::{config::ThrottleConfig, storage::Namespace};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThrottlePolicy {
    config: ThrottleConfig,
}

impl ThrottlePolicy {
    pub fn new(config: ThrottleConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ThrottleConfig {
        &self.config
    }

    /// The score at which keys in `namespace` become blocked.
    pub fn threshold(&self, namespace: Namespace) -> u64 {
        match namespace {
            Namespace::Locks => self.config.user_lock_threshold(),
            Namespace::Bans => self.config.ip_ban_threshold(),
        }
    }

    pub fn is_blocked(&self, namespace: Namespace, score: u64) -> bool {
        score >= self.threshold(namespace)
    }

    pub fn is_ip_banned(&self, score: u64) -> bool {
        self.is_blocked(Namespace::Bans, score)
    }

    pub fn is_user_locked(&self, score: u64) -> bool {
        self.is_blocked(Namespace::Locks, score)
    }
}
