//! Repository trait for the failure counter store.

use async_trait::async_trait;

use crate::{Error, storage::Namespace};

/// Key-value store of non-negative failure scores, split into two namespaces.
///
/// # Atomicity
///
/// `increment` and `reset_to_zero` must be atomic per `(namespace, key)`: concurrent
/// increments are never lost, and a reset is never overwritten by an increment that was
/// read before it. Operations on different keys must not wait on each other.
///
/// A key that was never written reads as score 0.
#[async_trait]
pub trait CounterRepository: Send + Sync + 'static {
    /// Current score of a key, 0 if absent.
    async fn score(&self, namespace: Namespace, key: &str) -> Result<u64, Error>;

    /// Add `delta` to a key's score, creating it at `delta` if absent.
    ///
    /// # Returns
    ///
    /// The score after the increment.
    async fn increment(&self, namespace: Namespace, key: &str, delta: u64) -> Result<u64, Error>;

    /// Set a key's score to exactly 0, creating it if absent.
    async fn reset_to_zero(&self, namespace: Namespace, key: &str) -> Result<(), Error>;

    /// Every key in the namespace whose score is at least `threshold`, in no particular order.
    async fn keys_at_or_above(
        &self,
        namespace: Namespace,
        threshold: u64,
    ) -> Result<Vec<String>, Error>;

    /// Drop every counter in both namespaces.
    ///
    /// # Returns
    ///
    /// The number of counters removed.
    async fn reset_all(&self) -> Result<u64, Error>;
}
