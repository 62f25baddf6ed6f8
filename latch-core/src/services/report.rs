use std::sync::Arc;

use crate::{
    Error, config::ThrottleConfig, outcome::Report, repositories::CounterRepository,
    services::ThrottlePolicy, storage::Namespace,
};

/// Lists every IP and login currently at or above its threshold.
pub struct ReportService<C: CounterRepository> {
    counters: Arc<C>,
    policy: ThrottlePolicy,
}

impl<C: CounterRepository> ReportService<C> {
    pub fn new(counters: Arc<C>, config: ThrottleConfig) -> Self {
        Self {
            counters,
            policy: ThrottlePolicy::new(config),
        }
    }

    /// Build the report.
    ///
    /// The two namespaces are read one after the other, so the result is not a single
    /// consistent snapshot under concurrent writes.
    pub async fn report(&self) -> Result<Report, Error> {
        let banned_ips = self
            .counters
            .keys_at_or_above(Namespace::Bans, self.policy.threshold(Namespace::Bans))
            .await?;
        let locked_logins = self
            .counters
            .keys_at_or_above(Namespace::Locks, self.policy.threshold(Namespace::Locks))
            .await?;

        Ok(Report {
            banned_ips: banned_ips.into_iter().collect(),
            locked_logins: locked_logins.into_iter().collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryCounterRepository;

    #[tokio::test]
    async fn test_empty_report() {
        let service = ReportService::new(
            Arc::new(InMemoryCounterRepository::new()),
            ThrottleConfig::default(),
        );
        let report = service.report().await.unwrap();
        assert!(report.banned_ips.is_empty());
        assert!(report.locked_logins.is_empty());
    }

    #[tokio::test]
    async fn test_report_uses_inclusive_thresholds() {
        let counters = Arc::new(InMemoryCounterRepository::new());
        counters.increment(Namespace::Bans, "10.0.0.5", 10).await.unwrap();
        counters.increment(Namespace::Bans, "10.0.0.6", 9).await.unwrap();
        counters.increment(Namespace::Locks, "alice", 3).await.unwrap();
        counters.increment(Namespace::Locks, "bob", 2).await.unwrap();
        counters.reset_to_zero(Namespace::Locks, "carol").await.unwrap();

        let service = ReportService::new(counters, ThrottleConfig::default());
        let report = service.report().await.unwrap();

        assert_eq!(
            report.banned_ips.into_iter().collect::<Vec<_>>(),
            vec!["10.0.0.5".to_string()]
        );
        assert_eq!(
            report.locked_logins.into_iter().collect::<Vec<_>>(),
            vec!["alice".to_string()]
        );
    }

    #[tokio::test]
    async fn test_report_drops_reset_keys() {
        let counters = Arc::new(InMemoryCounterRepository::new());
        counters.increment(Namespace::Locks, "alice", 5).await.unwrap();
        let service = ReportService::new(counters.clone(), ThrottleConfig::default());
        assert!(service.report().await.unwrap().locked_logins.contains("alice"));

        counters.reset_to_zero(Namespace::Locks, "alice").await.unwrap();
        assert!(service.report().await.unwrap().locked_logins.is_empty());
    }
}
