//! Login attempt orchestration.
//!
//! [`LoginThrottleService::attempt`] decides whether a login attempt may proceed to password
//! verification and keeps the per-login and per-IP failure counters up to date.
//!
//! # Order of checks
//!
//! 1. Look up the credential for the login.
//! 2. If the client IP is banned, record a failure and return `Banned`. This happens before
//!    anything else is revealed, so a banned client cannot learn whether a login exists.
//! 3. If no credential exists, record an IP-only failure and return `WrongLogin`.
//! 4. If the login is locked, record a failure and return `Locked`.
//! 5. Verify the password; reset both counters on a match, otherwise record a failure.
//!
//! # Event recording
//!
//! Every failure increments the IP's ban counter. The login's lock counter is only
//! incremented when the login has a credential, so probing unknown logins never creates
//! lock entries. A success resets both counters to 0.
//!
//! # Example
//!
//! ```rust,ignore
//! use latch_core::services::LoginThrottleService;
//!
//! let service = LoginThrottleService::new(counters, credentials, ThrottleConfig::default());
//!
//! match service.attempt("alice", "hunter2", "10.0.0.5").await? {
//!     AttemptOutcome::Success(credential) => { /* start a session */ }
//!     AttemptOutcome::Banned => { /* "You're banned." */ }
//!     _ => { /* ... */ }
//! }
//! ```

use std::sync::Arc;

use crate::{
    Error,
    config::ThrottleConfig,
    outcome::AttemptOutcome,
    repositories::{CounterRepository, CredentialRepository},
    services::ThrottlePolicy,
    storage::{CounterStatus, Namespace},
};

/// Service coordinating the policy, the counter store and the credential source.
///
/// # Thread Safety
///
/// The service holds no mutable state of its own and can be shared across tasks. Per-key
/// atomicity comes from the counter repository; the login and IP updates of one attempt are
/// independent writes and are not applied as a transaction.
pub struct LoginThrottleService<C: CounterRepository, U: CredentialRepository> {
    counters: Arc<C>,
    credentials: Arc<U>,
    policy: ThrottlePolicy,
}

impl<C: CounterRepository, U: CredentialRepository> LoginThrottleService<C, U> {
    pub fn new(counters: Arc<C>, credentials: Arc<U>, config: ThrottleConfig) -> Self {
        Self {
            counters,
            credentials,
            policy: ThrottlePolicy::new(config),
        }
    }

    pub fn config(&self) -> &ThrottleConfig {
        self.policy.config()
    }

    pub fn policy(&self) -> &ThrottlePolicy {
        &self.policy
    }

    /// Check whether an IP address has reached the ban threshold.
    pub async fn is_ip_banned(&self, ip: &str) -> Result<bool, Error> {
        let score = self.counters.score(Namespace::Bans, ip).await?;
        Ok(self.policy.is_ip_banned(score))
    }

    /// Check whether a login has reached the lock threshold.
    pub async fn is_user_locked(&self, login: &str) -> Result<bool, Error> {
        let score = self.counters.score(Namespace::Locks, login).await?;
        Ok(self.policy.is_user_locked(score))
    }

    /// Evaluate one login attempt from `ip`.
    ///
    /// # Errors
    ///
    /// Only infrastructure failures. A failure part-way through is returned immediately;
    /// counter writes that already happened are not rolled back.
    pub async fn attempt(
        &self,
        login: &str,
        password: &str,
        ip: &str,
    ) -> Result<AttemptOutcome, Error> {
        let credential = self.credentials.find_by_login(login).await?;

        if self.is_ip_banned(ip).await? {
            let known_login = credential.as_ref().map(|_| login);
            self.record_event(false, known_login, ip).await?;
            tracing::debug!(login = %login, ip = %ip, "Rejected attempt from banned IP");
            return Ok(AttemptOutcome::Banned);
        }

        let Some(credential) = credential else {
            self.record_event(false, None, ip).await?;
            tracing::debug!(login = %login, ip = %ip, "Rejected attempt on unknown login");
            return Ok(AttemptOutcome::WrongLogin);
        };

        if self.is_user_locked(login).await? {
            self.record_event(false, Some(login), ip).await?;
            tracing::debug!(login = %login, ip = %ip, "Rejected attempt on locked login");
            return Ok(AttemptOutcome::Locked);
        }

        if credential.verify_password(password) {
            self.record_event(true, Some(login), ip).await?;
            tracing::debug!(login = %login, ip = %ip, "Accepted login");
            Ok(AttemptOutcome::Success(credential))
        } else {
            self.record_event(false, Some(login), ip).await?;
            tracing::debug!(login = %login, ip = %ip, "Rejected wrong password");
            Ok(AttemptOutcome::WrongPassword)
        }
    }

    /// Apply the counter updates for one attempt.
    ///
    /// On success both counters are reset to 0. On failure the IP counter is always
    /// incremented, and the login counter only if `login` is given.
    pub async fn record_event(
        &self,
        succeeded: bool,
        login: Option<&str>,
        ip: &str,
    ) -> Result<(), Error> {
        if succeeded {
            if let Some(login) = login {
                self.counters.reset_to_zero(Namespace::Locks, login).await?;
            }
            self.counters.reset_to_zero(Namespace::Bans, ip).await?;
            tracing::debug!(login = ?login, ip = %ip, "Recorded successful login");
            return Ok(());
        }

        if let Some(login) = login {
            let score = self.counters.increment(Namespace::Locks, login, 1).await?;
            if score == self.policy.threshold(Namespace::Locks) {
                tracing::warn!(login = %login, score = score, "Login locked");
            }
        }

        let score = self.counters.increment(Namespace::Bans, ip, 1).await?;
        if score == self.policy.threshold(Namespace::Bans) {
            tracing::warn!(ip = %ip, score = score, "IP banned");
        }

        tracing::debug!(login = ?login, ip = %ip, "Recorded failed login");
        Ok(())
    }

    /// Current lock score of a login.
    pub async fn login_status(&self, login: &str) -> Result<CounterStatus, Error> {
        self.status(Namespace::Locks, login).await
    }

    /// Current ban score of an IP address.
    pub async fn ip_status(&self, ip: &str) -> Result<CounterStatus, Error> {
        self.status(Namespace::Bans, ip).await
    }

    /// Reset a login's lock counter.
    ///
    /// # Returns
    ///
    /// `true` if the login was locked before the reset.
    pub async fn unlock_login(&self, login: &str) -> Result<bool, Error> {
        let was_locked = self.is_user_locked(login).await?;
        self.counters.reset_to_zero(Namespace::Locks, login).await?;
        tracing::info!(login = %login, was_locked = was_locked, "Unlocked login");
        Ok(was_locked)
    }

    /// Reset an IP's ban counter.
    ///
    /// # Returns
    ///
    /// `true` if the IP was banned before the reset.
    pub async fn unban_ip(&self, ip: &str) -> Result<bool, Error> {
        let was_banned = self.is_ip_banned(ip).await?;
        self.counters.reset_to_zero(Namespace::Bans, ip).await?;
        tracing::info!(ip = %ip, was_banned = was_banned, "Unbanned IP");
        Ok(was_banned)
    }

    /// Flush every counter in both namespaces.
    pub async fn reset_all(&self) -> Result<u64, Error> {
        let removed = self.counters.reset_all().await?;
        tracing::info!(removed = removed, "Reset all failure counters");
        Ok(removed)
    }

    async fn status(&self, namespace: Namespace, key: &str) -> Result<CounterStatus, Error> {
        let score = self.counters.score(namespace, key).await?;
        Ok(CounterStatus {
            key: key.to_string(),
            score,
            blocked: self.policy.is_blocked(namespace, score),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        credential::{Credential, NewCredential},
        error::InfrastructureError,
        memory::{InMemoryCounterRepository, InMemoryCredentialRepository},
    };
    use async_trait::async_trait;

    type Service = LoginThrottleService<InMemoryCounterRepository, InMemoryCredentialRepository>;

    async fn setup(config: ThrottleConfig) -> (Service, Arc<InMemoryCounterRepository>) {
        let counters = Arc::new(InMemoryCounterRepository::new());
        let credentials = Arc::new(InMemoryCredentialRepository::new());
        for (login, password) in [("alice", "alice-pw"), ("bob", "bob-pw"), ("carol", "carol-pw")]
        {
            credentials
                .create(
                    NewCredential::builder()
                        .login(login)
                        .password(password)
                        .build()
                        .unwrap(),
                )
                .await
                .unwrap();
        }
        (
            LoginThrottleService::new(counters.clone(), credentials, config),
            counters,
        )
    }

    const IP: &str = "192.168.0.10";

    #[tokio::test]
    async fn test_unseen_keys_are_not_blocked() {
        let (service, _) = setup(ThrottleConfig::default()).await;
        assert!(!service.is_user_locked("never-seen").await.unwrap());
        assert!(!service.is_ip_banned("203.0.113.1").await.unwrap());
    }

    #[tokio::test]
    async fn test_success_returns_credential() {
        let (service, counters) = setup(ThrottleConfig::default()).await;

        let outcome = service.attempt("alice", "alice-pw", IP).await.unwrap();
        let credential = outcome.credential().unwrap();
        assert_eq!(credential.login, "alice");
        assert_eq!(counters.score(Namespace::Locks, "alice").await.unwrap(), 0);
        assert_eq!(counters.score(Namespace::Bans, IP).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_lock_after_threshold_failures() {
        let (service, _) = setup(ThrottleConfig::default()).await;

        for _ in 0..2 {
            let outcome = service.attempt("alice", "wrong", IP).await.unwrap();
            assert_eq!(outcome, AttemptOutcome::WrongPassword);
        }
        assert!(!service.is_user_locked("alice").await.unwrap());

        assert_eq!(
            service.attempt("alice", "wrong", IP).await.unwrap(),
            AttemptOutcome::WrongPassword
        );
        assert!(service.is_user_locked("alice").await.unwrap());

        // even the right password is refused once locked
        assert_eq!(
            service.attempt("alice", "alice-pw", IP).await.unwrap(),
            AttemptOutcome::Locked
        );
    }

    #[tokio::test]
    async fn test_success_resets_lock_score() {
        let (service, counters) = setup(ThrottleConfig::default()).await;

        service.attempt("alice", "wrong", IP).await.unwrap();
        service.attempt("alice", "wrong", IP).await.unwrap();
        assert_eq!(counters.score(Namespace::Locks, "alice").await.unwrap(), 2);

        assert!(
            service
                .attempt("alice", "alice-pw", IP)
                .await
                .unwrap()
                .is_success()
        );
        assert_eq!(counters.score(Namespace::Locks, "alice").await.unwrap(), 0);

        assert_eq!(
            service.attempt("alice", "wrong", IP).await.unwrap(),
            AttemptOutcome::WrongPassword
        );
        assert_eq!(counters.score(Namespace::Locks, "alice").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_ip_ban_across_logins() {
        // high lock threshold so only the IP counter matters
        let (service, counters) = setup(ThrottleConfig::new(100, 10).unwrap()).await;
        let ip = "10.0.0.5";

        for i in 0..10 {
            let login = ["bob", "carol", "eve"][i % 3];
            let outcome = service.attempt(login, "wrong", ip).await.unwrap();
            if login == "eve" {
                assert_eq!(outcome, AttemptOutcome::WrongLogin);
            } else {
                assert_eq!(outcome, AttemptOutcome::WrongPassword);
            }
        }
        assert!(service.is_ip_banned(ip).await.unwrap());
        assert_eq!(counters.score(Namespace::Bans, ip).await.unwrap(), 10);

        assert_eq!(
            service.attempt("bob", "bob-pw", ip).await.unwrap(),
            AttemptOutcome::Banned
        );

        // other addresses are unaffected
        assert!(
            service
                .attempt("bob", "bob-pw", "10.0.0.6")
                .await
                .unwrap()
                .is_success()
        );
    }

    #[tokio::test]
    async fn test_banned_takes_precedence_over_locked_and_unknown() {
        let (service, counters) = setup(ThrottleConfig::new(1, 1).unwrap()).await;
        counters.increment(Namespace::Bans, IP, 1).await.unwrap();
        counters.increment(Namespace::Locks, "alice", 1).await.unwrap();

        assert_eq!(
            service.attempt("alice", "alice-pw", IP).await.unwrap(),
            AttemptOutcome::Banned
        );
        assert_eq!(
            service.attempt("nobody", "x", IP).await.unwrap(),
            AttemptOutcome::Banned
        );
    }

    #[tokio::test]
    async fn test_banned_attempt_counts_only_known_logins() {
        let (service, counters) = setup(ThrottleConfig::new(100, 1).unwrap()).await;
        counters.increment(Namespace::Bans, IP, 1).await.unwrap();

        service.attempt("alice", "alice-pw", IP).await.unwrap();
        service.attempt("ghost", "x", IP).await.unwrap();

        assert_eq!(counters.score(Namespace::Locks, "alice").await.unwrap(), 1);
        assert_eq!(counters.score(Namespace::Locks, "ghost").await.unwrap(), 0);
        assert_eq!(counters.score(Namespace::Bans, IP).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_unknown_login_only_penalizes_ip() {
        let (service, counters) = setup(ThrottleConfig::default()).await;

        assert_eq!(
            service.attempt("nobody", "whatever", IP).await.unwrap(),
            AttemptOutcome::WrongLogin
        );
        assert_eq!(counters.score(Namespace::Bans, IP).await.unwrap(), 1);
        assert!(
            counters
                .keys_at_or_above(Namespace::Locks, 0)
                .await
                .unwrap()
                .is_empty()
        );
        assert!(!service.is_user_locked("nobody").await.unwrap());
    }

    #[tokio::test]
    async fn test_unknown_login_is_never_locked() {
        let (service, _) = setup(ThrottleConfig::new(1, 100).unwrap()).await;

        for _ in 0..5 {
            assert_eq!(
                service.attempt("nobody", "x", IP).await.unwrap(),
                AttemptOutcome::WrongLogin
            );
        }
    }

    #[tokio::test]
    async fn test_locked_attempt_still_counts() {
        let (service, counters) = setup(ThrottleConfig::new(1, 100).unwrap()).await;

        service.attempt("alice", "wrong", IP).await.unwrap();
        assert_eq!(
            service.attempt("alice", "wrong", IP).await.unwrap(),
            AttemptOutcome::Locked
        );
        assert_eq!(counters.score(Namespace::Locks, "alice").await.unwrap(), 2);
        assert_eq!(counters.score(Namespace::Bans, IP).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_record_event_without_login() {
        let (service, counters) = setup(ThrottleConfig::default()).await;

        service.record_event(false, None, IP).await.unwrap();
        service.record_event(false, None, IP).await.unwrap();
        assert_eq!(counters.score(Namespace::Bans, IP).await.unwrap(), 2);

        service.record_event(true, None, IP).await.unwrap();
        assert_eq!(counters.score(Namespace::Bans, IP).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_unlock_and_unban() {
        let (service, _) = setup(ThrottleConfig::new(1, 1).unwrap()).await;
        service.attempt("alice", "wrong", IP).await.unwrap();

        assert!(service.login_status("alice").await.unwrap().blocked);
        assert!(service.ip_status(IP).await.unwrap().blocked);

        assert!(service.unlock_login("alice").await.unwrap());
        assert!(!service.unlock_login("alice").await.unwrap());
        assert!(service.unban_ip(IP).await.unwrap());
        assert!(!service.unban_ip(IP).await.unwrap());

        let status = service.login_status("alice").await.unwrap();
        assert_eq!(status.score, 0);
        assert!(!status.blocked);
    }

    #[tokio::test]
    async fn test_reset_all_clears_blocks() {
        let (service, _) = setup(ThrottleConfig::new(1, 1).unwrap()).await;
        service.attempt("alice", "wrong", IP).await.unwrap();

        assert_eq!(service.reset_all().await.unwrap(), 2);
        assert!(
            service
                .attempt("alice", "alice-pw", IP)
                .await
                .unwrap()
                .is_success()
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_parallel_failures_are_all_counted() {
        let (service, counters) = setup(ThrottleConfig::new(1_000, 1_000).unwrap()).await;
        let service = Arc::new(service);
        let mut handles = Vec::new();

        for i in 0..50 {
            let service = service.clone();
            handles.push(tokio::spawn(async move {
                let ip = format!("10.1.0.{i}");
                service.attempt("alice", "wrong", &ip).await.unwrap()
            }));
        }
        for handle in handles {
            assert_eq!(handle.await.unwrap(), AttemptOutcome::WrongPassword);
        }

        assert_eq!(counters.score(Namespace::Locks, "alice").await.unwrap(), 50);
    }

    struct UnavailableCounters;

    #[async_trait]
    impl CounterRepository for UnavailableCounters {
        async fn score(&self, _: Namespace, _: &str) -> Result<u64, Error> {
            Err(InfrastructureError::CounterStore("unreachable".to_string()).into())
        }

        async fn increment(&self, _: Namespace, _: &str, _: u64) -> Result<u64, Error> {
            Err(InfrastructureError::CounterStore("unreachable".to_string()).into())
        }

        async fn reset_to_zero(&self, _: Namespace, _: &str) -> Result<(), Error> {
            Err(InfrastructureError::CounterStore("unreachable".to_string()).into())
        }

        async fn keys_at_or_above(&self, _: Namespace, _: u64) -> Result<Vec<String>, Error> {
            Err(InfrastructureError::CounterStore("unreachable".to_string()).into())
        }

        async fn reset_all(&self) -> Result<u64, Error> {
            Err(InfrastructureError::CounterStore("unreachable".to_string()).into())
        }
    }

    struct UnavailableCredentials;

    #[async_trait]
    impl CredentialRepository for UnavailableCredentials {
        async fn find_by_login(&self, _: &str) -> Result<Option<Credential>, Error> {
            Err(InfrastructureError::CredentialLookup("timed out".to_string()).into())
        }

        async fn create(&self, _: NewCredential) -> Result<Credential, Error> {
            Err(InfrastructureError::CredentialLookup("timed out".to_string()).into())
        }
    }

    #[tokio::test]
    async fn test_counter_store_failure_is_infrastructure_error() {
        let service = LoginThrottleService::new(
            Arc::new(UnavailableCounters),
            Arc::new(InMemoryCredentialRepository::new()),
            ThrottleConfig::default(),
        );

        let err = service.attempt("alice", "pw", IP).await.unwrap_err();
        assert!(err.is_infrastructure_error());
    }

    #[tokio::test]
    async fn test_credential_lookup_failure_is_not_wrong_login() {
        let counters = Arc::new(InMemoryCounterRepository::new());
        let service = LoginThrottleService::new(
            counters.clone(),
            Arc::new(UnavailableCredentials),
            ThrottleConfig::default(),
        );

        let err = service.attempt("alice", "pw", IP).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Infrastructure(InfrastructureError::CredentialLookup(_))
        ));
        // nothing was recorded
        assert_eq!(counters.score(Namespace::Bans, IP).await.unwrap(), 0);
    }
}
