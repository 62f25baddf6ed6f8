//! # Latch
//!
//! Latch throttles password logins. It counts failed attempts per login and per client IP and
//! refuses further attempts once either count reaches its threshold:
//!
//! - a login with `user_lock_threshold` consecutive failures is **locked**
//! - an IP with `ip_ban_threshold` consecutive failures is **banned**
//!
//! A successful login resets both counters. Administrators can list every blocked key, unlock
//! or unban a single key, or reset everything.
//!
//! ## Storage Support
//!
//! - In-memory ([`InMemoryRepositoryProvider`]), for tests and single-process deployments
//! - SQLite ([`SqliteRepositoryProvider`], `sqlite` feature, enabled by default)
//!
//! ## Example
//!
//! ```rust,no_run
//! use latch::{AttemptOutcome, LatchBuilder};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let latch = LatchBuilder::new()
//!         .with_sqlite("sqlite::memory:")
//!         .await?
//!         .apply_migrations(true)
//!         .build()
//!         .await?;
//!
//!     latch.register_credential("alice", "correct horse").await?;
//!
//!     match latch.attempt_login("alice", "correct horse", "10.0.0.1").await? {
//!         AttemptOutcome::Success(credential) => println!("welcome {}", credential.login),
//!         other => println!("rejected: {other}"),
//!     }
//!     Ok(())
//! }
//! ```
use std::sync::Arc;

use latch_core::{
    NewCredential,
    repositories::{
        CounterRepositoryAdapter, CredentialRepository, CredentialRepositoryAdapter,
        LoginHistoryRepositoryAdapter, RepositoryProvider,
    },
    services::{LoginHistoryService, LoginThrottleService, ReportService},
};

mod builder;

pub use builder::{LatchBuilder, LatchBuilderError, NoStorage, WithStorage};

/// Re-export core types from latch_core
pub use latch_core::{
    AttemptOutcome, CounterStatus, Credential, CredentialId, LoginRecord, LoginResult, Namespace,
    Report, ThrottleConfig, memory::InMemoryRepositoryProvider,
};

#[cfg(feature = "sqlite")]
pub use latch_storage_sqlite::{SqliteRepositoryProvider, SqliteStorage};

/// Errors that can occur when using Latch.
///
/// Locked, banned and wrong-credential results are not errors; they come back as
/// [`AttemptOutcome`] values.
#[derive(Debug, thiserror::Error)]
pub enum LatchError {
    /// A backing store failed or timed out; no decision was made
    #[error("Infrastructure error: {0}")]
    Infrastructure(String),
    /// Bad input or configuration
    #[error("Validation error: {0}")]
    Validation(String),
}

impl LatchError {
    pub fn is_infrastructure(&self) -> bool {
        matches!(self, LatchError::Infrastructure(_))
    }
}

impl From<latch_core::Error> for LatchError {
    fn from(error: latch_core::Error) -> Self {
        match error {
            latch_core::Error::Infrastructure(e) => LatchError::Infrastructure(e.to_string()),
            latch_core::Error::Validation(e) => LatchError::Validation(e.to_string()),
        }
    }
}

type Throttle<R> = LoginThrottleService<CounterRepositoryAdapter<R>, CredentialRepositoryAdapter<R>>;

/// The login throttle, wired to one storage backend.
///
/// # Example
///
/// ```rust,no_run
/// use latch::{InMemoryRepositoryProvider, Latch, ThrottleConfig};
/// use std::sync::Arc;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = ThrottleConfig::from_env()?;
///     let latch = Latch::with_config(Arc::new(InMemoryRepositoryProvider::new()), config);
///
///     let report = latch.report().await?;
///     println!("{} banned IPs", report.banned_ips.len());
///     Ok(())
/// }
/// ```
pub struct Latch<R: RepositoryProvider> {
    repositories: Arc<R>,
    credentials: Arc<CredentialRepositoryAdapter<R>>,
    throttle: Arc<Throttle<R>>,
    report_service: Arc<ReportService<CounterRepositoryAdapter<R>>>,
    login_history_service: Arc<LoginHistoryService<LoginHistoryRepositoryAdapter<R>>>,
}

impl<R: RepositoryProvider> Latch<R> {
    /// Create a Latch with the default thresholds (3 per login, 10 per IP).
    pub fn new(repositories: Arc<R>) -> Self {
        Self::with_config(repositories, ThrottleConfig::default())
    }

    pub fn with_config(repositories: Arc<R>, config: ThrottleConfig) -> Self {
        let counters = Arc::new(CounterRepositoryAdapter::new(repositories.clone()));
        let credentials = Arc::new(CredentialRepositoryAdapter::new(repositories.clone()));
        let login_history = Arc::new(LoginHistoryRepositoryAdapter::new(repositories.clone()));

        Self {
            repositories,
            credentials: credentials.clone(),
            throttle: Arc::new(LoginThrottleService::new(
                counters.clone(),
                credentials,
                config,
            )),
            report_service: Arc::new(ReportService::new(counters, config)),
            login_history_service: Arc::new(LoginHistoryService::new(login_history)),
        }
    }

    pub fn config(&self) -> &ThrottleConfig {
        self.throttle.config()
    }

    /// Run migrations for all repositories
    pub async fn migrate(&self) -> Result<(), LatchError> {
        Ok(self.repositories.migrate().await?)
    }

    /// Health check for all repositories
    pub async fn health_check(&self) -> Result<(), LatchError> {
        Ok(self.repositories.health_check().await?)
    }

    /// Evaluate one login attempt.
    ///
    /// # Arguments
    ///
    /// * `login` - The login name as submitted
    /// * `password` - The password as submitted
    /// * `ip` - The client address the attempt came from
    ///
    /// # Returns
    ///
    /// The policy outcome. Counters have already been updated when this returns.
    pub async fn attempt_login(
        &self,
        login: &str,
        password: &str,
        ip: &str,
    ) -> Result<AttemptOutcome, LatchError> {
        Ok(self.throttle.attempt(login, password, ip).await?)
    }

    /// Like [`attempt_login`](Self::attempt_login), and on success also swap in the login
    /// history record.
    ///
    /// `previous_login` is the login before this one, or this one if there was none.
    pub async fn login(
        &self,
        login: &str,
        password: &str,
        ip: &str,
    ) -> Result<LoginResult, LatchError> {
        let outcome = self.attempt_login(login, password, ip).await?;

        let previous_login = match outcome.credential() {
            Some(credential) => Some(
                self.login_history_service
                    .record_login(credential.id, ip)
                    .await?,
            ),
            None => None,
        };

        Ok(LoginResult {
            outcome,
            previous_login,
        })
    }

    /// Record the counter effects of an attempt that was evaluated elsewhere.
    pub async fn record_event(
        &self,
        succeeded: bool,
        login: Option<&str>,
        ip: &str,
    ) -> Result<(), LatchError> {
        Ok(self.throttle.record_event(succeeded, login, ip).await?)
    }

    pub async fn is_ip_banned(&self, ip: &str) -> Result<bool, LatchError> {
        Ok(self.throttle.is_ip_banned(ip).await?)
    }

    pub async fn is_user_locked(&self, login: &str) -> Result<bool, LatchError> {
        Ok(self.throttle.is_user_locked(login).await?)
    }

    /// All banned IPs and locked logins at the time of the call.
    pub async fn report(&self) -> Result<Report, LatchError> {
        Ok(self.report_service.report().await?)
    }

    /// Drop every counter in both namespaces.
    ///
    /// # Returns
    ///
    /// The number of counters removed.
    pub async fn reset_all(&self) -> Result<u64, LatchError> {
        Ok(self.throttle.reset_all().await?)
    }

    /// Returns whether the login was locked before the reset.
    pub async fn unlock_login(&self, login: &str) -> Result<bool, LatchError> {
        Ok(self.throttle.unlock_login(login).await?)
    }

    /// Returns whether the IP was banned before the reset.
    pub async fn unban_ip(&self, ip: &str) -> Result<bool, LatchError> {
        Ok(self.throttle.unban_ip(ip).await?)
    }

    pub async fn login_status(&self, login: &str) -> Result<CounterStatus, LatchError> {
        Ok(self.throttle.login_status(login).await?)
    }

    pub async fn ip_status(&self, ip: &str) -> Result<CounterStatus, LatchError> {
        Ok(self.throttle.ip_status(ip).await?)
    }

    /// Store a new credential with a freshly generated salt.
    ///
    /// # Errors
    ///
    /// [`LatchError::Validation`] if the login or password is empty or malformed, or the login
    /// is already registered.
    pub async fn register_credential(
        &self,
        login: &str,
        password: &str,
    ) -> Result<Credential, LatchError> {
        let new_credential = NewCredential::builder()
            .login(login)
            .password(password)
            .build()?;

        let credential = self.credentials.create(new_credential).await?;
        tracing::info!(login = %credential.login, id = %credential.id, "Registered credential");
        Ok(credential)
    }

    /// The previous successful login for a credential, if any.
    pub async fn last_login(
        &self,
        credential_id: CredentialId,
    ) -> Result<Option<LoginRecord>, LatchError> {
        Ok(self.login_history_service.last_login(credential_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn latch() -> Latch<InMemoryRepositoryProvider> {
        Latch::new(Arc::new(InMemoryRepositoryProvider::new()))
    }

    #[tokio::test]
    async fn test_register_and_login() {
        let latch = latch();
        latch.register_credential("alice", "pw").await.unwrap();

        let result = latch.login("alice", "pw", "10.0.0.1").await.unwrap();
        assert!(result.outcome.is_success());
        let previous = result.previous_login.unwrap();
        assert_eq!(previous.ip_address, "10.0.0.1");

        let result = latch.login("alice", "pw", "10.0.0.2").await.unwrap();
        assert_eq!(result.previous_login.unwrap().ip_address, "10.0.0.1");
    }

    #[tokio::test]
    async fn test_failed_login_has_no_history() {
        let latch = latch();
        let credential = latch.register_credential("alice", "pw").await.unwrap();

        let result = latch.login("alice", "nope", "10.0.0.1").await.unwrap();
        assert_eq!(result.outcome, AttemptOutcome::WrongPassword);
        assert!(result.previous_login.is_none());
        assert!(latch.last_login(credential.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_register_rejects_bad_input() {
        let latch = latch();
        assert!(matches!(
            latch.register_credential("", "pw").await,
            Err(LatchError::Validation(_))
        ));
        assert!(matches!(
            latch.register_credential("alice", "").await,
            Err(LatchError::Validation(_))
        ));

        latch.register_credential("alice", "pw").await.unwrap();
        assert!(matches!(
            latch.register_credential("alice", "other").await,
            Err(LatchError::Validation(_))
        ));
    }

    #[test]
    fn test_error_conversion_keeps_family() {
        let err: LatchError = latch_core::Error::from(
            latch_core::InfrastructureError::CounterStore("down".to_string()),
        )
        .into();
        assert!(err.is_infrastructure());

        let err: LatchError =
            latch_core::Error::from(latch_core::ValidationError::MissingField("login".into()))
                .into();
        assert!(!err.is_infrastructure());
    }
}
