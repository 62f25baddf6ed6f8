//! Repository implementations for SQLite storage

pub mod counter;
pub mod credential;
pub mod login_history;

pub use counter::SqliteCounterRepository;
pub use credential::SqliteCredentialRepository;
pub use login_history::SqliteLoginHistoryRepository;

use async_trait::async_trait;
use latch_core::{
    Error,
    error::InfrastructureError,
    repositories::{
        CounterRepositoryProvider, CredentialRepositoryProvider, LoginHistoryRepositoryProvider,
        RepositoryProvider,
    },
};
use latch_migration::MigrationManager;
use sqlx::SqlitePool;
use std::sync::Arc;

use crate::migrations::{self, SqliteMigrationManager};

/// Log a database error and convert it to the infrastructure error for its repository.
///
/// Connection-level failures (pool timeout, closed pool, I/O) are reported as
/// [`InfrastructureError::Connection`] regardless of which repository hit them.
pub(crate) fn storage_error(
    e: sqlx::Error,
    context: &str,
    kind: fn(String) -> InfrastructureError,
) -> Error {
    tracing::error!(error = %e, "{}", context);
    match e {
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            InfrastructureError::Connection(context.to_string()).into()
        }
        _ => kind(context.to_string()).into(),
    }
}

/// Repository provider implementation for SQLite
///
/// This struct implements all the individual repository provider traits
/// as well as the unified `RepositoryProvider` trait.
pub struct SqliteRepositoryProvider {
    pool: SqlitePool,
    counter: Arc<SqliteCounterRepository>,
    credential: Arc<SqliteCredentialRepository>,
    login_history: Arc<SqliteLoginHistoryRepository>,
}

impl SqliteRepositoryProvider {
    pub fn new(pool: SqlitePool) -> Self {
        let counter = Arc::new(SqliteCounterRepository::new(pool.clone()));
        let credential = Arc::new(SqliteCredentialRepository::new(pool.clone()));
        let login_history = Arc::new(SqliteLoginHistoryRepository::new(pool.clone()));

        Self {
            pool,
            counter,
            credential,
            login_history,
        }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

impl CounterRepositoryProvider for SqliteRepositoryProvider {
    type CounterRepo = SqliteCounterRepository;

    fn counter(&self) -> &Self::CounterRepo {
        &self.counter
    }
}

impl CredentialRepositoryProvider for SqliteRepositoryProvider {
    type CredentialRepo = SqliteCredentialRepository;

    fn credential(&self) -> &Self::CredentialRepo {
        &self.credential
    }
}

impl LoginHistoryRepositoryProvider for SqliteRepositoryProvider {
    type LoginHistoryRepo = SqliteLoginHistoryRepository;

    fn login_history(&self) -> &Self::LoginHistoryRepo {
        &self.login_history
    }
}

#[async_trait]
impl RepositoryProvider for SqliteRepositoryProvider {
    async fn migrate(&self) -> Result<(), Error> {
        let manager = SqliteMigrationManager::new(self.pool.clone());
        manager.initialize().await.map_err(|e| {
            tracing::error!(error = %e, "Failed to initialize migrations");
            InfrastructureError::Migration("Failed to initialize migrations".to_string())
        })?;

        let applied = manager.apply(&migrations::all()).await.map_err(|e| {
            tracing::error!(error = %e, "Failed to run migrations");
            InfrastructureError::Migration("Failed to run migrations".to_string())
        })?;

        tracing::info!(applied = ?applied, "Schema is up to date");
        Ok(())
    }

    async fn health_check(&self) -> Result<(), Error> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| storage_error(e, "Health check failed", InfrastructureError::Connection))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use latch_core::{repositories::CounterRepository, storage::Namespace};

    #[tokio::test]
    async fn test_migrate_is_idempotent() {
        let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
        let provider = SqliteRepositoryProvider::new(pool);

        provider.migrate().await.unwrap();
        provider.migrate().await.unwrap();
        provider.health_check().await.unwrap();

        provider
            .counter()
            .increment(Namespace::Locks, "alice", 1)
            .await
            .unwrap();
        assert_eq!(
            provider.counter().score(Namespace::Locks, "alice").await.unwrap(),
            1
        );
    }

    #[tokio::test]
    async fn test_unmigrated_database_fails_as_infrastructure() {
        let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
        let provider = SqliteRepositoryProvider::new(pool);

        let err = provider
            .counter()
            .score(Namespace::Bans, "10.0.0.1")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Infrastructure(InfrastructureError::CounterStore(_))
        ));
    }

    #[tokio::test]
    async fn test_health_check_fails_on_closed_pool() {
        let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
        let provider = SqliteRepositoryProvider::new(pool.clone());
        pool.close().await;

        let err = provider.health_check().await.unwrap_err();
        assert!(matches!(
            err,
            Error::Infrastructure(InfrastructureError::Connection(_))
        ));
    }
}
