//! SQLite storage backend for latch
//!
//! Counters live in a single `failure_counters` table keyed by `(namespace, key)`. Every
//! counter operation is one SQL statement, which SQLite executes atomically.
//!
//! ```rust,no_run
//! use latch_storage_sqlite::SqliteStorage;
//!
//! # async fn example() -> Result<(), latch_core::Error> {
//! let storage = SqliteStorage::connect("sqlite://latch.db?mode=rwc").await?;
//! storage.migrate().await?;
//! let repositories = storage.into_repository_provider();
//! # Ok(())
//! # }
//! ```

pub mod migrations;
pub mod repositories;

use std::time::Duration;

use latch_core::{Error, error::InfrastructureError, repositories::RepositoryProvider};
use sqlx::{SqlitePool, sqlite::SqlitePoolOptions};

pub use repositories::SqliteRepositoryProvider;

/// How long a request waits for a pooled connection before failing.
pub const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

pub struct SqliteStorage {
    pool: SqlitePool,
}

impl SqliteStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open a pool for `url`.
    pub async fn connect(url: &str) -> Result<Self, Error> {
        let pool = SqlitePoolOptions::new()
            .acquire_timeout(ACQUIRE_TIMEOUT)
            .connect(url)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, url = %url, "Failed to connect to SQLite");
                InfrastructureError::Connection(format!("Failed to connect to {url}"))
            })?;

        tracing::debug!(url = %url, "Connected to SQLite");
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn migrate(&self) -> Result<(), Error> {
        SqliteRepositoryProvider::new(self.pool.clone())
            .migrate()
            .await
    }

    pub fn into_repository_provider(self) -> SqliteRepositoryProvider {
        SqliteRepositoryProvider::new(self.pool)
    }
}
