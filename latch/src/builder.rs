//! Builder pattern for constructing Latch instances
//!
//! This module provides a type-safe builder for creating [`Latch`] instances with
//! compile-time validation of storage configuration.
//!
//! # Example
//!
//! ```rust,no_run
//! use latch::{LatchBuilder, ThrottleConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Build with SQLite and auto-migration
//!     let latch = LatchBuilder::new()
//!         .with_sqlite("sqlite::memory:")
//!         .await?
//!         .with_config(ThrottleConfig::new(5, 20)?)
//!         .apply_migrations(true)
//!         .build()
//!         .await?;
//!
//!     // Or build without auto-migration and run manually
//!     let latch = LatchBuilder::new()
//!         .with_sqlite("sqlite::memory:")
//!         .await?
//!         .build()
//!         .await?;
//!     latch.migrate().await?;
//!
//!     Ok(())
//! }
//! ```

use std::sync::Arc;

use latch_core::{ThrottleConfig, memory::InMemoryRepositoryProvider, repositories::RepositoryProvider};

use crate::Latch;

// ============================================================================
// Error Types
// ============================================================================

/// Errors that can occur when building a Latch instance.
#[derive(Debug, thiserror::Error)]
pub enum LatchBuilderError {
    /// Failed to connect to storage backend
    #[error("Storage connection failed: {0}")]
    StorageConnection(String),

    /// Failed to run database migrations
    #[error("Migration failed: {0}")]
    Migration(String),

    /// Invalid configuration provided
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

// ============================================================================
// Type-State Markers
// ============================================================================

/// Marker type indicating no storage has been configured yet.
///
/// This is the initial state of [`LatchBuilder`].
pub struct NoStorage;

/// Marker type indicating storage has been configured.
pub struct WithStorage<R: RepositoryProvider> {
    repositories: Arc<R>,
}

// ============================================================================
// Builder Implementation
// ============================================================================

/// A type-safe builder for constructing [`Latch`] instances.
///
/// # Type States
///
/// - [`NoStorage`]: Initial state, storage must be configured
/// - [`WithStorage<R>`]: Storage configured, ready to build or add more configuration
pub struct LatchBuilder<Storage> {
    storage: Storage,
    config: ThrottleConfig,
    apply_migrations: bool,
}

impl Default for LatchBuilder<NoStorage> {
    fn default() -> Self {
        Self::new()
    }
}

impl LatchBuilder<NoStorage> {
    /// Create a new builder with default configuration.
    ///
    /// # Defaults
    ///
    /// - User lock threshold: 3
    /// - IP ban threshold: 10
    /// - Apply migrations: false
    pub fn new() -> Self {
        Self {
            storage: NoStorage,
            config: ThrottleConfig::default(),
            apply_migrations: false,
        }
    }

    /// Use an already constructed repository provider.
    pub fn with_repositories<R: RepositoryProvider>(
        self,
        repositories: Arc<R>,
    ) -> LatchBuilder<WithStorage<R>> {
        LatchBuilder {
            storage: WithStorage { repositories },
            config: self.config,
            apply_migrations: self.apply_migrations,
        }
    }

    /// Keep all state in process memory.
    pub fn in_memory(self) -> LatchBuilder<WithStorage<InMemoryRepositoryProvider>> {
        self.with_repositories(Arc::new(InMemoryRepositoryProvider::new()))
    }
}

// ============================================================================
// Storage Configuration Methods (NoStorage -> WithStorage)
// ============================================================================

#[cfg(feature = "sqlite")]
impl LatchBuilder<NoStorage> {
    /// Configure SQLite storage by connecting to the given URL.
    ///
    /// # Arguments
    ///
    /// * `url` - SQLite connection URL (e.g., "sqlite::memory:" or "sqlite://latch.db?mode=rwc")
    pub async fn with_sqlite(
        self,
        url: &str,
    ) -> Result<
        LatchBuilder<WithStorage<latch_storage_sqlite::SqliteRepositoryProvider>>,
        LatchBuilderError,
    > {
        let storage = latch_storage_sqlite::SqliteStorage::connect(url)
            .await
            .map_err(|e| LatchBuilderError::StorageConnection(e.to_string()))?;

        Ok(self.with_repositories(Arc::new(storage.into_repository_provider())))
    }

    /// Configure SQLite storage with an existing connection pool.
    ///
    /// Use this when you already have a SQLite connection pool and want to
    /// share it with Latch.
    pub fn with_sqlite_pool(
        self,
        pool: sqlx::SqlitePool,
    ) -> LatchBuilder<WithStorage<latch_storage_sqlite::SqliteRepositoryProvider>> {
        self.with_repositories(Arc::new(
            latch_storage_sqlite::SqliteRepositoryProvider::new(pool),
        ))
    }
}

// ============================================================================
// Configuration Methods (available after storage is configured)
// ============================================================================

impl<R: RepositoryProvider> LatchBuilder<WithStorage<R>> {
    /// Set both thresholds.
    pub fn with_config(mut self, config: ThrottleConfig) -> Self {
        self.config = config;
        self
    }

    /// Read the thresholds from `LATCH_USER_LOCK_THRESHOLD` and `LATCH_IP_BAN_THRESHOLD`.
    pub fn with_config_from_env(mut self) -> Result<Self, LatchBuilderError> {
        self.config = ThrottleConfig::from_env()
            .map_err(|e| LatchBuilderError::InvalidConfiguration(e.to_string()))?;
        Ok(self)
    }

    /// Run storage migrations during [`build`](Self::build).
    pub fn apply_migrations(mut self, apply: bool) -> Self {
        self.apply_migrations = apply;
        self
    }

    /// Build the Latch instance, running migrations first if requested.
    pub async fn build(self) -> Result<Latch<R>, LatchBuilderError> {
        if self.apply_migrations {
            self.storage
                .repositories
                .migrate()
                .await
                .map_err(|e| LatchBuilderError::Migration(e.to_string()))?;
        }

        tracing::debug!(
            user_lock_threshold = self.config.user_lock_threshold(),
            ip_ban_threshold = self.config.ip_ban_threshold(),
            "Built latch"
        );

        Ok(Latch::with_config(self.storage.repositories, self.config))
    }
}
