//! Repository traits for data access layer
//!
//! This module defines the repository interfaces that services use to interact with storage.
//! These traits provide a clean abstraction over the underlying storage implementation.
//!
//! # Trait Hierarchy
//!
//! - Individual `*Repository` traits define the operations for each data domain
//! - Individual `*RepositoryProvider` traits provide access to each repository type
//! - [`RepositoryProvider`] is a supertrait combining all provider traits plus lifecycle methods
//!
//! Services never see a provider directly; the facade hands them the adapters from
//! [`adapter`], which forward each call to the provider's repository.

pub mod adapter;
pub mod counter;
pub mod credential;
pub mod login_history;

pub use adapter::{
    CounterRepositoryAdapter, CredentialRepositoryAdapter, LoginHistoryRepositoryAdapter,
};
pub use counter::CounterRepository;
pub use credential::CredentialRepository;
pub use login_history::LoginHistoryRepository;

use async_trait::async_trait;

use crate::Error;

// ============================================================================
// Individual Repository Provider Traits
// ============================================================================

/// Provider trait for counter store access.
pub trait CounterRepositoryProvider: Send + Sync + 'static {
    /// The counter repository implementation type
    type CounterRepo: CounterRepository;

    /// Get the counter repository
    fn counter(&self) -> &Self::CounterRepo;
}

/// Provider trait for credential lookup access.
pub trait CredentialRepositoryProvider: Send + Sync + 'static {
    /// The credential repository implementation type
    type CredentialRepo: CredentialRepository;

    /// Get the credential repository
    fn credential(&self) -> &Self::CredentialRepo;
}

/// Provider trait for login history access.
pub trait LoginHistoryRepositoryProvider: Send + Sync + 'static {
    /// The login history repository implementation type
    type LoginHistoryRepo: LoginHistoryRepository;

    /// Get the login history repository
    fn login_history(&self) -> &Self::LoginHistoryRepo;
}

// ============================================================================
// Unified Repository Provider Trait
// ============================================================================

/// Provider trait that storage implementations must implement to provide all repositories.
///
/// # Implementing a Custom Storage Backend
///
/// 1. Implement each individual `*Repository` trait for your backend
/// 2. Implement each individual `*RepositoryProvider` trait
/// 3. Implement the `RepositoryProvider` trait with `migrate()` and `health_check()`
///
/// # Example
///
/// ```rust,ignore
/// use latch_core::repositories::*;
///
/// struct RedisStorage { /* ... */ }
///
/// impl CounterRepositoryProvider for RedisStorage {
///     type CounterRepo = RedisCounterRepository;
///     fn counter(&self) -> &Self::CounterRepo { &self.counter }
/// }
///
/// // ... implement the other provider traits ...
///
/// #[async_trait]
/// impl RepositoryProvider for RedisStorage {
///     async fn migrate(&self) -> Result<(), Error> { Ok(()) }
///     async fn health_check(&self) -> Result<(), Error> { /* PING */ }
/// }
/// ```
#[async_trait]
pub trait RepositoryProvider:
    CounterRepositoryProvider + CredentialRepositoryProvider + LoginHistoryRepositoryProvider
{
    /// Run migrations for all repositories
    async fn migrate(&self) -> Result<(), Error>;

    /// Health check for all repositories
    async fn health_check(&self) -> Result<(), Error>;
}
