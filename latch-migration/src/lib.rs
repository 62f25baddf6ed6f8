//! Schema migration primitives shared by latch storage backends.
//!
//! A backend declares its schema as a list of forward-only [`Migration`]s and applies them
//! through a [`MigrationManager`], which records every applied version in a tracking table.
//! Re-running only applies versions that are not recorded yet.

use std::collections::BTreeSet;

use async_trait::async_trait;
use sqlx::Database;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("Migration failed: {0}")]
    Migration(String),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type Result<T> = std::result::Result<T, MigrationError>;

/// Name of the table recording applied versions.
pub const MIGRATION_TABLE: &str = "_latch_migrations";

#[async_trait]
pub trait Migration<DB: Database>: Send + Sync {
    /// Apply the schema change on `conn`, inside the manager's transaction.
    async fn up<'a>(&'a self, conn: &'a mut <DB as Database>::Connection) -> Result<()>;

    /// Unique, positive version. Versions are applied in ascending order.
    fn version(&self) -> i64;

    fn name(&self) -> &str;
}

#[async_trait]
pub trait MigrationManager<DB: Database>: Send + Sync {
    /// Create the tracking table if it does not exist
    async fn initialize(&self) -> Result<()>;

    /// Versions recorded in the tracking table
    async fn applied_versions(&self) -> Result<BTreeSet<i64>>;

    /// Apply every migration whose version is not recorded yet.
    ///
    /// # Returns
    ///
    /// The versions applied by this call, ascending.
    async fn apply(&self, migrations: &[Box<dyn Migration<DB>>]) -> Result<Vec<i64>>;
}

/// The migrations still to run, sorted by version.
///
/// # Errors
///
/// [`MigrationError::Migration`] if two migrations share a version or a version is not positive.
pub fn pending<'m, DB: Database>(
    migrations: &'m [Box<dyn Migration<DB>>],
    applied: &BTreeSet<i64>,
) -> Result<Vec<&'m dyn Migration<DB>>> {
    let mut seen = BTreeSet::new();
    for migration in migrations {
        let version = migration.version();
        if version <= 0 {
            return Err(MigrationError::Migration(format!(
                "{} has non-positive version {version}",
                migration.name()
            )));
        }
        if !seen.insert(version) {
            return Err(MigrationError::Migration(format!(
                "duplicate migration version {version} ({})",
                migration.name()
            )));
        }
    }

    let mut pending: Vec<&dyn Migration<DB>> = migrations
        .iter()
        .map(|migration| migration.as_ref())
        .filter(|migration| !applied.contains(&migration.version()))
        .collect();
    pending.sort_by_key(|migration| migration.version());
    Ok(pending)
}
