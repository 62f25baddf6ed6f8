use std::collections::BTreeSet;

use async_trait::async_trait;
use chrono::Utc;
use latch_migration::{MIGRATION_TABLE, Migration, MigrationError, MigrationManager, pending};
use sqlx::{Database, Sqlite, SqlitePool};

pub struct SqliteMigrationManager {
    pool: SqlitePool,
}

impl SqliteMigrationManager {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

/// Every migration of the SQLite schema.
pub fn all() -> Vec<Box<dyn Migration<Sqlite>>> {
    vec![
        Box::new(CreateCredentialsTable),
        Box::new(CreateFailureCountersTable),
        Box::new(CreateLoginHistoryTable),
    ]
}

#[async_trait]
impl MigrationManager<Sqlite> for SqliteMigrationManager {
    async fn initialize(&self) -> Result<(), MigrationError> {
        let sql = format!(
            "CREATE TABLE IF NOT EXISTS {MIGRATION_TABLE} (
                version INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                applied_at INTEGER NOT NULL
            )"
        );
        sqlx::query(&sql).execute(&self.pool).await?;
        Ok(())
    }

    async fn applied_versions(&self) -> Result<BTreeSet<i64>, MigrationError> {
        let sql = format!("SELECT version FROM {MIGRATION_TABLE}");
        let versions: Vec<i64> = sqlx::query_scalar(&sql).fetch_all(&self.pool).await?;
        Ok(versions.into_iter().collect())
    }

    async fn apply(
        &self,
        migrations: &[Box<dyn Migration<Sqlite>>],
    ) -> Result<Vec<i64>, MigrationError> {
        let applied = self.applied_versions().await?;
        let record = format!(
            "INSERT INTO {MIGRATION_TABLE} (version, name, applied_at) VALUES (?, ?, ?)"
        );

        let mut versions = Vec::new();
        for migration in pending(migrations, &applied)? {
            tracing::info!(
                version = migration.version(),
                name = migration.name(),
                "Applying migration"
            );

            let mut tx = self.pool.begin().await?;
            migration
                .up(&mut *tx as &mut <Sqlite as Database>::Connection)
                .await?;
            sqlx::query(&record)
                .bind(migration.version())
                .bind(migration.name())
                .bind(Utc::now().timestamp())
                .execute(&mut *tx)
                .await?;
            tx.commit().await?;

            versions.push(migration.version());
        }
        Ok(versions)
    }
}

pub struct CreateCredentialsTable;

#[async_trait]
impl Migration<Sqlite> for CreateCredentialsTable {
    fn version(&self) -> i64 {
        1
    }

    fn name(&self) -> &str {
        "CreateCredentialsTable"
    }

    async fn up<'a>(
        &'a self,
        conn: &'a mut <Sqlite as Database>::Connection,
    ) -> Result<(), MigrationError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS credentials (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                login TEXT NOT NULL,
                salt TEXT NOT NULL,
                password_hash TEXT NOT NULL,
                created_at INTEGER NOT NULL DEFAULT (unixepoch()),
                UNIQUE(login)
            );"#,
        )
        .execute(conn)
        .await?;
        Ok(())
    }
}

pub struct CreateFailureCountersTable;

#[async_trait]
impl Migration<Sqlite> for CreateFailureCountersTable {
    fn version(&self) -> i64 {
        2
    }

    fn name(&self) -> &str {
        "CreateFailureCountersTable"
    }

    async fn up<'a>(
        &'a self,
        conn: &'a mut <Sqlite as Database>::Connection,
    ) -> Result<(), MigrationError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS failure_counters (
                namespace TEXT NOT NULL CHECK (namespace IN ('locks', 'bans')),
                key TEXT NOT NULL,
                score INTEGER NOT NULL DEFAULT 0 CHECK (score >= 0),
                PRIMARY KEY (namespace, key)
            );"#,
        )
        .execute(&mut *conn)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_failure_counters_score ON failure_counters(namespace, score)",
        )
        .execute(&mut *conn)
        .await?;
        Ok(())
    }
}

pub struct CreateLoginHistoryTable;

#[async_trait]
impl Migration<Sqlite> for CreateLoginHistoryTable {
    fn version(&self) -> i64 {
        3
    }

    fn name(&self) -> &str {
        "CreateLoginHistoryTable"
    }

    async fn up<'a>(
        &'a self,
        conn: &'a mut <Sqlite as Database>::Connection,
    ) -> Result<(), MigrationError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS login_history (
                credential_id INTEGER PRIMARY KEY,
                ip_address TEXT NOT NULL,
                logged_in_at INTEGER NOT NULL,
                FOREIGN KEY (credential_id) REFERENCES credentials(id) ON DELETE CASCADE
            );"#,
        )
        .execute(conn)
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn manager() -> (SqliteMigrationManager, SqlitePool) {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
        let pool = SqlitePool::connect("sqlite::memory:")
            .await
            .expect("Failed to create pool");
        let manager = SqliteMigrationManager::new(pool.clone());
        manager.initialize().await.expect("Failed to initialize");
        (manager, pool)
    }

    #[tokio::test]
    async fn test_apply_is_idempotent() -> Result<(), MigrationError> {
        let (manager, _) = manager().await;

        assert_eq!(manager.apply(&all()).await?, vec![1, 2, 3]);
        assert_eq!(
            manager.applied_versions().await?,
            BTreeSet::from([1, 2, 3])
        );

        assert!(manager.apply(&all()).await?.is_empty());
        manager.initialize().await?;
        assert_eq!(manager.applied_versions().await?.len(), 3);
        Ok(())
    }

    #[tokio::test]
    async fn test_apply_resumes_after_partial_run() -> Result<(), MigrationError> {
        let (manager, pool) = manager().await;

        let mut first = all();
        first.truncate(1);
        assert_eq!(manager.apply(&first).await?, vec![1]);
        assert_eq!(manager.apply(&all()).await?, vec![2, 3]);

        let tables: Vec<String> = sqlx::query_scalar(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name IN ('credentials', 'failure_counters', 'login_history') ORDER BY name",
        )
        .fetch_all(&pool)
        .await?;
        assert_eq!(tables, vec!["credentials", "failure_counters", "login_history"]);
        Ok(())
    }

    #[tokio::test]
    async fn test_negative_score_is_rejected() -> Result<(), MigrationError> {
        let (manager, pool) = manager().await;
        manager.apply(&all()).await?;

        let result =
            sqlx::query("INSERT INTO failure_counters (namespace, key, score) VALUES ('locks', 'a', -1)")
                .execute(&pool)
                .await;
        assert!(result.is_err());

        let result =
            sqlx::query("INSERT INTO failure_counters (namespace, key, score) VALUES ('users', 'a', 1)")
                .execute(&pool)
                .await;
        assert!(result.is_err());
        Ok(())
    }
}
