//! SQLite implementation of the failure counter store.
//!
//! Each operation is a single statement, so SQLite's own write serialization makes it
//! atomic per key without an explicit transaction.

use async_trait::async_trait;
use latch_core::{
    Error, error::InfrastructureError, repositories::CounterRepository, storage::Namespace,
};
use sqlx::SqlitePool;

use super::storage_error;

pub struct SqliteCounterRepository {
    pool: SqlitePool,
}

impl SqliteCounterRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn to_score(value: i64) -> u64 {
    u64::try_from(value).unwrap_or(0)
}

fn to_sql(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

#[async_trait]
impl CounterRepository for SqliteCounterRepository {
    async fn score(&self, namespace: Namespace, key: &str) -> Result<u64, Error> {
        let score: Option<i64> = sqlx::query_scalar(
            "SELECT score FROM failure_counters WHERE namespace = ? AND key = ?",
        )
        .bind(namespace.as_str())
        .bind(key)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| storage_error(e, "Failed to read counter", InfrastructureError::CounterStore))?;

        Ok(score.map(to_score).unwrap_or(0))
    }

    async fn increment(&self, namespace: Namespace, key: &str, delta: u64) -> Result<u64, Error> {
        let score: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO failure_counters (namespace, key, score)
            VALUES (?, ?, ?)
            ON CONFLICT(namespace, key) DO UPDATE SET score = score + excluded.score
            RETURNING score
            "#,
        )
        .bind(namespace.as_str())
        .bind(key)
        .bind(to_sql(delta))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            storage_error(e, "Failed to increment counter", InfrastructureError::CounterStore)
        })?;

        Ok(to_score(score))
    }

    async fn reset_to_zero(&self, namespace: Namespace, key: &str) -> Result<(), Error> {
        sqlx::query(
            r#"
            INSERT INTO failure_counters (namespace, key, score)
            VALUES (?, ?, 0)
            ON CONFLICT(namespace, key) DO UPDATE SET score = 0
            "#,
        )
        .bind(namespace.as_str())
        .bind(key)
        .execute(&self.pool)
        .await
        .map_err(|e| storage_error(e, "Failed to reset counter", InfrastructureError::CounterStore))?;

        Ok(())
    }

    async fn keys_at_or_above(
        &self,
        namespace: Namespace,
        threshold: u64,
    ) -> Result<Vec<String>, Error> {
        let keys: Vec<String> = sqlx::query_scalar(
            "SELECT key FROM failure_counters WHERE namespace = ? AND score >= ? ORDER BY key",
        )
        .bind(namespace.as_str())
        .bind(to_sql(threshold))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| storage_error(e, "Failed to list counters", InfrastructureError::CounterStore))?;

        Ok(keys)
    }

    async fn reset_all(&self) -> Result<u64, Error> {
        let result = sqlx::query("DELETE FROM failure_counters")
            .execute(&self.pool)
            .await
            .map_err(|e| {
                storage_error(e, "Failed to clear counters", InfrastructureError::CounterStore)
            })?;

        Ok(result.rows_affected())
    }
}
