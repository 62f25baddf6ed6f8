use async_trait::async_trait;
use chrono::DateTime;
use latch_core::{
    Error, credential::CredentialId, error::InfrastructureError,
    repositories::LoginHistoryRepository, storage::LoginRecord,
};
use sqlx::SqlitePool;

use super::storage_error;

pub struct SqliteLoginHistoryRepository {
    pool: SqlitePool,
}

impl SqliteLoginHistoryRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct SqliteLoginRecord {
    credential_id: i64,
    ip_address: String,
    logged_in_at: i64,
}

impl TryFrom<SqliteLoginRecord> for LoginRecord {
    type Error = Error;

    fn try_from(row: SqliteLoginRecord) -> Result<Self, Self::Error> {
        let logged_in_at = DateTime::from_timestamp_millis(row.logged_in_at).ok_or_else(|| {
            InfrastructureError::LoginHistory(format!(
                "Invalid login timestamp: {}",
                row.logged_in_at
            ))
        })?;

        Ok(LoginRecord {
            credential_id: CredentialId::new(row.credential_id),
            ip_address: row.ip_address,
            logged_in_at,
        })
    }
}

#[async_trait]
impl LoginHistoryRepository for SqliteLoginHistoryRepository {
    async fn last_login(&self, credential_id: CredentialId) -> Result<Option<LoginRecord>, Error> {
        let row = sqlx::query_as::<_, SqliteLoginRecord>(
            r#"
            SELECT credential_id, ip_address, logged_in_at
            FROM login_history
            WHERE credential_id = ?
            "#,
        )
        .bind(credential_id.as_i64())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            storage_error(e, "Failed to read last login", InfrastructureError::LoginHistory)
        })?;

        row.map(LoginRecord::try_from).transpose()
    }

    async fn record_login(&self, record: &LoginRecord) -> Result<(), Error> {
        sqlx::query(
            r#"
            INSERT INTO login_history (credential_id, ip_address, logged_in_at)
            VALUES (?, ?, ?)
            ON CONFLICT(credential_id) DO UPDATE SET
                ip_address = excluded.ip_address,
                logged_in_at = excluded.logged_in_at
            "#,
        )
        .bind(record.credential_id.as_i64())
        .bind(&record.ip_address)
        .bind(record.logged_in_at.timestamp_millis())
        .execute(&self.pool)
        .await
        .map_err(|e| storage_error(e, "Failed to record login", InfrastructureError::LoginHistory))?;

        Ok(())
    }
}
