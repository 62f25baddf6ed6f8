use async_trait::async_trait;
use latch_core::{
    Error,
    credential::{Credential, CredentialId, NewCredential},
    error::{InfrastructureError, ValidationError},
    repositories::CredentialRepository,
};
use sqlx::SqlitePool;

use super::storage_error;

pub struct SqliteCredentialRepository {
    pool: SqlitePool,
}

impl SqliteCredentialRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct SqliteCredential {
    id: i64,
    login: String,
    salt: String,
    password_hash: String,
}

impl From<SqliteCredential> for Credential {
    fn from(row: SqliteCredential) -> Self {
        Credential {
            id: CredentialId::new(row.id),
            login: row.login,
            salt: row.salt,
            password_hash: row.password_hash,
        }
    }
}

#[async_trait]
impl CredentialRepository for SqliteCredentialRepository {
    async fn find_by_login(&self, login: &str) -> Result<Option<Credential>, Error> {
        let row = sqlx::query_as::<_, SqliteCredential>(
            "SELECT id, login, salt, password_hash FROM credentials WHERE login = ?",
        )
        .bind(login)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            storage_error(
                e,
                "Failed to look up credential",
                InfrastructureError::CredentialLookup,
            )
        })?;

        Ok(row.map(Credential::from))
    }

    async fn create(&self, credential: NewCredential) -> Result<Credential, Error> {
        let row = sqlx::query_as::<_, SqliteCredential>(
            r#"
            INSERT INTO credentials (login, salt, password_hash)
            VALUES (?, ?, ?)
            RETURNING id, login, salt, password_hash
            "#,
        )
        .bind(&credential.login)
        .bind(&credential.salt)
        .bind(&credential.password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            let duplicate = e
                .as_database_error()
                .is_some_and(|db| db.is_unique_violation());
            if duplicate {
                ValidationError::InvalidField(format!(
                    "Login already exists: {}",
                    credential.login
                ))
                .into()
            } else {
                storage_error(
                    e,
                    "Failed to create credential",
                    InfrastructureError::CredentialLookup,
                )
            }
        })?;

        Ok(row.into())
    }
}
