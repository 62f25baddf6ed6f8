//! Last-login bookkeeping for successful attempts.
//!
//! On every successful login the previous record is handed back to the caller and replaced
//! with the current one. A first login has no previous record; the caller gets the current
//! time and address instead so there is always something to display.

use std::sync::Arc;

use crate::{
    Error, credential::CredentialId, repositories::LoginHistoryRepository, storage::LoginRecord,
};

pub struct LoginHistoryService<H: LoginHistoryRepository> {
    repository: Arc<H>,
}

impl<H: LoginHistoryRepository> LoginHistoryService<H> {
    pub fn new(repository: Arc<H>) -> Self {
        Self { repository }
    }

    /// The last recorded login for a credential, if any.
    pub async fn last_login(&self, credential_id: CredentialId) -> Result<Option<LoginRecord>, Error> {
        self.repository.last_login(credential_id).await
    }

    /// Store a successful login from `ip` and return the one it replaces.
    pub async fn record_login(
        &self,
        credential_id: CredentialId,
        ip: &str,
    ) -> Result<LoginRecord, Error> {
        let current = LoginRecord::new(credential_id, ip);
        let previous = self.repository.last_login(credential_id).await?;
        self.repository.record_login(&current).await?;

        tracing::debug!(
            credential_id = %credential_id,
            ip = %ip,
            first_login = previous.is_none(),
            "Recorded login"
        );

        Ok(previous.unwrap_or(current))
    }
}
