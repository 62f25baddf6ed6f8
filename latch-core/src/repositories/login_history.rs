use async_trait::async_trait;

use crate::{Error, credential::CredentialId, storage::LoginRecord};

/// Repository for the last successful login of each credential
#[async_trait]
pub trait LoginHistoryRepository: Send + Sync + 'static {
    /// The most recently recorded login for a credential
    async fn last_login(&self, credential_id: CredentialId) -> Result<Option<LoginRecord>, Error>;

    /// Remember a successful login, replacing the previous one
    async fn record_login(&self, record: &LoginRecord) -> Result<(), Error>;
}
