use async_trait::async_trait;

use crate::{
    Error,
    credential::{Credential, NewCredential},
};

/// Source of credentials keyed by login name
#[async_trait]
pub trait CredentialRepository: Send + Sync + 'static {
    /// Find the credential for a login, `None` if the login does not exist
    async fn find_by_login(&self, login: &str) -> Result<Option<Credential>, Error>;

    /// Store a new credential; fails with a validation error if the login is taken
    async fn create(&self, credential: NewCredential) -> Result<Credential, Error>;
}
