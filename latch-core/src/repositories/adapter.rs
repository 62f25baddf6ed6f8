use crate::{
    Error,
    credential::{Credential, CredentialId, NewCredential},
    repositories::{
        CounterRepository, CredentialRepository, LoginHistoryRepository, RepositoryProvider,
    },
    storage::{LoginRecord, Namespace},
};
use async_trait::async_trait;
use std::sync::Arc;

/// Adapter that wraps a RepositoryProvider and implements the counter repository trait
pub struct CounterRepositoryAdapter<R: RepositoryProvider> {
    provider: Arc<R>,
}

impl<R: RepositoryProvider> CounterRepositoryAdapter<R> {
    pub fn new(provider: Arc<R>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl<R: RepositoryProvider> CounterRepository for CounterRepositoryAdapter<R> {
    async fn score(&self, namespace: Namespace, key: &str) -> Result<u64, Error> {
        self.provider.counter().score(namespace, key).await
    }

    async fn increment(&self, namespace: Namespace, key: &str, delta: u64) -> Result<u64, Error> {
        self.provider.counter().increment(namespace, key, delta).await
    }

    async fn reset_to_zero(&self, namespace: Namespace, key: &str) -> Result<(), Error> {
        self.provider.counter().reset_to_zero(namespace, key).await
    }

    async fn keys_at_or_above(
        &self,
        namespace: Namespace,
        threshold: u64,
    ) -> Result<Vec<String>, Error> {
        self.provider
            .counter()
            .keys_at_or_above(namespace, threshold)
            .await
    }

    async fn reset_all(&self) -> Result<u64, Error> {
        self.provider.counter().reset_all().await
    }
}

pub struct CredentialRepositoryAdapter<R: RepositoryProvider> {
    provider: Arc<R>,
}

impl<R: RepositoryProvider> CredentialRepositoryAdapter<R> {
    pub fn new(provider: Arc<R>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl<R: RepositoryProvider> CredentialRepository for CredentialRepositoryAdapter<R> {
    async fn find_by_login(&self, login: &str) -> Result<Option<Credential>, Error> {
        self.provider.credential().find_by_login(login).await
    }

    async fn create(&self, credential: NewCredential) -> Result<Credential, Error> {
        self.provider.credential().create(credential).await
    }
}

pub struct LoginHistoryRepositoryAdapter<R: RepositoryProvider> {
    provider: Arc<R>,
}

impl<R: RepositoryProvider> LoginHistoryRepositoryAdapter<R> {
    pub fn new(provider: Arc<R>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl<R: RepositoryProvider> LoginHistoryRepository for LoginHistoryRepositoryAdapter<R> {
    async fn last_login(&self, credential_id: CredentialId) -> Result<Option<LoginRecord>, Error> {
        self.provider.login_history().last_login(credential_id).await
    }

    async fn record_login(&self, record: &LoginRecord) -> Result<(), Error> {
        self.provider.login_history().record_login(record).await
    }
}
