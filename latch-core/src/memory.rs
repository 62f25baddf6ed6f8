//! In-process storage backend.
//!
//! Every repository is a [`DashMap`]. A mutation holds the write lock of the shard owning its
//! key for the duration of a single read-modify-write, which makes increments and resets
//! atomic per key; keys in other shards proceed in parallel.
//!
//! Useful for tests and single-process deployments. Counters do not survive a restart.

use std::sync::{
    Arc,
    atomic::{AtomicI64, Ordering},
};

use async_trait::async_trait;
use dashmap::{DashMap, mapref::entry::Entry};

use crate::{
    Error,
    credential::{Credential, CredentialId, NewCredential},
    error::ValidationError,
    repositories::{
        CounterRepository, CounterRepositoryProvider, CredentialRepository,
        CredentialRepositoryProvider, LoginHistoryRepository, LoginHistoryRepositoryProvider,
        RepositoryProvider,
    },
    storage::{LoginRecord, Namespace},
};

#[derive(Default)]
pub struct InMemoryCounterRepository {
    counters: DashMap<(Namespace, String), u64>,
}

impl InMemoryCounterRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CounterRepository for InMemoryCounterRepository {
    async fn score(&self, namespace: Namespace, key: &str) -> Result<u64, Error> {
        Ok(self
            .counters
            .get(&(namespace, key.to_string()))
            .map(|score| *score)
            .unwrap_or(0))
    }

    async fn increment(&self, namespace: Namespace, key: &str, delta: u64) -> Result<u64, Error> {
        let mut score = self
            .counters
            .entry((namespace, key.to_string()))
            .or_insert(0);
        *score = score.saturating_add(delta);
        Ok(*score)
    }

    async fn reset_to_zero(&self, namespace: Namespace, key: &str) -> Result<(), Error> {
        self.counters.insert((namespace, key.to_string()), 0);
        Ok(())
    }

    async fn keys_at_or_above(
        &self,
        namespace: Namespace,
        threshold: u64,
    ) -> Result<Vec<String>, Error> {
        Ok(self
            .counters
            .iter()
            .filter(|entry| entry.key().0 == namespace && *entry.value() >= threshold)
            .map(|entry| entry.key().1.clone())
            .collect())
    }

    async fn reset_all(&self) -> Result<u64, Error> {
        let removed = self.counters.len() as u64;
        self.counters.clear();
        Ok(removed)
    }
}

pub struct InMemoryCredentialRepository {
    credentials: DashMap<String, Credential>,
    next_id: AtomicI64,
}

impl Default for InMemoryCredentialRepository {
    fn default() -> Self {
        Self {
            credentials: DashMap::new(),
            next_id: AtomicI64::new(1),
        }
    }
}

impl InMemoryCredentialRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CredentialRepository for InMemoryCredentialRepository {
    async fn find_by_login(&self, login: &str) -> Result<Option<Credential>, Error> {
        Ok(self.credentials.get(login).map(|c| c.value().clone()))
    }

    async fn create(&self, credential: NewCredential) -> Result<Credential, Error> {
        match self.credentials.entry(credential.login.clone()) {
            Entry::Occupied(_) => Err(ValidationError::InvalidField(format!(
                "Login already exists: {}",
                credential.login
            ))
            .into()),
            Entry::Vacant(slot) => {
                let stored = Credential {
                    id: CredentialId::new(self.next_id.fetch_add(1, Ordering::Relaxed)),
                    login: credential.login,
                    salt: credential.salt,
                    password_hash: credential.password_hash,
                };
                slot.insert(stored.clone());
                Ok(stored)
            }
        }
    }
}

#[derive(Default)]
pub struct InMemoryLoginHistoryRepository {
    logins: DashMap<CredentialId, LoginRecord>,
}

impl InMemoryLoginHistoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LoginHistoryRepository for InMemoryLoginHistoryRepository {
    async fn last_login(&self, credential_id: CredentialId) -> Result<Option<LoginRecord>, Error> {
        Ok(self.logins.get(&credential_id).map(|r| r.value().clone()))
    }

    async fn record_login(&self, record: &LoginRecord) -> Result<(), Error> {
        self.logins.insert(record.credential_id, record.clone());
        Ok(())
    }
}

/// Repository provider keeping everything in process memory
#[derive(Default)]
pub struct InMemoryRepositoryProvider {
    counter: Arc<InMemoryCounterRepository>,
    credential: Arc<InMemoryCredentialRepository>,
    login_history: Arc<InMemoryLoginHistoryRepository>,
}

impl InMemoryRepositoryProvider {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CounterRepositoryProvider for InMemoryRepositoryProvider {
    type CounterRepo = InMemoryCounterRepository;

    fn counter(&self) -> &Self::CounterRepo {
        &self.counter
    }
}

impl CredentialRepositoryProvider for InMemoryRepositoryProvider {
    type CredentialRepo = InMemoryCredentialRepository;

    fn credential(&self) -> &Self::CredentialRepo {
        &self.credential
    }
}

impl LoginHistoryRepositoryProvider for InMemoryRepositoryProvider {
    type LoginHistoryRepo = InMemoryLoginHistoryRepository;

    fn login_history(&self) -> &Self::LoginHistoryRepo {
        &self.login_history
    }
}

#[async_trait]
impl RepositoryProvider for InMemoryRepositoryProvider {
    async fn migrate(&self) -> Result<(), Error> {
        Ok(())
    }

    async fn health_check(&self) -> Result<(), Error> {
        Ok(())
    }
}
