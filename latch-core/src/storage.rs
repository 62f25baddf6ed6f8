//! Records persisted by the counter store and the login history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::credential::CredentialId;

/// The two independent counter namespaces.
///
/// Lock counters are keyed by login name, ban counters by client IP address. A key in one
/// namespace never affects the same key in the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Namespace {
    Locks,
    Bans,
}

impl Namespace {
    pub fn as_str(&self) -> &'static str {
        match self {
            Namespace::Locks => "locks",
            Namespace::Bans => "bans",
        }
    }
}

impl std::fmt::Display for Namespace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Namespace {
    type Err = crate::error::ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "locks" => Ok(Namespace::Locks),
            "bans" => Ok(Namespace::Bans),
            other => Err(crate::error::ValidationError::InvalidField(format!(
                "Unknown namespace: {other}"
            ))),
        }
    }
}

/// One entry in the counter store.
///
/// `score` counts failures recorded since the last success. It only grows between successes,
/// and a success sets it back to exactly 0 without removing the entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureCounter {
    pub namespace: Namespace,
    pub key: String,
    pub score: u64,
}

/// Score of a single login or IP together with the policy verdict for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterStatus {
    pub key: String,
    pub score: u64,
    pub blocked: bool,
}

/// A successful login remembered for the next one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginRecord {
    pub credential_id: CredentialId,
    pub ip_address: String,
    pub logged_in_at: DateTime<Utc>,
}

impl LoginRecord {
    pub fn new(credential_id: CredentialId, ip_address: impl Into<String>) -> Self {
        Self {
            credential_id,
            ip_address: ip_address.into(),
            logged_in_at: Utc::now(),
        }
    }
}
