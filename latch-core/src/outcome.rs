//! Results handed back to the request handler.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::{credential::Credential, storage::LoginRecord};

/// The result of one login attempt.
///
/// Every variant other than `Success` is a normal policy decision, not an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "credential", rename_all = "snake_case")]
pub enum AttemptOutcome {
    /// The password matched; both counters were reset.
    Success(Credential),
    /// The login has reached the lock threshold.
    Locked,
    /// The client IP has reached the ban threshold.
    Banned,
    /// The login exists but the password did not match.
    WrongPassword,
    /// No credential exists for the login.
    WrongLogin,
}

impl AttemptOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, AttemptOutcome::Success(_))
    }

    pub fn credential(&self) -> Option<&Credential> {
        match self {
            AttemptOutcome::Success(credential) => Some(credential),
            _ => None,
        }
    }

    /// Stable snake_case name, matching the serialized tag.
    pub fn kind(&self) -> &'static str {
        match self {
            AttemptOutcome::Success(_) => "success",
            AttemptOutcome::Locked => "locked",
            AttemptOutcome::Banned => "banned",
            AttemptOutcome::WrongPassword => "wrong_password",
            AttemptOutcome::WrongLogin => "wrong_login",
        }
    }
}

impl std::fmt::Display for AttemptOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.kind())
    }
}

/// Currently banned IPs and locked logins.
///
/// A point-in-time view; it may already be stale when the caller reads it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    pub banned_ips: BTreeSet<String>,
    pub locked_logins: BTreeSet<String>,
}

/// An attempt outcome plus, on success, the login that preceded this one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoginResult {
    pub outcome: AttemptOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_login: Option<LoginRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credential::CredentialId;

    #[test]
    fn test_kind_matches_serialized_tag() {
        let outcomes = [
            AttemptOutcome::Locked,
            AttemptOutcome::Banned,
            AttemptOutcome::WrongPassword,
            AttemptOutcome::WrongLogin,
        ];
        for outcome in outcomes {
            let json = serde_json::to_value(&outcome).unwrap();
            assert_eq!(json["outcome"], outcome.kind());
            assert!(!outcome.is_success());
            assert!(outcome.credential().is_none());
        }
    }

    #[test]
    fn test_success_carries_credential() {
        let credential = Credential {
            id: CredentialId::new(1),
            login: "alice".to_string(),
            salt: "s".to_string(),
            password_hash: "h".to_string(),
        };
        let outcome = AttemptOutcome::Success(credential.clone());

        assert!(outcome.is_success());
        assert_eq!(outcome.credential(), Some(&credential));
        assert_eq!(
            serde_json::to_value(&outcome).unwrap(),
            serde_json::json!({
                "outcome": "success",
                "credential": { "id": 1, "login": "alice" }
            })
        );
    }

    #[test]
    fn test_report_serializes_sorted_sets() {
        let report = Report {
            banned_ips: ["10.0.0.9", "10.0.0.5"].into_iter().map(String::from).collect(),
            locked_logins: ["bob", "alice"].into_iter().map(String::from).collect(),
        };
        assert_eq!(
            serde_json::to_value(&report).unwrap(),
            serde_json::json!({
                "banned_ips": ["10.0.0.5", "10.0.0.9"],
                "locked_logins": ["alice", "bob"]
            })
        );
    }
}
