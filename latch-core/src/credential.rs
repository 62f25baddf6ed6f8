//! Credentials consulted by the throttle.
//!
//! A credential is the record returned by the credential source for a login name:
//!
//! | Field           | Type           | Description                                    |
//! | --------------- | -------------- | ---------------------------------------------- |
//! | `id`            | `CredentialId` | Numeric identifier assigned by the source.     |
//! | `login`         | `String`       | The login name; also the key of the lock counter. |
//! | `salt`          | `String`       | Per-credential salt mixed into the password hash. |
//! | `password_hash` | `String`       | Hex SHA-256 of `"{password}:{salt}"`.          |
//!
//! The throttle never mutates a credential. Salt and hash are never serialized.
use serde::{Deserialize, Serialize};

use crate::{Error, crypto, error::ValidationError, validation};

/// Identifier of a credential in the credential source
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CredentialId(i64);

impl CredentialId {
    pub fn new(id: i64) -> Self {
        CredentialId(id)
    }

    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl From<i64> for CredentialId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for CredentialId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub id: CredentialId,
    pub login: String,
    #[serde(skip_serializing, default)]
    pub salt: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
}

impl Credential {
    /// Check a supplied password against the stored salt and hash.
    pub fn verify_password(&self, password: &str) -> bool {
        crypto::verify_password_hash(password, &self.salt, &self.password_hash)
    }
}

/// A credential that has not been stored yet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCredential {
    pub login: String,
    pub salt: String,
    pub password_hash: String,
}

impl NewCredential {
    pub fn builder() -> NewCredentialBuilder {
        NewCredentialBuilder::default()
    }
}

#[derive(Default)]
pub struct NewCredentialBuilder {
    login: Option<String>,
    password: Option<String>,
    salt: Option<String>,
}

impl NewCredentialBuilder {
    pub fn login(mut self, login: impl Into<String>) -> Self {
        self.login = Some(login.into());
        self
    }

    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Use a fixed salt instead of a freshly generated one.
    pub fn salt(mut self, salt: impl Into<String>) -> Self {
        self.salt = Some(salt.into());
        self
    }

    pub fn build(self) -> Result<NewCredential, Error> {
        let login = self.login.ok_or(ValidationError::MissingField(
            "Login is required".to_string(),
        ))?;
        let password = self.password.ok_or(ValidationError::MissingField(
            "Password is required".to_string(),
        ))?;
        validation::validate_login(&login)?;
        validation::validate_password(&password)?;

        let salt = self.salt.unwrap_or_else(crypto::generate_salt);
        let password_hash = crypto::calculate_password_hash(&password, &salt);

        Ok(NewCredential {
            login,
            salt,
            password_hash,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_hashes_password() {
        let new = NewCredential::builder()
            .login("alice")
            .password("s3cret")
            .salt("pepper")
            .build()
            .unwrap();

        assert_eq!(new.login, "alice");
        assert_eq!(new.salt, "pepper");
        assert_eq!(
            new.password_hash,
            crypto::calculate_password_hash("s3cret", "pepper")
        );
    }

    #[test]
    fn test_builder_generates_salt() {
        let a = NewCredential::builder()
            .login("alice")
            .password("pw")
            .build()
            .unwrap();
        let b = NewCredential::builder()
            .login("alice")
            .password("pw")
            .build()
            .unwrap();

        assert!(!a.salt.is_empty());
        assert_ne!(a.salt, b.salt);
        assert_ne!(a.password_hash, b.password_hash);
    }

    #[test]
    fn test_builder_requires_fields() {
        let missing_login = NewCredential::builder().password("pw").build();
        assert!(matches!(
            missing_login,
            Err(Error::Validation(ValidationError::MissingField(_)))
        ));

        let empty_login = NewCredential::builder().login("").password("pw").build();
        assert!(empty_login.is_err());
    }

    #[test]
    fn test_verify_password() {
        let credential = Credential {
            id: CredentialId::new(1),
            login: "alice".to_string(),
            salt: "salt".to_string(),
            password_hash: crypto::calculate_password_hash("right", "salt"),
        };

        assert!(credential.verify_password("right"));
        assert!(!credential.verify_password("wrong"));
    }

    #[test]
    fn test_secrets_are_not_serialized() {
        let credential = Credential {
            id: CredentialId::new(7),
            login: "alice".to_string(),
            salt: "salt".to_string(),
            password_hash: "hash".to_string(),
        };

        let json = serde_json::to_value(&credential).unwrap();
        assert_eq!(json, serde_json::json!({ "id": 7, "login": "alice" }));
    }
}
