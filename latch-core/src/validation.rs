//! Input checks for credential registration.
//!
//! Login attempts never validate their input: an empty or malformed login is simply a login
//! that has no credential, and is throttled like any other unknown login.
use crate::error::ValidationError;

pub const MAX_LOGIN_LENGTH: usize = 128;
pub const MAX_PASSWORD_LENGTH: usize = 128;

/// Validates a login name
///
/// # Examples
///
/// ```rust
/// use latch_core::validation::validate_login;
///
/// assert!(validate_login("isucon1").is_ok());
/// assert!(validate_login("").is_err());
/// ```
pub fn validate_login(login: &str) -> Result<(), ValidationError> {
    if login.trim().is_empty() {
        return Err(ValidationError::MissingField(
            "Login is required".to_string(),
        ));
    }

    if login.chars().count() > MAX_LOGIN_LENGTH {
        return Err(ValidationError::InvalidField(format!(
            "Login must be at most {MAX_LOGIN_LENGTH} characters"
        )));
    }

    if login.chars().any(|c| c.is_control() || c.is_whitespace()) {
        return Err(ValidationError::InvalidField(
            "Login must not contain whitespace or control characters".to_string(),
        ));
    }

    Ok(())
}

/// Validates a password for a new credential
///
/// - Cannot be empty
/// - Maximum 128 characters
pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    if password.is_empty() {
        return Err(ValidationError::MissingField(
            "Password is required".to_string(),
        ));
    }

    if password.chars().count() > MAX_PASSWORD_LENGTH {
        return Err(ValidationError::InvalidField(format!(
            "Password must be at most {MAX_PASSWORD_LENGTH} characters"
        )));
    }

    Ok(())
}
