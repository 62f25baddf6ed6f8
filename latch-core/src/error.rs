use thiserror::Error;

/// Errors raised by latch services and repositories.
///
/// Policy decisions (locked, banned, wrong password, unknown login) are never errors; they are
/// returned as [`AttemptOutcome`](crate::AttemptOutcome) values. Anything surfacing here means
/// the throttle could not reach a decision at all.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Infrastructure error: {0}")]
    Infrastructure(#[from] InfrastructureError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

/// A backing service (counter store, credential source, login history) failed or timed out.
#[derive(Debug, Error)]
pub enum InfrastructureError {
    #[error("Counter store error: {0}")]
    CounterStore(String),

    #[error("Credential lookup error: {0}")]
    CredentialLookup(String),

    #[error("Login history error: {0}")]
    LoginHistory(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Migration error: {0}")]
    Migration(String),
}

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Invalid threshold {name}: {value}")]
    InvalidThreshold { name: String, value: String },

    #[error("Invalid field: {0}")]
    InvalidField(String),

    #[error("Missing required field: {0}")]
    MissingField(String),
}

impl Error {
    pub fn is_infrastructure_error(&self) -> bool {
        matches!(self, Error::Infrastructure(_))
    }

    pub fn is_validation_error(&self) -> bool {
        matches!(self, Error::Validation(_))
    }
}
