use latch::{AttemptOutcome, CounterStatus, LoginRecord};
use serde::{Deserialize, Serialize};

pub const LOCKED_MESSAGE: &str = "This account is locked.";
pub const BANNED_MESSAGE: &str = "You're banned.";
pub const WRONG_CREDENTIALS_MESSAGE: &str = "Wrong username or password";
pub const SUCCESS_MESSAGE: &str = "Logged in";

/// The message shown to the user for an outcome.
///
/// Wrong password and unknown login share one message so the response does not reveal which
/// logins exist.
pub fn outcome_message(outcome: &AttemptOutcome) -> &'static str {
    match outcome {
        AttemptOutcome::Success(_) => SUCCESS_MESSAGE,
        AttemptOutcome::Locked => LOCKED_MESSAGE,
        AttemptOutcome::Banned => BANNED_MESSAGE,
        AttemptOutcome::WrongPassword | AttemptOutcome::WrongLogin => WRONG_CREDENTIALS_MESSAGE,
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub login: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub outcome: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub login: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_login: Option<LoginRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnlockRequest {
    pub login: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnbanRequest {
    pub ip: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminResponse {
    /// Whether the key was blocked before the reset
    pub was_blocked: bool,
    pub status: CounterStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Where a request came from.
///
/// `ip` is the socket peer, or the client hop of `X-Forwarded-For` when the router trusts
/// the proxies in front of it. `None` when the server was not started with connect info.
#[derive(Debug, Clone)]
pub struct ConnectionInfo {
    pub ip: Option<String>,
}

/// Number of reverse proxies in front of the router whose `X-Forwarded-For` entries are
/// trusted. 0 ignores the header.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrustedProxies(pub usize);
