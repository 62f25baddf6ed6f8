//! Throttle configuration.
//!
//! Thresholds are loaded once at startup and never change for the lifetime of the process.
//! Both are inclusive: a score equal to the threshold already blocks.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Environment variable holding the failed-attempt count at which a login becomes locked.
pub const USER_LOCK_THRESHOLD_ENV: &str = "LATCH_USER_LOCK_THRESHOLD";

/// Environment variable holding the failed-attempt count at which an IP becomes banned.
pub const IP_BAN_THRESHOLD_ENV: &str = "LATCH_IP_BAN_THRESHOLD";

pub const DEFAULT_USER_LOCK_THRESHOLD: u64 = 3;
pub const DEFAULT_IP_BAN_THRESHOLD: u64 = 10;

/// Lock and ban thresholds.
///
/// Both thresholds are at least 1 for every value of this type: the fields are private and
/// every constructor, setter and deserializer rejects 0.
///
/// # Example
///
/// ```rust
/// use latch_core::ThrottleConfig;
///
/// let config = ThrottleConfig::default()
///     .with_user_lock_threshold(5)?
///     .with_ip_ban_threshold(20)?;
/// assert_eq!(config.user_lock_threshold(), 5);
/// assert!(ThrottleConfig::default().with_ip_ban_threshold(0).is_err());
/// # Ok::<(), latch_core::ValidationError>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawThrottleConfig")]
pub struct ThrottleConfig {
    user_lock_threshold: u64,
    ip_ban_threshold: u64,
}

#[derive(Deserialize)]
struct RawThrottleConfig {
    user_lock_threshold: u64,
    ip_ban_threshold: u64,
}

impl TryFrom<RawThrottleConfig> for ThrottleConfig {
    type Error = ValidationError;

    fn try_from(raw: RawThrottleConfig) -> Result<Self, Self::Error> {
        Self::new(raw.user_lock_threshold, raw.ip_ban_threshold)
    }
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            user_lock_threshold: DEFAULT_USER_LOCK_THRESHOLD,
            ip_ban_threshold: DEFAULT_IP_BAN_THRESHOLD,
        }
    }
}

impl ThrottleConfig {
    pub fn new(user_lock_threshold: u64, ip_ban_threshold: u64) -> Result<Self, ValidationError> {
        Ok(Self {
            user_lock_threshold: check_threshold("user_lock_threshold", user_lock_threshold)?,
            ip_ban_threshold: check_threshold("ip_ban_threshold", ip_ban_threshold)?,
        })
    }

    pub fn user_lock_threshold(&self) -> u64 {
        self.user_lock_threshold
    }

    pub fn ip_ban_threshold(&self) -> u64 {
        self.ip_ban_threshold
    }

    pub fn with_user_lock_threshold(self, threshold: u64) -> Result<Self, ValidationError> {
        Self::new(threshold, self.ip_ban_threshold)
    }

    pub fn with_ip_ban_threshold(self, threshold: u64) -> Result<Self, ValidationError> {
        Self::new(self.user_lock_threshold, threshold)
    }

    /// Load thresholds from [`USER_LOCK_THRESHOLD_ENV`] and [`IP_BAN_THRESHOLD_ENV`].
    ///
    /// Unset variables fall back to the defaults (3 and 10).
    pub fn from_env() -> Result<Self, ValidationError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load thresholds through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ValidationError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let user_lock_threshold =
            parse_threshold(&lookup, USER_LOCK_THRESHOLD_ENV, DEFAULT_USER_LOCK_THRESHOLD)?;
        let ip_ban_threshold =
            parse_threshold(&lookup, IP_BAN_THRESHOLD_ENV, DEFAULT_IP_BAN_THRESHOLD)?;

        Self::new(user_lock_threshold, ip_ban_threshold)
    }
}

fn check_threshold(name: &str, value: u64) -> Result<u64, ValidationError> {
    if value == 0 {
        return Err(ValidationError::InvalidThreshold {
            name: name.to_string(),
            value: value.to_string(),
        });
    }
    Ok(value)
}

fn parse_threshold<F>(lookup: &F, name: &str, default: u64) -> Result<u64, ValidationError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        None => Ok(default),
        Some(raw) => {
            let value = raw.trim();
            match value.parse::<u64>() {
                Ok(threshold) if threshold >= 1 => Ok(threshold),
                _ => Err(ValidationError::InvalidThreshold {
                    name: name.to_string(),
                    value: value.to_string(),
                }),
            }
        }
    }
}
