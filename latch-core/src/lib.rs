//! Core types and services for latch
//!
//! latch throttles password logins with two failure counters: one per login (locks) and one
//! per client IP (bans). Reaching a threshold blocks further attempts until a successful login
//! or an administrator resets the counter.
//!
//! This crate holds everything that does not depend on a particular storage backend:
//!
//! - [`ThrottleConfig`] with the two thresholds
//! - the repository traits in [`repositories`] plus an in-process backend in [`memory`]
//! - [`LoginThrottleService`](services::LoginThrottleService), which orders the checks for one
//!   attempt and records the outcome
//! - [`ReportService`](services::ReportService) for the list of banned IPs and locked logins
//!
//! Application code normally goes through the `latch` crate instead.
pub mod config;
pub mod credential;
pub mod crypto;
pub mod error;
pub mod memory;
pub mod outcome;
pub mod repositories;
pub mod services;
pub mod storage;
pub mod validation;

pub use config::ThrottleConfig;
pub use credential::{Credential, CredentialId, NewCredential};
pub use error::{Error, InfrastructureError, ValidationError};
pub use outcome::{AttemptOutcome, LoginResult, Report};
pub use storage::{CounterStatus, LoginRecord, Namespace};
