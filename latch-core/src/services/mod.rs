//! Service layer
//!
//! Services are generic over the repository traits they need and hold them behind [`Arc`]
//! so a single storage backend can be shared between them.
//!
//! [`Arc`]: std::sync::Arc

pub mod login_history;
pub mod policy;
pub mod report;
pub mod throttle;

pub use login_history::LoginHistoryService;
pub use policy::ThrottlePolicy;
pub use report::ReportService;
pub use throttle::LoginThrottleService;
