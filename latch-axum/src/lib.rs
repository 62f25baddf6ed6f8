//! # Latch Axum Integration
//!
//! Axum routes for the latch login throttle.
//!
//! | route | |
//! | --- | --- |
//! | `POST /login` | evaluate a login (JSON or form body `{login, password}`) |
//! | `GET /report` | banned IPs and locked logins |
//! | `GET /health` | storage health check |
//! | `POST /admin/unlock` | reset a login's lock counter (`{login}`), opt-in |
//! | `POST /admin/unban` | reset an IP's ban counter (`{ip}`), opt-in |
//!
//! The admin routes are unauthenticated and only mounted after
//! [`LatchRouterBuilder::with_admin_routes`]. Put them behind your own auth layer.
//!
//! The client address is the socket peer, so serve the router with
//! `into_make_service_with_connect_info::<SocketAddr>()`. Behind reverse proxies, call
//! [`LatchRouterBuilder::trust_forwarded_for`] with the number of proxies; the client is then
//! the right-most `X-Forwarded-For` entry not written by one of them.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use std::{net::SocketAddr, sync::Arc};
//! use axum::Router;
//! use latch::LatchBuilder;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let latch = LatchBuilder::new()
//!         .with_sqlite("sqlite://latch.db?mode=rwc")
//!         .await?
//!         .apply_migrations(true)
//!         .build()
//!         .await?;
//!
//!     let app = Router::new().nest("/auth", latch_axum::routes(Arc::new(latch)).build());
//!
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
//!     axum::serve(
//!         listener,
//!         app.into_make_service_with_connect_info::<SocketAddr>(),
//!     )
//!     .await?;
//!     Ok(())
//! }
//! ```

mod error;
mod extractors;
mod routes;
mod types;

pub use error::{ApiError, Result};
pub use extractors::LoginPayload;
pub use routes::{LatchState, create_router};
pub use types::{
    AdminResponse, BANNED_MESSAGE, ConnectionInfo, HealthResponse, LOCKED_MESSAGE, LoginRequest,
    LoginResponse, SUCCESS_MESSAGE, TrustedProxies, UnbanRequest, UnlockRequest,
    WRONG_CREDENTIALS_MESSAGE, outcome_message,
};

use axum::Router;
use latch::Latch;
use latch_core::repositories::RepositoryProvider;
use std::sync::Arc;

/// Create throttle routes for your Axum application.
///
/// # Example
///
/// ```rust,ignore
/// let routes = latch_axum::routes(latch).trust_forwarded_for(1).build();
/// let app = Router::new().nest("/auth", routes);
/// ```
pub fn routes<R>(latch: Arc<Latch<R>>) -> LatchRouterBuilder<R>
where
    R: RepositoryProvider + 'static,
{
    LatchRouterBuilder {
        latch,
        include_admin: false,
        trusted_proxies: TrustedProxies::default(),
    }
}

/// Builder for configuring throttle routes
pub struct LatchRouterBuilder<R: RepositoryProvider> {
    latch: Arc<Latch<R>>,
    include_admin: bool,
    trusted_proxies: TrustedProxies,
}

impl<R: RepositoryProvider + 'static> LatchRouterBuilder<R> {
    /// Mount `/admin/unlock` and `/admin/unban`. They have no authentication of their own.
    pub fn with_admin_routes(mut self) -> Self {
        self.include_admin = true;
        self
    }

    /// Take the client address from `X-Forwarded-For`, trusting the last `proxies` entries.
    pub fn trust_forwarded_for(mut self, proxies: usize) -> Self {
        self.trusted_proxies = TrustedProxies(proxies);
        self
    }

    /// Build the router with the configured options
    pub fn build(self) -> Router {
        create_router(self.latch, self.include_admin, self.trusted_proxies)
    }
}

impl<R: RepositoryProvider + 'static> From<LatchRouterBuilder<R>> for Router {
    fn from(builder: LatchRouterBuilder<R>) -> Self {
        builder.build()
    }
}
