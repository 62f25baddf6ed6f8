use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{FromRef, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use latch::{AttemptOutcome, Latch};
use latch_core::repositories::RepositoryProvider;

use crate::{
    error::{ApiError, Result},
    extractors::LoginPayload,
    types::*,
};

pub struct LatchState<R: RepositoryProvider> {
    pub latch: Arc<Latch<R>>,
    pub trusted_proxies: TrustedProxies,
}

impl<R: RepositoryProvider> Clone for LatchState<R> {
    fn clone(&self) -> Self {
        Self {
            latch: self.latch.clone(),
            trusted_proxies: self.trusted_proxies,
        }
    }
}

impl<R: RepositoryProvider> FromRef<LatchState<R>> for TrustedProxies {
    fn from_ref(state: &LatchState<R>) -> Self {
        state.trusted_proxies
    }
}

/// Build the throttle router.
///
/// `include_admin` mounts `/admin/unlock` and `/admin/unban`. They carry no authentication of
/// their own.
pub fn create_router<R>(
    latch: Arc<Latch<R>>,
    include_admin: bool,
    trusted_proxies: TrustedProxies,
) -> Router
where
    R: RepositoryProvider + 'static,
{
    let state = LatchState {
        latch,
        trusted_proxies,
    };

    let mut router = Router::new()
        .route("/login", post(login_handler))
        .route("/report", get(report_handler))
        .route("/health", get(health_handler));

    if include_admin {
        router = router.merge(admin_routes());
    }

    router.with_state(state)
}

fn admin_routes<R>() -> Router<LatchState<R>>
where
    R: RepositoryProvider + 'static,
{
    Router::new()
        .route("/admin/unlock", post(unlock_handler))
        .route("/admin/unban", post(unban_handler))
}

fn outcome_status(outcome: &AttemptOutcome) -> StatusCode {
    match outcome {
        AttemptOutcome::Success(_) => StatusCode::OK,
        AttemptOutcome::Locked | AttemptOutcome::Banned => StatusCode::FORBIDDEN,
        AttemptOutcome::WrongPassword | AttemptOutcome::WrongLogin => StatusCode::UNAUTHORIZED,
    }
}

async fn login_handler<R>(
    State(state): State<LatchState<R>>,
    connection_info: ConnectionInfo,
    LoginPayload(payload): LoginPayload,
) -> Result<impl IntoResponse>
where
    R: RepositoryProvider,
{
    let ip = connection_info
        .ip
        .ok_or_else(|| ApiError::BadRequest("Unable to determine client address".to_string()))?;

    let result = state
        .latch
        .login(&payload.login, &payload.password, &ip)
        .await?;

    tracing::debug!(
        login = %payload.login,
        ip = %ip,
        outcome = %result.outcome,
        "Handled login request"
    );

    let status = outcome_status(&result.outcome);
    let response = LoginResponse {
        outcome: result.outcome.kind().to_string(),
        message: outcome_message(&result.outcome).to_string(),
        login: result.outcome.credential().map(|c| c.login.clone()),
        previous_login: result.previous_login,
    };

    Ok((status, Json(response)))
}

async fn report_handler<R>(State(state): State<LatchState<R>>) -> Result<impl IntoResponse>
where
    R: RepositoryProvider,
{
    Ok(Json(state.latch.report().await?))
}

async fn health_handler<R>(State(state): State<LatchState<R>>) -> Result<impl IntoResponse>
where
    R: RepositoryProvider,
{
    state.latch.health_check().await?;

    Ok(Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    }))
}

async fn unlock_handler<R>(
    State(state): State<LatchState<R>>,
    Json(payload): Json<UnlockRequest>,
) -> Result<impl IntoResponse>
where
    R: RepositoryProvider,
{
    let was_blocked = state.latch.unlock_login(&payload.login).await?;
    let status = state.latch.login_status(&payload.login).await?;

    Ok(Json(AdminResponse {
        was_blocked,
        status,
    }))
}

async fn unban_handler<R>(
    State(state): State<LatchState<R>>,
    Json(payload): Json<UnbanRequest>,
) -> Result<impl IntoResponse>
where
    R: RepositoryProvider,
{
    let was_blocked = state.latch.unban_ip(&payload.ip).await?;
    let status = state.latch.ip_status(&payload.ip).await?;

    Ok(Json(AdminResponse {
        was_blocked,
        status,
    }))
}
