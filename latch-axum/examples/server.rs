use std::{net::SocketAddr, sync::Arc};

use axum::{Router, response::Json, routing::get};
use latch::LatchBuilder;
use serde_json::{Value, json};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter("info,latch=debug,latch_core=debug,latch_axum=debug")
        .init();

    let latch = LatchBuilder::new()
        .with_sqlite("sqlite::memory:")
        .await?
        .with_config_from_env()?
        .apply_migrations(true)
        .build()
        .await?;

    latch.register_credential("alice", "correct horse").await?;
    info!("Registered demo login 'alice' with password 'correct horse'");

    let latch = Arc::new(latch);
    let app = Router::new()
        .route("/", get(index_handler))
        .merge(latch_axum::routes(latch).with_admin_routes().build());

    // The admin routes are unauthenticated, so the demo only listens on loopback.
    info!("Server starting on http://127.0.0.1:3000");
    info!("  POST /login         - Attempt a login");
    info!("  GET  /report        - Banned IPs and locked logins");
    info!("  GET  /health        - Health check");
    info!("  POST /admin/unlock  - Unlock a login");
    info!("  POST /admin/unban   - Unban an IP");

    let listener = tokio::net::TcpListener::bind("127.0.0.1:3000").await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

async fn index_handler() -> Json<Value> {
    Json(json!({
        "try": "curl -d 'login=alice&password=wrong' http://localhost:3000/login"
    }))
}
