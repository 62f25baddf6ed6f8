//! Tests for the Latch builder pattern

use latch::{LatchBuilder, LatchBuilderError, ThrottleConfig};

#[cfg(feature = "sqlite")]
#[tokio::test]
async fn test_builder_with_sqlite() {
    let latch = LatchBuilder::new()
        .with_sqlite("sqlite::memory:")
        .await
        .expect("Failed to connect to SQLite")
        .apply_migrations(true)
        .build()
        .await
        .expect("Failed to build Latch");

    latch.health_check().await.expect("Health check failed");
}

#[cfg(feature = "sqlite")]
#[tokio::test]
async fn test_builder_with_sqlite_pool() {
    let pool = sqlx::SqlitePool::connect("sqlite::memory:")
        .await
        .expect("Failed to connect to SQLite");

    let latch = LatchBuilder::new()
        .with_sqlite_pool(pool)
        .apply_migrations(true)
        .build()
        .await
        .expect("Failed to build Latch");

    latch.health_check().await.expect("Health check failed");
}

#[cfg(feature = "sqlite")]
#[tokio::test]
async fn test_builder_manual_migration() {
    let latch = LatchBuilder::new()
        .with_sqlite("sqlite::memory:")
        .await
        .expect("Failed to connect to SQLite")
        .build()
        .await
        .expect("Failed to build Latch");

    // tables do not exist yet
    assert!(latch.report().await.unwrap_err().is_infrastructure());

    latch.migrate().await.expect("Migration failed");
    assert!(latch.report().await.is_ok());
}

#[cfg(feature = "sqlite")]
#[tokio::test]
async fn test_builder_bad_sqlite_url() {
    let result = LatchBuilder::new()
        .with_sqlite("sqlite:///definitely/not/a/dir/latch.db")
        .await;
    assert!(matches!(
        result,
        Err(LatchBuilderError::StorageConnection(_))
    ));
}

#[tokio::test]
async fn test_builder_custom_config() {
    let config = ThrottleConfig::new(5, 50).unwrap();
    let latch = LatchBuilder::new()
        .in_memory()
        .with_config(config)
        .build()
        .await
        .expect("Failed to build Latch");

    assert_eq!(latch.config().user_lock_threshold(), 5);
    assert_eq!(latch.config().ip_ban_threshold(), 50);
}
