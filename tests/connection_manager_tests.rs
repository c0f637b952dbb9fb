use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};
use worldforge::WorldforgeError;
use worldforge::config::{DbConfig, LocalDbConfig, MigrationFailurePolicy};
use worldforge::db::{BackendKind, ConnectionManager};

fn temp_dir(tag: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system time before UNIX_EPOCH")
        .as_nanos();
    std::env::temp_dir().join(format!(
        "worldforge-{tag}-{}-{}",
        std::process::id(),
        nanos
    ))
}

fn config(path: PathBuf, policy: MigrationFailurePolicy) -> DbConfig {
    DbConfig {
        local: LocalDbConfig {
            path,
            on_migration_failure: policy,
        },
        ..DbConfig::default()
    }
}

/// A database file that already has a `projects` table the migrations know nothing about.
async fn seed_conflicting_schema(path: &PathBuf) {
    std::fs::create_dir_all(path.parent().expect("parent")).expect("create dir");
    let pool = SqlitePoolOptions::new()
        .connect_with(
            SqliteConnectOptions::new()
                .filename(path)
                .create_if_missing(true),
        )
        .await
        .expect("open seed db");
    sqlx::query("CREATE TABLE projects (legacy_id INTEGER PRIMARY KEY, title TEXT)")
        .execute(&pool)
        .await
        .expect("create legacy table");
    sqlx::query("INSERT INTO projects (title) VALUES ('old')")
        .execute(&pool)
        .await
        .expect("seed row");
    pool.close().await;
}

#[tokio::test]
async fn migrations_apply_once_and_reopen_cleanly() {
    let dir = temp_dir("reopen");
    let path = dir.join("nested").join("app.db");
    let manager = ConnectionManager::new(config(path.clone(), MigrationFailurePolicy::Abort));

    let conn = manager
        .get(BackendKind::Embedded)
        .await
        .expect("first provisioning");
    let rows = conn
        .fetch_all(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name = 'nations'",
            &[],
        )
        .await
        .expect("inspect schema");
    assert_eq!(rows.len(), 1, "migrations should create the nations table");
    manager.close().await;

    // Same file, already migrated: abort policy must not trip.
    let manager = ConnectionManager::new(config(path, MigrationFailurePolicy::Abort));
    manager
        .get(BackendKind::Embedded)
        .await
        .expect("reopen migrated file");
    manager.close().await;

    let _ = std::fs::remove_dir_all(dir);
}

#[tokio::test]
async fn failed_migration_is_tolerated_under_warn_policy() {
    let dir = temp_dir("warn");
    let path = dir.join("app.db");
    seed_conflicting_schema(&path).await;

    let manager = ConnectionManager::new(config(path, MigrationFailurePolicy::Warn));
    let conn = manager
        .get(BackendKind::Embedded)
        .await
        .expect("warn policy keeps the connection");

    let rows = conn
        .fetch_all("SELECT title FROM projects", &[])
        .await
        .expect("existing schema stays usable");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get("title"), Some(&serde_json::json!("old")));

    let again = manager.get(BackendKind::Embedded).await.expect("cached");
    assert!(conn.same_as(&again));

    manager.close().await;
    let _ = std::fs::remove_dir_all(dir);
}

#[tokio::test]
async fn failed_migration_aborts_and_caches_nothing_under_abort_policy() {
    let dir = temp_dir("abort");
    let path = dir.join("app.db");
    seed_conflicting_schema(&path).await;

    let manager = ConnectionManager::new(config(path, MigrationFailurePolicy::Abort));
    let err = manager
        .get(BackendKind::Embedded)
        .await
        .expect_err("abort policy must fail");
    assert!(
        matches!(err, WorldforgeError::MigrationError(_)),
        "unexpected error: {err}"
    );
    assert!(manager.cached(BackendKind::Embedded).await.is_none());

    let _ = std::fs::remove_dir_all(dir);
}
