//! Integration tests for database initialization
//!
//! Covers first-run creation, reopening an existing file, and that the
//! key-value table survives a restart.

use greenchain_common::db::init::{init_database, init_memory_database, SCHEMA_VERSION};
use greenchain_common::kv::{KeyValueStore, SqliteKvStore};
use serde_json::json;
use tempfile::TempDir;

#[tokio::test]
async fn test_database_creation_when_missing() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("nested").join("greenchain.db");
    assert!(!db_path.exists());

    let result = init_database(&db_path).await;
    assert!(result.is_ok(), "Database initialization failed: {:?}", result.err());
    assert!(db_path.exists(), "Database file was not created");
}

#[tokio::test]
async fn test_database_opens_existing() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("greenchain.db");

    let pool1 = init_database(&db_path).await;
    assert!(pool1.is_ok());

    let pool2 = init_database(&db_path).await;
    assert!(pool2.is_ok(), "Failed to open existing database: {:?}", pool2.err());
}

#[tokio::test]
async fn test_schema_version_recorded_once() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("greenchain.db");

    init_database(&db_path).await.unwrap();
    let pool = init_database(&db_path).await.unwrap();

    let versions: Vec<(i64,)> = sqlx::query_as("SELECT version FROM schema_version")
        .fetch_all(&pool)
        .await
        .unwrap();
    assert_eq!(versions, vec![(SCHEMA_VERSION,)]);
}

#[tokio::test]
async fn test_kv_data_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("greenchain.db");

    {
        let pool = init_database(&db_path).await.unwrap();
        let store = SqliteKvStore::new(pool.clone());
        store
            .set("curriculum_initialized:u1", json!({"initialized": true}))
            .await
            .unwrap();
        pool.close().await;
    }

    let pool = init_database(&db_path).await.unwrap();
    let store = SqliteKvStore::new(pool);
    assert_eq!(
        store.get("curriculum_initialized:u1").await.unwrap(),
        Some(json!({"initialized": true}))
    );
}

#[tokio::test]
async fn test_memory_database_has_all_tables() {
    let pool = init_memory_database().await.unwrap();

    let tables: Vec<(String,)> = sqlx::query_as(
        "SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name",
    )
    .fetch_all(&pool)
    .await
    .unwrap();
    let names: Vec<&str> = tables.iter().map(|(n,)| n.as_str()).collect();

    for expected in ["kv_store", "schema_version", "sessions", "users"] {
        assert!(names.contains(&expected), "missing table {}", expected);
    }
}
