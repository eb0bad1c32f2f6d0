//! Key-value storage primitive
//!
//! An opaque durable map from string key to JSON value. Guarantees:
//! - a single `set` is atomic (per-key last write wins)
//! - no cross-key transactions
//! - `get_by_prefix` returns entries in ascending key order
//!
//! Everything above this layer (lessons, seeding state, quiz results, essay
//! responses) is expressed as keys and JSON values.

use crate::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

#[cfg(feature = "sqlx")]
use sqlx::SqlitePool;

/// Storage backend used by all services
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Value stored under `key`, if any
    async fn get(&self, key: &str) -> Result<Option<Value>>;

    /// Store `value` under `key`, replacing any previous value
    async fn set(&self, key: &str, value: Value) -> Result<()>;

    /// Remove `key`. Removing a missing key is not an error.
    async fn delete(&self, key: &str) -> Result<()>;

    /// All `(key, value)` pairs whose key starts with `prefix`
    async fn get_by_prefix(&self, prefix: &str) -> Result<Vec<(String, Value)>>;
}

// ========================================
// SQLite Implementation
// ========================================

/// Durable store over the `kv_store` table
#[cfg(feature = "sqlx")]
#[derive(Clone)]
pub struct SqliteKvStore {
    pool: SqlitePool,
}

#[cfg(feature = "sqlx")]
impl SqliteKvStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[cfg(feature = "sqlx")]
#[async_trait]
impl KeyValueStore for SqliteKvStore {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        let row: Option<(String,)> = sqlx::query_as("SELECT value FROM kv_store WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some((text,)) => Ok(Some(serde_json::from_str(&text)?)),
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: Value) -> Result<()> {
        let text = serde_json::to_string(&value)?;
        sqlx::query(
            "INSERT OR REPLACE INTO kv_store (key, value, updated_at) VALUES (?, ?, CURRENT_TIMESTAMP)",
        )
        .bind(key)
        .bind(text)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        sqlx::query("DELETE FROM kv_store WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn get_by_prefix(&self, prefix: &str) -> Result<Vec<(String, Value)>> {
        // substr() avoids LIKE wildcard escaping; length is in characters
        let rows: Vec<(String, String)> = sqlx::query_as(
            "SELECT key, value FROM kv_store WHERE substr(key, 1, ?) = ? ORDER BY key",
        )
        .bind(prefix.chars().count() as i64)
        .bind(prefix)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|(key, text)| Ok((key, serde_json::from_str(&text)?)))
            .collect()
    }
}

// ========================================
// In-Memory Implementation
// ========================================

/// Volatile store for tests and `--ephemeral` runs
#[derive(Default)]
pub struct MemoryKvStore {
    entries: RwLock<BTreeMap<String, Value>>,
}

impl MemoryKvStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl KeyValueStore for MemoryKvStore {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> Result<()> {
        self.entries.write().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.entries.write().await.remove(key);
        Ok(())
    }

    async fn get_by_prefix(&self, prefix: &str) -> Result<Vec<(String, Value)>> {
        let entries = self.entries.read().await;
        Ok(entries
            .range(prefix.to_string()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    async fn exercise_store(store: &dyn KeyValueStore) {
        store.set("lesson:u1:a", json!({"n": 1})).await.unwrap();
        store.set("lesson:u1:b", json!({"n": 2})).await.unwrap();
        store.set("lesson:u2:c", json!({"n": 3})).await.unwrap();
        store.set("user_lessons:u1", json!(["a", "b"])).await.unwrap();

        assert_eq!(store.get("lesson:u1:a").await.unwrap(), Some(json!({"n": 1})));
        assert_eq!(store.get("missing").await.unwrap(), None);

        let u1: Vec<String> = store
            .get_by_prefix("lesson:u1:")
            .await
            .unwrap()
            .into_iter()
            .map(|(k, _)| k)
            .collect();
        assert_eq!(u1, vec!["lesson:u1:a", "lesson:u1:b"]);

        // "lesson:" must not match "user_lessons:"
        assert_eq!(store.get_by_prefix("lesson:").await.unwrap().len(), 3);

        // Last write wins
        store.set("lesson:u1:a", json!({"n": 10})).await.unwrap();
        assert_eq!(store.get("lesson:u1:a").await.unwrap(), Some(json!({"n": 10})));

        // Delete is idempotent
        store.delete("lesson:u1:a").await.unwrap();
        store.delete("lesson:u1:a").await.unwrap();
        assert_eq!(store.get("lesson:u1:a").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_memory_store_semantics() {
        let store = MemoryKvStore::new();
        exercise_store(&store).await;
        assert_eq!(store.len().await, 3);
    }

    #[cfg(feature = "sqlx")]
    #[tokio::test]
    async fn test_sqlite_store_semantics() {
        let pool = crate::db::init_memory_database().await.unwrap();
        let store = SqliteKvStore::new(pool);
        exercise_store(&store).await;
    }

    #[cfg(feature = "sqlx")]
    #[tokio::test]
    async fn test_sqlite_prefix_with_like_wildcards() {
        let pool = crate::db::init_memory_database().await.unwrap();
        let store = SqliteKvStore::new(pool);
        store.set("a%b:1", json!(1)).await.unwrap();
        store.set("axb:1", json!(2)).await.unwrap();

        let hits = store.get_by_prefix("a%b:").await.unwrap();
        assert_eq!(hits, vec![("a%b:1".to_string(), json!(1))]);
    }
}
