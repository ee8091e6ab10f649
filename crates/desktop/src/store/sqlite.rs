//! SQLite-backed key/value store.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::{Row, SqlitePool};
use tokio::sync::Mutex;

use super::{KeyValueStore, StoreError, StoredValue, WriteOutcome};

/// Single-table SQLite store (`kv_store`), opened lazily on first use.
///
/// Cheap to clone; clones share the same pool.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    path: PathBuf,
    pool: Arc<Mutex<Option<SqlitePool>>>,
}

impl SqliteStore {
    /// Create a store for the database file at `path` (created if missing).
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            pool: Arc::new(Mutex::new(None)),
        }
    }

    /// Open the database and create the table (called lazily on first use).
    async fn ensure_initialized(&self) -> Result<SqlitePool, StoreError> {
        let mut pool_guard = self.pool.lock().await;
        if let Some(pool) = pool_guard.as_ref() {
            return Ok(pool.clone());
        }

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                StoreError::Unavailable(format!("failed to create store directory {parent:?}: {e}"))
            })?;
        }

        let options = SqliteConnectOptions::new()
            .filename(&self.path)
            .create_if_missing(true);
        let pool = SqlitePool::connect_with(options).await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS kv_store (
                key        TEXT PRIMARY KEY,
                value      TEXT NOT NULL,
                revision   INTEGER NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&pool)
        .await?;

        tracing::info!(path = %self.path.display(), "sqlite store opened");
        *pool_guard = Some(pool.clone());
        Ok(pool)
    }
}

#[async_trait]
impl KeyValueStore for SqliteStore {
    async fn get(&self, key: &str) -> Result<Option<StoredValue>, StoreError> {
        let pool = self.ensure_initialized().await?;

        let row = sqlx::query(
            r#"
            SELECT value, revision
            FROM kv_store
            WHERE key = ?1
            "#,
        )
        .bind(key)
        .fetch_optional(&pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let payload: String = row.try_get("value")?;
        let revision: i64 = row.try_get("revision")?;
        Ok(Some(StoredValue {
            revision: revision as u64,
            payload,
        }))
    }

    async fn put(&self, key: &str, value: StoredValue) -> Result<WriteOutcome, StoreError> {
        let pool = self.ensure_initialized().await?;

        let result = sqlx::query(
            r#"
            INSERT INTO kv_store (key, value, revision, updated_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(key)
            DO UPDATE SET
                value = excluded.value,
                revision = excluded.revision,
                updated_at = excluded.updated_at
            WHERE excluded.revision > kv_store.revision
            "#,
        )
        .bind(key)
        .bind(&value.payload)
        .bind(value.revision as i64)
        .bind(Utc::now().to_rfc3339())
        .execute(&pool)
        .await?;

        if result.rows_affected() == 0 {
            Ok(WriteOutcome::Stale)
        } else {
            Ok(WriteOutcome::Written)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn value(revision: u64, payload: &str) -> StoredValue {
        StoredValue {
            revision,
            payload: payload.to_string(),
        }
    }

    #[tokio::test]
    async fn put_get_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("closet.db");

        let store = SqliteStore::new(&path);
        assert_eq!(store.get("k").await.unwrap(), None);
        assert_eq!(store.put("k", value(1, "[1]")).await.unwrap(), WriteOutcome::Written);

        let reopened = SqliteStore::new(&path);
        assert_eq!(reopened.get("k").await.unwrap(), Some(value(1, "[1]")));
    }

    #[tokio::test]
    async fn stale_write_does_not_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteStore::new(dir.path().join("closet.db"));

        store.put("k", value(3, "newest")).await.unwrap();
        assert_eq!(store.put("k", value(2, "older")).await.unwrap(), WriteOutcome::Stale);
        assert_eq!(store.put("k", value(4, "next")).await.unwrap(), WriteOutcome::Written);
        assert_eq!(store.get("k").await.unwrap().unwrap().payload, "next");
    }
}
