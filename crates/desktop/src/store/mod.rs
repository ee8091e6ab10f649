//! Durable key/value storage backing the persistence adapter.
//!
//! Each collection lives under one fixed key as a JSON document. Writes carry a
//! revision; a backend must refuse a write whose revision is not newer than the
//! stored one, so a slow stale write can never replace a newer snapshot.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

pub mod memory;
pub mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// A stored document and the revision it was written at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredValue {
    pub revision: u64,
    pub payload: String,
}

/// Result of a versioned write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Written,
    /// A newer (or equal) revision is already stored; nothing changed.
    Stale,
}

/// Storage operation error.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("query failed: {0}")]
    Query(#[from] sqlx::Error),

    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[async_trait]
pub trait KeyValueStore: Send + Sync + std::fmt::Debug {
    async fn get(&self, key: &str) -> Result<Option<StoredValue>, StoreError>;

    /// Store `value` unless a revision at least as new is already present.
    async fn put(&self, key: &str, value: StoredValue) -> Result<WriteOutcome, StoreError>;
}

#[async_trait]
impl<S> KeyValueStore for Arc<S>
where
    S: KeyValueStore + ?Sized,
{
    async fn get(&self, key: &str) -> Result<Option<StoredValue>, StoreError> {
        (**self).get(key).await
    }

    async fn put(&self, key: &str, value: StoredValue) -> Result<WriteOutcome, StoreError> {
        (**self).put(key, value).await
    }
}
