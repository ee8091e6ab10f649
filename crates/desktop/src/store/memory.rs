//! In-process store backed by a locked map.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use super::{KeyValueStore, StoreError, StoredValue, WriteOutcome};

/// In-memory store for tests and throwaway sessions.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<HashMap<String, StoredValue>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.inner.read().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned() -> StoreError {
    StoreError::Unavailable("memory store lock poisoned".to_string())
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<StoredValue>, StoreError> {
        let map = self.inner.read().map_err(|_| poisoned())?;
        Ok(map.get(key).cloned())
    }

    async fn put(&self, key: &str, value: StoredValue) -> Result<WriteOutcome, StoreError> {
        let mut map = self.inner.write().map_err(|_| poisoned())?;
        if let Some(existing) = map.get(key) {
            if existing.revision >= value.revision {
                return Ok(WriteOutcome::Stale);
            }
        }
        map.insert(key.to_string(), value);
        Ok(WriteOutcome::Written)
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
    async fn newer_revision_replaces_older() {
        let store = MemoryStore::new();
        assert_eq!(store.put("k", value(1, "a")).await.unwrap(), WriteOutcome::Written);
        assert_eq!(store.put("k", value(2, "b")).await.unwrap(), WriteOutcome::Written);
        assert_eq!(store.get("k").await.unwrap(), Some(value(2, "b")));
    }

    #[tokio::test]
    async fn stale_revision_is_refused() {
        let store = MemoryStore::new();
        store.put("k", value(5, "new")).await.unwrap();
        assert_eq!(store.put("k", value(4, "old")).await.unwrap(), WriteOutcome::Stale);
        assert_eq!(store.put("k", value(5, "dup")).await.unwrap(), WriteOutcome::Stale);
        assert_eq!(store.get("k").await.unwrap().unwrap().payload, "new");
    }

    #[tokio::test]
    async fn missing_keys_read_as_none() {
        let store = MemoryStore::new();
        assert!(store.is_empty());
        assert_eq!(store.get("missing").await.unwrap(), None);
        store.put("k", value(1, "a")).await.unwrap();
        assert_eq!(store.len(), 1);
    }
}
