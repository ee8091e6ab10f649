//! Persistence adapter: load-at-startup, save-on-change.
//!
//! Failures never reach the in-memory model. They are logged and counted in
//! [`PersistenceHealth`]; the session keeps running on its in-memory state.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::store::{KeyValueStore, StoreError, StoredValue, WriteOutcome};

/// Storage key of the inventory collection.
pub const INVENTORY_KEY: &str = "outfit.inventory.v1";
/// Storage key of the fit collection.
pub const FITS_KEY: &str = "outfit.fits.v1";

/// Running tally of persistence problems in this session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersistenceHealth {
    pub writes: u64,
    pub stale_writes: u64,
    pub failed_writes: u64,
    pub failed_reads: u64,
    pub last_error: Option<String>,
}

/// A collection value captured at mutation time, waiting to be written.
///
/// `revision` is the session-local sequence number for `key`; the adapter adds
/// the revision stored before the session started when it writes.
#[derive(Debug, Clone)]
pub struct Snapshot<T> {
    pub key: &'static str,
    pub revision: u64,
    pub value: T,
}

/// Revision bookkeeping for one key.
#[derive(Debug, Clone, Copy)]
struct KeyRevision {
    /// Snapshots taken this session.
    local: u64,
    /// Revision stored before this session wrote; `None` until it is known.
    base: Option<u64>,
}

impl Default for KeyRevision {
    fn default() -> Self {
        Self {
            local: 0,
            base: Some(0),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Persistence {
    store: Arc<dyn KeyValueStore>,
    revisions: Arc<Mutex<HashMap<&'static str, KeyRevision>>>,
    health: Arc<Mutex<PersistenceHealth>>,
}

impl Persistence {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            revisions: Arc::new(Mutex::new(HashMap::new())),
            health: Arc::new(Mutex::new(PersistenceHealth::default())),
        }
    }

    pub fn health(&self) -> PersistenceHealth {
        self.health.lock().map(|h| h.clone()).unwrap_or_default()
    }

    /// Read `key`, falling back to `default` when absent or unreadable.
    ///
    /// Also records the stored revision, so this session's writes supersede
    /// the previous session's. When the read fails the stored revision is
    /// unknown and is fetched again before the first write.
    pub async fn load<T>(&self, key: &'static str, default: T) -> T
    where
        T: DeserializeOwned,
    {
        let stored = match self.store.get(key).await {
            Ok(stored) => stored,
            Err(err) => {
                tracing::error!(key, error = %err, "failed to load collection; using default");
                self.record_read_failure(&err);
                self.with_revision(key, |r| r.base = None);
                return default;
            }
        };

        let Some(stored) = stored else {
            tracing::debug!(key, "no stored collection; using default");
            self.seed_base(key, 0);
            return default;
        };

        self.seed_base(key, stored.revision);
        match serde_json::from_str(&stored.payload) {
            Ok(value) => {
                tracing::info!(key, revision = stored.revision, "collection loaded");
                value
            }
            Err(err) => {
                let err = StoreError::from(err);
                tracing::error!(key, error = %err, "stored collection is unreadable; using default");
                self.record_read_failure(&err);
                default
            }
        }
    }

    /// Capture `value` under the next revision of `key`.
    ///
    /// Call this while the mutation that produced `value` is still exclusive,
    /// so revision order matches mutation order.
    pub fn snapshot<T>(&self, key: &'static str, value: T) -> Snapshot<T> {
        let revision = self
            .with_revision(key, |r| {
                r.local += 1;
                r.local
            })
            .unwrap_or(0);
        Snapshot {
            key,
            revision,
            value,
        }
    }

    /// Write a snapshot. Errors are logged and recorded before being returned.
    pub async fn save<T>(&self, snapshot: Snapshot<T>) -> Result<WriteOutcome, StoreError>
    where
        T: Serialize,
    {
        let result = self.write(&snapshot).await;
        match &result {
            Ok(WriteOutcome::Written) => {
                tracing::debug!(key = snapshot.key, revision = snapshot.revision, "collection saved");
                self.update_health(|h| h.writes += 1);
            }
            Ok(WriteOutcome::Stale) => {
                tracing::debug!(
                    key = snapshot.key,
                    revision = snapshot.revision,
                    "newer revision already stored; write skipped"
                );
                self.update_health(|h| h.stale_writes += 1);
            }
            Err(err) => {
                tracing::warn!(key = snapshot.key, error = %err, "failed to save collection");
                let message = err.to_string();
                self.update_health(|h| {
                    h.failed_writes += 1;
                    h.last_error = Some(message);
                });
            }
        }
        result
    }

    async fn write<T: Serialize>(&self, snapshot: &Snapshot<T>) -> Result<WriteOutcome, StoreError> {
        let payload = serde_json::to_string(&snapshot.value)?;
        let base = self.base_revision(snapshot.key).await?;
        self.store
            .put(
                snapshot.key,
                StoredValue {
                    revision: base + snapshot.revision,
                    payload,
                },
            )
            .await
    }

    /// The revision stored before this session, reading it when the load failed.
    async fn base_revision(&self, key: &'static str) -> Result<u64, StoreError> {
        if let Some(base) = self.with_revision(key, |r| r.base).flatten() {
            return Ok(base);
        }

        let stored = self.store.get(key).await?.map_or(0, |v| v.revision);
        tracing::info!(key, revision = stored, "stored revision recovered after failed load");
        // The first recovery wins so every in-flight snapshot shares one base.
        Ok(self
            .with_revision(key, |r| *r.base.get_or_insert(stored))
            .unwrap_or(stored))
    }

    fn seed_base(&self, key: &'static str, stored: u64) {
        self.with_revision(key, |r| r.base = Some(r.base.unwrap_or(0).max(stored)));
    }

    fn with_revision<R>(&self, key: &'static str, f: impl FnOnce(&mut KeyRevision) -> R) -> Option<R> {
        let mut revisions = self.revisions.lock().ok()?;
        Some(f(revisions.entry(key).or_default()))
    }

    fn record_read_failure(&self, err: &StoreError) {
        let message = err.to_string();
        self.update_health(|h| {
            h.failed_reads += 1;
            h.last_error = Some(message);
        });
    }

    fn update_health(&self, f: impl FnOnce(&mut PersistenceHealth)) {
        if let Ok(mut health) = self.health.lock() {
            f(&mut health);
        }
    }
}
