//! Application service: the closet session wired to decoding and persistence.
//!
//! Each mutation runs synchronously against the [`Closet`] under a lock,
//! captures snapshots of the collections it changed, releases the lock, and then
//! writes those snapshots through. Write ordering per key is guaranteed by the
//! snapshot revisions, not by completion order.

use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::Mutex;

use wardrobe_closet::{Category, Changes, Closet, Committed, Fit, Item, Slots};
use wardrobe_core::{Clock, FitId, IdGenerator, ItemId, SystemClock, UuidV7Ids};

use crate::config::WardrobeConfig;
use crate::decode::{DataUrlDecoder, DecodeError, FileDecoder, UploadFile};
use crate::persistence::{Persistence, PersistenceHealth, Snapshot, FITS_KEY, INVENTORY_KEY};
use crate::store::{KeyValueStore, SqliteStore};

/// Outcome of an upload batch.
#[derive(Debug, Default)]
pub struct AddItemsReport {
    /// New items, in upload order.
    pub added: Vec<ItemId>,
    /// Files that could not be decoded; they were skipped.
    pub failures: Vec<DecodeError>,
}

#[derive(Debug, Default)]
struct Pending {
    inventory: Option<Snapshot<Vec<Item>>>,
    fits: Option<Snapshot<Vec<Fit>>>,
}

#[derive(Debug)]
pub struct WardrobeApp {
    closet: Mutex<Closet>,
    persistence: Persistence,
    decoder: Arc<dyn FileDecoder>,
}

impl WardrobeApp {
    /// Open the SQLite-backed closet described by `config`.
    pub async fn open(config: &WardrobeConfig) -> Self {
        let store = Arc::new(SqliteStore::new(config.db_path()));
        Self::bootstrap(store, Arc::new(DataUrlDecoder)).await
    }

    /// Load both collections (or start empty) and build the session.
    pub async fn bootstrap(store: Arc<dyn KeyValueStore>, decoder: Arc<dyn FileDecoder>) -> Self {
        Self::bootstrap_with(store, decoder, Arc::new(UuidV7Ids), Arc::new(SystemClock)).await
    }

    pub async fn bootstrap_with(
        store: Arc<dyn KeyValueStore>,
        decoder: Arc<dyn FileDecoder>,
        ids: Arc<dyn IdGenerator>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let persistence = Persistence::new(store);
        let (items, fits) = tokio::join!(
            persistence.load::<Vec<Item>>(INVENTORY_KEY, Vec::new()),
            persistence.load::<Vec<Fit>>(FITS_KEY, Vec::new()),
        );
        tracing::info!(items = items.len(), fits = fits.len(), "closet bootstrapped");

        let closet = Closet::from_parts(items, fits).with_collaborators(ids, clock);
        Self {
            closet: Mutex::new(closet),
            persistence,
            decoder,
        }
    }

    pub fn persistence_health(&self) -> PersistenceHealth {
        self.persistence.health()
    }

    /// Run a read-only view over the session.
    pub async fn view<R>(&self, f: impl FnOnce(&Closet) -> R) -> R {
        let closet = self.closet.lock().await;
        f(&closet)
    }

    // ---- inventory ----

    /// Decode and catalogue every file; undecodable files are reported and skipped.
    pub async fn add_items(
        &self,
        files: &[UploadFile],
        category: Category,
        url: Option<&str>,
    ) -> AddItemsReport {
        let mut images = Vec::with_capacity(files.len());
        let mut failures = Vec::new();
        for file in files {
            match self.decoder.decode(file).await {
                Ok(image) => images.push(image),
                Err(err) => {
                    tracing::warn!(file = %file.name, error = %err, "upload skipped");
                    failures.push(err);
                }
            }
        }

        if images.is_empty() {
            return AddItemsReport {
                added: Vec::new(),
                failures,
            };
        }

        let (added, pending) = {
            let mut closet = self.closet.lock().await;
            let added = closet.add_items(images, category, url);
            let pending = self.capture(&closet, Changes { inventory: true, fits: false });
            (added, pending)
        };
        self.flush(pending).await;

        AddItemsReport { added, failures }
    }

    pub async fn delete_item(&self, id: ItemId) -> bool {
        let pending = {
            let mut closet = self.closet.lock().await;
            let changes = closet.delete_item(id);
            if changes.is_empty() {
                return false;
            }
            self.capture(&closet, changes)
        };
        self.flush(pending).await;
        true
    }

    pub async fn set_item_url(&self, id: ItemId, url: &str) -> bool {
        let pending = {
            let mut closet = self.closet.lock().await;
            if !closet.set_item_url(id, url) {
                return false;
            }
            self.capture(&closet, Changes { inventory: true, fits: false })
        };
        self.flush(pending).await;
        true
    }

    pub async fn items(&self) -> Vec<Item> {
        self.view(|c| c.inventory().items().to_vec()).await
    }

    pub async fn item(&self, id: ItemId) -> Option<Item> {
        self.view(|c| c.inventory().get(id).cloned()).await
    }

    pub async fn group_by_category(&self) -> BTreeMap<Category, Vec<Item>> {
        self.view(|c| {
            c.group_by_category()
                .into_iter()
                .map(|(category, items)| (category, items.into_iter().cloned().collect()))
                .collect()
        })
        .await
    }

    // ---- fits ----

    pub async fn save_current_fit(&self, name: Option<&str>) -> FitId {
        let (id, pending) = {
            let mut closet = self.closet.lock().await;
            let id = closet.save_current_fit(name);
            (id, self.capture(&closet, Changes { inventory: false, fits: true }))
        };
        self.flush(pending).await;
        id
    }

    pub async fn update_existing_fit(&self, id: FitId, name: Option<&str>) -> bool {
        let pending = {
            let mut closet = self.closet.lock().await;
            if !closet.update_existing_fit(id, name) {
                return false;
            }
            self.capture(&closet, Changes { inventory: false, fits: true })
        };
        self.flush(pending).await;
        true
    }

    /// Update the fit being edited, or save a new one.
    pub async fn commit_current_fit(&self, name: Option<&str>) -> Committed {
        let (committed, pending) = {
            let mut closet = self.closet.lock().await;
            let committed = closet.commit_current_fit(name);
            (committed, self.capture(&closet, Changes { inventory: false, fits: true }))
        };
        self.flush(pending).await;
        committed
    }

    pub async fn delete_fit(&self, id: FitId) -> bool {
        let pending = {
            let mut closet = self.closet.lock().await;
            if !closet.delete_fit(id) {
                return false;
            }
            self.capture(&closet, Changes { inventory: false, fits: true })
        };
        self.flush(pending).await;
        true
    }

    pub async fn load_fit_for_edit(&self, id: FitId) -> bool {
        self.closet.lock().await.load_fit_for_edit(id)
    }

    pub async fn cancel_edit(&self) {
        self.closet.lock().await.cancel_edit();
    }

    pub async fn editing(&self) -> Option<FitId> {
        self.view(Closet::editing).await
    }

    pub async fn fits(&self) -> Vec<Fit> {
        self.view(|c| c.fits().fits().to_vec()).await
    }

    pub async fn fit(&self, id: FitId) -> Option<Fit> {
        self.view(|c| c.fits().get(id).cloned()).await
    }

    /// A saved fit's slots resolved to live items.
    pub async fn resolve_fit(&self, id: FitId) -> Option<Vec<(Category, Option<Item>)>> {
        self.view(|c| c.resolve_fit(id).map(owned_resolution)).await
    }

    // ---- slot assignment ----

    pub async fn select_for_slot(&self, category: Category, item: ItemId) -> bool {
        self.closet.lock().await.select_for_slot(category, item)
    }

    pub async fn clear_slot(&self, category: Category) {
        self.closet.lock().await.clear_slot(category);
    }

    pub async fn clear_all(&self) {
        self.closet.lock().await.clear_all();
    }

    pub async fn current(&self) -> Slots {
        self.view(|c| c.current().clone()).await
    }

    pub async fn resolve(&self, category: Category) -> Option<Item> {
        self.view(|c| c.resolve(category).cloned()).await
    }

    pub async fn resolve_all(&self) -> Vec<(Category, Option<Item>)> {
        self.view(|c| owned_resolution(c.resolve_all())).await
    }

    // ---- persistence plumbing ----

    fn capture(&self, closet: &Closet, changes: Changes) -> Pending {
        Pending {
            inventory: changes.inventory.then(|| {
                self.persistence
                    .snapshot(INVENTORY_KEY, closet.inventory().items().to_vec())
            }),
            fits: changes
                .fits
                .then(|| self.persistence.snapshot(FITS_KEY, closet.fits().fits().to_vec())),
        }
    }

    /// Write captured snapshots; the two keys are independent.
    async fn flush(&self, pending: Pending) {
        let Pending { inventory, fits } = pending;
        let persistence = &self.persistence;

        // Errors were already logged and counted by the adapter.
        let inventory = async move {
            if let Some(snapshot) = inventory {
                let _ = persistence.save(snapshot).await;
            }
        };
        let fits = async move {
            if let Some(snapshot) = fits {
                let _ = persistence.save(snapshot).await;
            }
        };
        tokio::join!(inventory, fits);
    }
}

fn owned_resolution(resolved: Vec<(Category, Option<&Item>)>) -> Vec<(Category, Option<Item>)> {
    resolved
        .into_iter()
        .map(|(category, item)| (category, item.cloned()))
        .collect()
}
