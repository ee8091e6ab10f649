//! Session context: the two collections plus the fit in progress.
//!
//! Every operation here is synchronous and in-memory. Callers that persist
//! state use the returned [`Changes`] (or the boolean results) to decide which
//! collections to write.

use std::collections::BTreeMap;
use std::sync::Arc;

use wardrobe_core::{Clock, FitId, IdGenerator, ItemId, SystemClock, UuidV7Ids};

use crate::category::Category;
use crate::fit::{clear_item_from_fits, Fit, FitBook};
use crate::item::{normalize_url, ImageData, Inventory, Item};
use crate::slots::Slots;

/// Which persisted collections an operation modified.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Changes {
    pub inventory: bool,
    pub fits: bool,
}

impl Changes {
    pub const NONE: Changes = Changes {
        inventory: false,
        fits: false,
    };

    pub fn is_empty(&self) -> bool {
        !self.inventory && !self.fits
    }
}

/// Outcome of [`Closet::commit_current_fit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Committed {
    Created(FitId),
    Updated(FitId),
}

impl Committed {
    pub fn fit_id(&self) -> FitId {
        match self {
            Committed::Created(id) | Committed::Updated(id) => *id,
        }
    }
}

#[derive(Debug)]
pub struct Closet {
    inventory: Inventory,
    fits: FitBook,
    current: Slots,
    editing: Option<FitId>,
    ids: Arc<dyn IdGenerator>,
    clock: Arc<dyn Clock>,
}

impl Closet {
    pub fn new() -> Self {
        Self::from_parts(Vec::new(), Vec::new())
    }

    /// Rebuild a session from previously persisted collections.
    pub fn from_parts(items: Vec<Item>, fits: Vec<Fit>) -> Self {
        Self {
            inventory: Inventory::from(items),
            fits: FitBook::from(fits),
            current: Slots::empty(),
            editing: None,
            ids: Arc::new(UuidV7Ids),
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_collaborators(mut self, ids: Arc<dyn IdGenerator>, clock: Arc<dyn Clock>) -> Self {
        self.ids = ids;
        self.clock = clock;
        self
    }

    pub fn inventory(&self) -> &Inventory {
        &self.inventory
    }

    pub fn fits(&self) -> &FitBook {
        &self.fits
    }

    pub fn current(&self) -> &Slots {
        &self.current
    }

    /// Fit the next commit will update, if any.
    pub fn editing(&self) -> Option<FitId> {
        self.editing
    }

    // ---- inventory ----

    /// Catalogue one item per decoded image, newest batch first.
    pub fn add_items(
        &mut self,
        images: Vec<ImageData>,
        category: Category,
        url: Option<&str>,
    ) -> Vec<ItemId> {
        let url = normalize_url(url);
        let batch: Vec<Item> = images
            .into_iter()
            .map(|image| Item {
                id: self.ids.next_item_id(),
                category,
                image,
                url: url.clone(),
                created_at: self.clock.now(),
            })
            .collect();
        let ids: Vec<ItemId> = batch.iter().map(|i| i.id).collect();

        tracing::debug!(count = ids.len(), %category, "items added");
        self.inventory.prepend(batch);
        ids
    }

    /// Remove an item and clear every reference to it.
    pub fn delete_item(&mut self, id: ItemId) -> Changes {
        if self.inventory.remove(id).is_none() {
            return Changes::NONE;
        }

        self.current.clear_item(id);

        let next = clear_item_from_fits(self.fits.fits(), id);
        let fits_changed = next.as_slice() != self.fits.fits();
        if fits_changed {
            self.fits = FitBook::from(next);
        }

        tracing::debug!(item_id = %id, fits_changed, "item deleted");
        Changes {
            inventory: true,
            fits: fits_changed,
        }
    }

    /// Replace an item's link; blank clears it.
    pub fn set_item_url(&mut self, id: ItemId, url: &str) -> bool {
        self.inventory.set_url(id, url)
    }

    pub fn group_by_category(&self) -> BTreeMap<Category, Vec<&Item>> {
        self.inventory.group_by_category()
    }

    // ---- fits ----

    /// Snapshot the fit in progress as a new fit.
    pub fn save_current_fit(&mut self, name: Option<&str>) -> FitId {
        let name = name
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| self.fits.default_name());
        let fit = Fit {
            id: self.ids.next_fit_id(),
            name,
            slots: self.current.clone(),
            created_at: self.clock.now(),
        };
        let id = fit.id;

        tracing::debug!(fit_id = %id, name = %fit.name, "fit saved");
        self.fits.push_front(fit);
        id
    }

    pub fn update_existing_fit(&mut self, id: FitId, name: Option<&str>) -> bool {
        self.fits.update(id, name, self.current.clone())
    }

    pub fn delete_fit(&mut self, id: FitId) -> bool {
        let removed = self.fits.remove(id).is_some();
        if removed && self.editing == Some(id) {
            self.editing = None;
        }
        removed
    }

    /// Copy a fit's slots into the fit in progress and mark it for editing.
    pub fn load_fit_for_edit(&mut self, id: FitId) -> bool {
        let Some(fit) = self.fits.get(id) else {
            return false;
        };
        self.current = fit.slots.clone();
        self.editing = Some(id);
        true
    }

    pub fn cancel_edit(&mut self) {
        self.editing = None;
    }

    /// Save: update the fit being edited (then stop editing), or create a new one.
    pub fn commit_current_fit(&mut self, name: Option<&str>) -> Committed {
        if let Some(id) = self.editing.take() {
            if self.update_existing_fit(id, name) {
                return Committed::Updated(id);
            }
            tracing::warn!(fit_id = %id, "edited fit no longer exists; saving as new");
        }
        Committed::Created(self.save_current_fit(name))
    }

    // ---- slot assignment ----

    /// Put a live item into a slot. Unknown items are ignored.
    pub fn select_for_slot(&mut self, category: Category, item: ItemId) -> bool {
        if !self.inventory.contains(item) {
            return false;
        }
        self.current.set(category, item);
        true
    }

    pub fn clear_slot(&mut self, category: Category) {
        self.current.clear(category);
    }

    /// Empty every slot; the editing marker stays as it is.
    pub fn clear_all(&mut self) {
        self.current.clear_all();
    }

    pub fn resolve(&self, category: Category) -> Option<&Item> {
        self.current
            .get(category)
            .and_then(|id| self.inventory.get(id))
    }

    pub fn resolve_all(&self) -> Vec<(Category, Option<&Item>)> {
        self.resolve_slots(&self.current)
    }

    /// Live items of a saved fit, for previews.
    pub fn resolve_fit(&self, id: FitId) -> Option<Vec<(Category, Option<&Item>)>> {
        self.fits.get(id).map(|fit| self.resolve_slots(&fit.slots))
    }

    fn resolve_slots(&self, slots: &Slots) -> Vec<(Category, Option<&Item>)> {
        slots
            .iter()
            .map(|(c, id)| (c, id.and_then(|id| self.inventory.get(id))))
            .collect()
    }
}

impl Default for Closet {
    fn default() -> Self {
        Self::new()
    }
}
