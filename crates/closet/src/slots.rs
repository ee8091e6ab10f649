//! Category-keyed slot mapping shared by saved fits and the fit in progress.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use wardrobe_core::ItemId;

use crate::category::Category;

/// One optional item reference per category.
///
/// Always holds an entry for every [`Category`]; a stored mapping with missing
/// keys is completed with empty slots when deserialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    from = "BTreeMap<Category, Option<ItemId>>",
    into = "BTreeMap<Category, Option<ItemId>>"
)]
pub struct Slots {
    entries: BTreeMap<Category, Option<ItemId>>,
}

impl Slots {
    /// All categories empty.
    pub fn empty() -> Self {
        Self {
            entries: Category::ALL.into_iter().map(|c| (c, None)).collect(),
        }
    }

    pub fn get(&self, category: Category) -> Option<ItemId> {
        self.entries.get(&category).copied().flatten()
    }

    pub fn set(&mut self, category: Category, item: ItemId) {
        self.entries.insert(category, Some(item));
    }

    pub fn clear(&mut self, category: Category) {
        self.entries.insert(category, None);
    }

    pub fn clear_all(&mut self) {
        for slot in self.entries.values_mut() {
            *slot = None;
        }
    }

    /// Empty every slot pointing at `item`. Returns whether anything changed.
    pub fn clear_item(&mut self, item: ItemId) -> bool {
        let mut changed = false;
        for slot in self.entries.values_mut() {
            if *slot == Some(item) {
                *slot = None;
                changed = true;
            }
        }
        changed
    }

    pub fn references(&self, item: ItemId) -> bool {
        self.entries.values().any(|slot| *slot == Some(item))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.values().all(Option::is_none)
    }

    /// Slots in category order.
    pub fn iter(&self) -> impl Iterator<Item = (Category, Option<ItemId>)> + '_ {
        self.entries.iter().map(|(c, s)| (*c, *s))
    }
}

impl Default for Slots {
    fn default() -> Self {
        Self::empty()
    }
}

impl From<BTreeMap<Category, Option<ItemId>>> for Slots {
    fn from(stored: BTreeMap<Category, Option<ItemId>>) -> Self {
        let mut slots = Slots::empty();
        slots.entries.extend(stored);
        slots
    }
}

impl From<Slots> for BTreeMap<Category, Option<ItemId>> {
    fn from(slots: Slots) -> Self {
        slots.entries
    }
}
