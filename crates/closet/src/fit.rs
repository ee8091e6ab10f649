//! Saved fits and the cascade that keeps them consistent with the inventory.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use wardrobe_core::entity::position_of;
use wardrobe_core::{Entity, FitId, ItemId};

use crate::slots::Slots;

/// A saved outfit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fit {
    pub id: FitId,
    pub name: String,
    pub slots: Slots,
    pub created_at: DateTime<Utc>,
}

impl Entity for Fit {
    type Id = FitId;

    fn id(&self) -> FitId {
        self.id
    }
}

/// Saved fits, newest first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FitBook {
    fits: Vec<Fit>,
}

impl FitBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fits(&self) -> &[Fit] {
        &self.fits
    }

    pub fn len(&self) -> usize {
        self.fits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fits.is_empty()
    }

    pub fn get(&self, id: FitId) -> Option<&Fit> {
        position_of(&self.fits, id).map(|i| &self.fits[i])
    }

    /// Name given to a fit saved without one: `Fit N`, counting the new fit.
    pub fn default_name(&self) -> String {
        format!("Fit {}", self.fits.len() + 1)
    }

    pub fn push_front(&mut self, fit: Fit) {
        self.fits.insert(0, fit);
    }

    /// Replace slots wholesale and the name when a non-blank one is given.
    pub fn update(&mut self, id: FitId, name: Option<&str>, slots: Slots) -> bool {
        let Some(i) = position_of(&self.fits, id) else {
            return false;
        };
        let fit = &mut self.fits[i];
        if let Some(name) = name.map(str::trim).filter(|n| !n.is_empty()) {
            fit.name = name.to_string();
        }
        fit.slots = slots;
        true
    }

    pub fn remove(&mut self, id: FitId) -> Option<Fit> {
        position_of(&self.fits, id).map(|i| self.fits.remove(i))
    }
}

impl From<Vec<Fit>> for FitBook {
    fn from(fits: Vec<Fit>) -> Self {
        Self { fits }
    }
}

/// Cascading clear: every fit with references to `item` replaced by empty.
///
/// Fits that never referenced the item come back unchanged, in the same order.
pub fn clear_item_from_fits(fits: &[Fit], item: ItemId) -> Vec<Fit> {
    fits.iter()
        .map(|fit| {
            let mut fit = fit.clone();
            fit.slots.clear_item(item);
            fit
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::Category;
    use proptest::prelude::*;
    use uuid::Uuid;

    fn item_id(n: u128) -> ItemId {
        ItemId::from_uuid(Uuid::from_u128(n))
    }

    fn fit(n: u128, slots: Slots) -> Fit {
        Fit {
            id: FitId::from_uuid(Uuid::from_u128(1_000 + n)),
            name: format!("Fit {n}"),
            slots,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn default_name_counts_existing_fits() {
        let mut book = FitBook::new();
        assert_eq!(book.default_name(), "Fit 1");
        book.push_front(fit(1, Slots::empty()));
        assert_eq!(book.default_name(), "Fit 2");
    }

    #[test]
    fn update_keeps_name_when_blank() {
        let original = fit(1, Slots::empty());
        let id = original.id;
        let mut book = FitBook::from(vec![original]);

        let mut slots = Slots::empty();
        slots.set(Category::Top, item_id(7));
        assert!(book.update(id, Some("   "), slots.clone()));

        let updated = book.get(id).unwrap();
        assert_eq!(updated.name, "Fit 1");
        assert_eq!(updated.slots, slots);

        assert!(book.update(id, Some(" Weekend "), Slots::empty()));
        assert_eq!(book.get(id).unwrap().name, "Weekend");
    }

    #[test]
    fn update_unknown_fit_is_noop() {
        let mut book = FitBook::from(vec![fit(1, Slots::empty())]);
        let before = book.clone();
        assert!(!book.update(FitId::new(), Some("x"), Slots::empty()));
        assert_eq!(book, before);
    }

    #[test]
    fn cascade_clears_only_the_deleted_item() {
        let mut a = Slots::empty();
        a.set(Category::Top, item_id(1));
        a.set(Category::Shoes, item_id(2));
        let mut b = Slots::empty();
        b.set(Category::Bags, item_id(3));

        let fits = vec![fit(1, a), fit(2, b.clone())];
        let next = clear_item_from_fits(&fits, item_id(1));

        assert_eq!(next[0].slots.get(Category::Top), None);
        assert_eq!(next[0].slots.get(Category::Shoes), Some(item_id(2)));
        assert_eq!(next[1].slots, b);
        // the input collection is untouched
        assert_eq!(fits[0].slots.get(Category::Top), Some(item_id(1)));
    }

    fn slots_strategy() -> impl Strategy<Value = Slots> {
        prop::collection::vec(prop::option::of(1u128..6), 8).prop_map(|picks| {
            let mut slots = Slots::empty();
            for (category, pick) in Category::ALL.into_iter().zip(picks) {
                if let Some(n) = pick {
                    slots.set(category, item_id(n));
                }
            }
            slots
        })
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: after the cascade no fit references the deleted item, and
        /// every other slot keeps its value.
        #[test]
        fn cascade_leaves_no_dangling_reference(
            all_slots in prop::collection::vec(slots_strategy(), 0..8),
            deleted in 1u128..6,
        ) {
            let fits: Vec<Fit> = all_slots
                .into_iter()
                .enumerate()
                .map(|(n, s)| fit(n as u128, s))
                .collect();
            let gone = item_id(deleted);
            let next = clear_item_from_fits(&fits, gone);

            prop_assert_eq!(next.len(), fits.len());
            for (before, after) in fits.iter().zip(&next) {
                prop_assert_eq!(before.id, after.id);
                prop_assert_eq!(&before.name, &after.name);
                prop_assert!(!after.slots.references(gone));
                for ((c, old), (_, new)) in before.slots.iter().zip(after.slots.iter()) {
                    if old == Some(gone) {
                        prop_assert_eq!(new, None, "slot {} not cleared", c);
                    } else {
                        prop_assert_eq!(new, old);
                    }
                }
            }
        }
    }
}
