//! Catalogued items and the newest-first inventory.

use std::collections::BTreeMap;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use wardrobe_core::entity::position_of;
use wardrobe_core::{Entity, ItemId};

use crate::category::Category;

/// Encoded image payload (`data:<mime>;base64,<payload>`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageData(String);

impl ImageData {
    /// Encode raw image bytes as a base64 data URI.
    pub fn from_bytes(mime: &str, bytes: &[u8]) -> Self {
        Self(format!("data:{mime};base64,{}", BASE64.encode(bytes)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Media type declared in the URI header.
    pub fn mime(&self) -> &str {
        let header = self.0.split(',').next().unwrap_or_default();
        header
            .trim_start_matches("data:")
            .split(';')
            .next()
            .unwrap_or_default()
    }
}

/// One catalogued image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub category: Category,
    pub image: ImageData,
    #[serde(default)]
    pub url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Entity for Item {
    type Id = ItemId;

    fn id(&self) -> ItemId {
        self.id
    }
}

/// Normalize a user-supplied link: trimmed, empty means none.
pub(crate) fn normalize_url(url: Option<&str>) -> Option<String> {
    url.map(str::trim)
        .filter(|u| !u.is_empty())
        .map(str::to_string)
}

/// Inventory collection, newest first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Inventory {
    items: Vec<Item>,
}

impl Inventory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, id: ItemId) -> Option<&Item> {
        position_of(&self.items, id).map(|i| &self.items[i])
    }

    pub fn contains(&self, id: ItemId) -> bool {
        self.get(id).is_some()
    }

    /// Put a batch ahead of every existing item, keeping the batch's own order.
    pub fn prepend(&mut self, batch: Vec<Item>) {
        if batch.is_empty() {
            return;
        }
        let older = std::mem::take(&mut self.items);
        self.items = batch;
        self.items.extend(older);
    }

    pub fn remove(&mut self, id: ItemId) -> Option<Item> {
        position_of(&self.items, id).map(|i| self.items.remove(i))
    }

    /// Returns `true` when the item exists (even if the link is unchanged).
    pub fn set_url(&mut self, id: ItemId, url: &str) -> bool {
        match position_of(&self.items, id) {
            Some(i) => {
                self.items[i].url = normalize_url(Some(url));
                true
            }
            None => false,
        }
    }

    /// Items bucketed by category; every category is present.
    pub fn group_by_category(&self) -> BTreeMap<Category, Vec<&Item>> {
        let mut groups: BTreeMap<Category, Vec<&Item>> =
            Category::ALL.into_iter().map(|c| (c, Vec::new())).collect();
        for item in &self.items {
            groups.entry(item.category).or_default().push(item);
        }
        groups
    }

    pub fn in_category(&self, category: Category) -> impl Iterator<Item = &Item> {
        self.items.iter().filter(move |i| i.category == category)
    }
}

impl From<Vec<Item>> for Inventory {
    fn from(items: Vec<Item>) -> Self {
        Self { items }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use uuid::Uuid;

    fn item(n: u128, category: Category) -> Item {
        Item {
            id: ItemId::from_uuid(Uuid::from_u128(n)),
            category,
            image: ImageData::from_bytes("image/png", &[n as u8]),
            url: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn image_data_reports_mime() {
        let img = ImageData::from_bytes("image/jpeg", b"\xff\xd8\xff");
        assert!(img.as_str().starts_with("data:image/jpeg;base64,"));
        assert_eq!(img.mime(), "image/jpeg");
    }

    #[test]
    fn prepend_keeps_batch_order_ahead_of_older_items() {
        let mut inv = Inventory::from(vec![item(1, Category::Top)]);
        inv.prepend(vec![item(2, Category::Shoes), item(3, Category::Head)]);

        let order: Vec<u128> = inv.items().iter().map(|i| i.id.as_uuid().as_u128()).collect();
        assert_eq!(order, vec![2, 3, 1]);
    }

    #[test]
    fn set_url_trims_and_clears() {
        let mut inv = Inventory::from(vec![item(1, Category::Top)]);
        let id = inv.items()[0].id;

        assert!(inv.set_url(id, "  https://shop.example/tee  "));
        assert_eq!(inv.get(id).unwrap().url.as_deref(), Some("https://shop.example/tee"));

        assert!(inv.set_url(id, "   "));
        assert_eq!(inv.get(id).unwrap().url, None);

        assert!(!inv.set_url(ItemId::new(), "https://x"));
    }

    #[test]
    fn remove_missing_is_noop() {
        let mut inv = Inventory::from(vec![item(1, Category::Top)]);
        assert!(inv.remove(ItemId::new()).is_none());
        assert_eq!(inv.len(), 1);
    }

    fn category_strategy() -> impl Strategy<Value = Category> {
        (0usize..Category::ALL.len()).prop_map(|i| Category::ALL[i])
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 128,
            ..ProptestConfig::default()
        })]

        /// Property: grouping partitions the inventory exactly and keeps store order.
        #[test]
        fn group_by_category_partitions_inventory(
            cats in prop::collection::vec(category_strategy(), 0..40)
        ) {
            let items: Vec<Item> = cats
                .iter()
                .enumerate()
                .map(|(n, c)| item(n as u128 + 1, *c))
                .collect();
            let inv = Inventory::from(items);
            let groups = inv.group_by_category();

            prop_assert_eq!(groups.len(), Category::ALL.len());

            let total: usize = groups.values().map(Vec::len).sum();
            prop_assert_eq!(total, inv.len());

            for (category, bucket) in &groups {
                prop_assert!(bucket.iter().all(|i| i.category == *category));
                let expected: Vec<ItemId> = inv.in_category(*category).map(|i| i.id).collect();
                let actual: Vec<ItemId> = bucket.iter().map(|i| i.id).collect();
                prop_assert_eq!(actual, expected);
            }
        }
    }
}
