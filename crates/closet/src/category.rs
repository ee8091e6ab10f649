//! The fixed set of clothing categories a slot can hold.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};
use wardrobe_core::DomainError;

/// Category tag. Declaration order is the canonical display order.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Head,
    Top,
    Bottom,
    Shoes,
    Jackets,
    Bags,
    Belts,
    Socks,
}

/// Preview tile size used when rendering a slot.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PreviewSize {
    #[serde(rename = "lg")]
    Large,
    #[serde(rename = "xl")]
    ExtraLarge,
    #[serde(rename = "2xl")]
    DoubleExtraLarge,
}

impl PreviewSize {
    pub fn as_str(&self) -> &'static str {
        match self {
            PreviewSize::Large => "lg",
            PreviewSize::ExtraLarge => "xl",
            PreviewSize::DoubleExtraLarge => "2xl",
        }
    }
}

impl Category {
    pub const ALL: [Category; 8] = [
        Category::Head,
        Category::Top,
        Category::Bottom,
        Category::Shoes,
        Category::Jackets,
        Category::Bags,
        Category::Belts,
        Category::Socks,
    ];

    /// Stable storage key.
    pub fn key(&self) -> &'static str {
        match self {
            Category::Head => "head",
            Category::Top => "top",
            Category::Bottom => "bottom",
            Category::Shoes => "shoes",
            Category::Jackets => "jackets",
            Category::Bags => "bags",
            Category::Belts => "belts",
            Category::Socks => "socks",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Category::Head => "Head",
            Category::Top => "Top",
            Category::Bottom => "Bottom",
            Category::Shoes => "Shoes",
            Category::Jackets => "Jackets",
            Category::Bags => "Bag / Wallets",
            Category::Belts => "Belts",
            Category::Socks => "Socks",
        }
    }

    pub fn preview_size(&self) -> PreviewSize {
        match self {
            Category::Head | Category::Shoes => PreviewSize::ExtraLarge,
            Category::Top | Category::Bottom | Category::Jackets => PreviewSize::DoubleExtraLarge,
            Category::Bags | Category::Belts | Category::Socks => PreviewSize::Large,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Category {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase();
        Category::ALL
            .into_iter()
            .find(|c| c.key() == needle)
            .ok_or_else(|| DomainError::validation(format!("unknown category: {s:?}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn exactly_eight_unique_keys() {
        let keys: HashSet<_> = Category::ALL.iter().map(|c| c.key()).collect();
        assert_eq!(Category::ALL.len(), 8);
        assert_eq!(keys.len(), Category::ALL.len());
    }

    #[test]
    fn keys_parse_back_to_their_category() {
        for c in Category::ALL {
            assert_eq!(c.key().parse::<Category>().unwrap(), c);
        }
        assert_eq!(" Jackets ".parse::<Category>().unwrap(), Category::Jackets);
    }

    #[test]
    fn unknown_key_is_a_validation_error() {
        let err = "hats".parse::<Category>().unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn serde_uses_the_storage_key() {
        let json = serde_json::to_string(&Category::Bags).unwrap();
        assert_eq!(json, "\"bags\"");
        let size = serde_json::to_string(&Category::Top.preview_size()).unwrap();
        assert_eq!(size, "\"2xl\"");
    }
}
