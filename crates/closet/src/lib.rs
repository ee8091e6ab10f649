//! Closet domain module.
//!
//! This crate contains the wardrobe data model (items, fits, the in-progress
//! slot assignment) and its consistency rules, implemented purely as
//! deterministic domain logic (no IO, no storage).

pub mod category;
pub mod closet;
pub mod fit;
pub mod item;
pub mod slots;

pub use category::{Category, PreviewSize};
pub use closet::{Changes, Closet, Committed};
pub use fit::{clear_item_from_fits, Fit, FitBook};
pub use item::{ImageData, Inventory, Item};
pub use slots::Slots;
