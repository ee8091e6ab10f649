//! `wardrobe-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns):
//! identifiers, the domain error model, and the clock / identifier-generator
//! collaborators that record creation stamp new records with.

pub mod clock;
pub mod entity;
pub mod error;
pub mod id;

pub use clock::{Clock, FixedClock, SystemClock};
pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::{FitId, IdGenerator, ItemId, SequentialIds, UuidV7Ids};
