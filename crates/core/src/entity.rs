//! Entity trait: identity + continuity across state changes.

/// Entity marker + minimal interface.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Copy + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> Self::Id;
}

/// Position of the entity with the given identifier in an ordered collection.
pub fn position_of<E: Entity>(records: &[E], id: E::Id) -> Option<usize> {
    records.iter().position(|r| r.id() == id)
}
