//! Entities: objects that keep their identity while their attributes change.

/// Something stored under a stable, storage-assigned identifier.
///
/// A product keeps its id across renames, repricing and soft deletion.
pub trait Entity {
    /// Ordered so stores can return entities in id order.
    type Id: Copy + Ord + core::fmt::Debug + core::fmt::Display;

    fn id(&self) -> &Self::Id;
}
