//! Identity for stored records.
//!
//! Items and purchases are entities: the store assigns their id on insert, and
//! two values with the same id describe the same record even when other fields
//! differ (an item before and after a purchase, for instance).

/// A record whose identity is its store-assigned id.
pub trait Entity {
    type Id: Copy + Eq + core::hash::Hash + core::fmt::Debug + core::fmt::Display;

    fn id(&self) -> &Self::Id;

    /// Whether `self` and `other` are versions of the same record.
    fn same_record(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}
