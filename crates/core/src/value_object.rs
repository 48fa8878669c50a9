//! Value object trait: equality by value, not identity.
//!
//! Value objects have **no identity**; two value objects with the same values
//! are interchangeable. Selling prices and pagination requests are value
//! objects, items and purchases are entities.

/// Marker trait for value objects.
///
/// Value objects are immutable: to "modify" one, build a new one. The trait
/// requires `Clone + PartialEq + Debug` so they can be copied around, compared
/// by value and logged.
///
/// ```ignore
/// #[derive(Debug, Clone, PartialEq, Eq)]
/// struct Money {
///     amount: i64,
///     currency: String,
/// }
///
/// impl ValueObject for Money {}
/// ```
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
