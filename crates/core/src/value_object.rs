//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Value objects are **immutable** and **compared by value**: two value
/// objects with the same attribute values are the same value. `Quantity` is
/// the canonical example here: 50 grams is 50 grams regardless of which cell
/// it sits in. To "modify" a value object, create a new one.
///
/// The bounds keep value objects cheap to copy, comparable, and debuggable.
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
