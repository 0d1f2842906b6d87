//! Embeddable value object trait: equality by value, not identity.
//!
//! Embeddables are field holders that live **inside** a root record - they have
//! no identity of their own and no row of their own. Two embeddables with the
//! same field values are the same value.

/// Marker trait for embeddable value objects.
///
/// An embeddable is **immutable as a value** and **compared by value**. It is
/// owned by exactly one enclosing record at a time in the data model, even when
/// a construction path copies its initial state from a shared constant.
///
/// ## Embeddable vs Entity
///
/// - **Embeddable**: no identity (same field values means equal)
/// - **Entity**: has identity (same id means the same record)
///
/// Example:
/// - `Address { city: "london" }` is an embeddable
/// - `Customer { id: RecordId(...), address: ... }` is an entity
///
/// ## Shared defaults
///
/// A type may expose a single process-wide default instance that record
/// constructors copy their initial state from. That instance is part of the
/// process, not of any record: persistence operations must only ever read it.
/// A merge or persist that wrote through a shared default would corrupt every
/// record constructed from it afterwards, which is exactly the aliasing class
/// of bug the session layer's snapshot discipline rules out.
///
/// ## Design constraints
///
/// - **Clone**: embeddables are copied into and out of records freely
/// - **PartialEq**: compared by field values
/// - **Debug**: loggable and assertable in tests
pub trait Embeddable: Clone + PartialEq + core::fmt::Debug {}
