//!
//! Core data structures for the MORT object runtime.
//!
//! These are the building blocks the runtime stores its metadata in:
//! a short-list growable array (method lists, ivar lists) and an
//! open-hashing table (class registry, method caches).
//!

/// Facilities for storing short, ordered lists of runtime metadata.
pub mod grow_array;
/// A generic open-hashing associative table.
pub mod hash_table;

pub use crate::grow_array::GrowArray;
pub use crate::hash_table::{HashTable, TableKey};
