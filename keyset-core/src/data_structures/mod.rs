//! Data structures for concurrent sets.
//!
//! # Organization
//!
//! - [`set`] - The `ConcurrentSet` capability and its three backends
//! - [`item_key`] - Key derivation for ordering items
//! - [`node`] - List nodes (pub(crate))
//! - [`internal`] - Internal implementation details (pub(crate))

pub(crate) mod internal;
pub mod item_key;
pub(crate) mod node;
pub mod set;

pub use item_key::{HashKey, ItemKey, Key, NullableKey};
pub use set::{CoarseBlockingSet, ConcurrentSet, FineBlockingSet, LockFreeSet};

// MarkedPtr stays pub(crate) - truly internal implementation detail
pub(crate) use internal::MarkedPtr;
