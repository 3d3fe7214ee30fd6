//! Crossbeam-based reclamation for keyset collections.
//!
//! This crate provides `EpochGuard`, an implementation of the `Guard` trait
//! using crossbeam-epoch, so nodes unlinked from a `LockFreeSet` are freed
//! while the set is still in use instead of when it drops.
//!
//! # Usage
//!
//! ```
//! use keyset_core::{ConcurrentSet, LockFreeSet};
//! use keyset_crossbeam::EpochGuard;
//!
//! let set: LockFreeSet<u64, EpochGuard> = LockFreeSet::new();
//! assert!(set.add(42));
//! assert!(set.remove(&42));
//! ```

pub mod epoch_guard;

// Export the Guard implementation
pub use epoch_guard::{EpochGuard, EpochLockFreeSet};
