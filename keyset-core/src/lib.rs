//! Thread-safe sets built from three synchronization disciplines.
//!
//! - [`CoarseBlockingSet`] - one mutex over the whole collection
//! - [`FineBlockingSet`] - hand-over-hand locking over a sorted list
//! - [`LockFreeSet`] - Harris-style CAS list with logical deletion
//!
//! All three implement [`ConcurrentSet`] and are interchangeable. Items are
//! ordered by a [`Key`] derived through an [`ItemKey`]; distinct items whose
//! keys collide are told apart by `Eq`.

pub mod common_tests;
pub mod data_structures;
pub mod guard;
pub mod preemptive_synchronization;
pub mod simulation;

#[cfg(test)]
mod test_logging;

pub use data_structures::item_key::{HEAD_KEY, NULL_KEY, TAIL_KEY};
pub use data_structures::{
    CoarseBlockingSet, ConcurrentSet, FineBlockingSet, HashKey, ItemKey, Key, LockFreeSet,
    NullableKey,
};

// Re-export guard types for convenience
pub use guard::{DeferredGuard, Guard};

pub use simulation::{SimulationConfig, SimulationError, SimulationReport, run_simulation};
