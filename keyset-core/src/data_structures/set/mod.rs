//! Set backends.
//!
//! - [`CoarseBlockingSet`] - one mutex over an unsorted list
//! - [`FineBlockingSet`] - sorted list with per-node locks
//! - [`LockFreeSet`] - sorted list with marked next pointers

pub mod coarse_blocking_set;
pub mod concurrent_set;
pub mod fine_blocking_set;
pub mod lock_free_set;

pub use coarse_blocking_set::CoarseBlockingSet;
pub use concurrent_set::ConcurrentSet;
pub use fine_blocking_set::FineBlockingSet;
pub use lock_free_set::LockFreeSet;
