//! Guard trait for memory reclamation strategies.
//!
//! The lock-free set unlinks logically deleted nodes while other threads may
//! still be traversing them. The `Guard` trait abstracts over how such nodes
//! are eventually freed.
//!
//! # Design
//!
//! ```text
//! LockFreeSet<T, G: Guard>
//!     │
//!     ├── LockFreeSet<T, EpochGuard>      (production, keyset-crossbeam)
//!     └── LockFreeSet<T, DeferredGuard>   (default, frees on drop)
//! ```
//!
//! The lock-based sets do not need a guard: a node unlinked under its
//! predecessor's lock is unreachable by any other thread and is freed at once.
//!
//! # Example
//!
//! ```rust,ignore
//! use keyset_core::{ConcurrentSet, LockFreeSet};
//! use keyset_crossbeam::EpochGuard;
//!
//! let set: LockFreeSet<u64, EpochGuard> = LockFreeSet::new();
//! set.add(42);
//! ```

mod deferred_guard;

pub use deferred_guard::DeferredGuard;

/// A memory reclamation guard that protects concurrent access to nodes.
///
/// # Safety Contract
///
/// Implementations must ensure that nodes passed to `defer_destroy` are not
/// freed while any thread holding a `ReadGuard` pinned before the call can
/// still reach them.
///
/// # Design Note
///
/// Guards are stored in collections and must be `Send + Sync`. The stored
/// guard schedules destruction; thread pinning (for epoch-based guards)
/// happens per operation through [`Guard::pin`].
///
pub trait Guard: Sized + Default + Send + Sync {
    /// An active guard that protects reads for its lifetime.
    ///
    /// For epoch-based guards, this holds a pinned `crossbeam_epoch::Guard`.
    /// For deferred guards this is `()`, since nothing is freed before the
    /// collection itself drops.
    ///
    type ReadGuard: Sized;

    /// Pin an active read guard for the duration of one operation.
    fn pin() -> Self::ReadGuard;

    /// Schedule a node for deferred destruction.
    ///
    /// # Safety
    ///
    /// - `node` must be a valid pointer previously allocated by the collection
    /// - `node` must be unlinked from the collection (not reachable from head)
    /// - `node` must be passed here exactly once
    /// - `dealloc` must be the correct deallocation function for `node`
    ///
    /// The node may be freed on any thread, after the collection that
    /// unlinked it has dropped, hence `N: Send + 'static`.
    ///
    unsafe fn defer_destroy<N: Send + 'static>(
        &self,
        node: *mut N,
        dealloc: unsafe fn(*mut N),
    );
}
