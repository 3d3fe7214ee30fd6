//! Epoch-based guard implementation using crossbeam-epoch.
//!
//! # Design
//!
//! `EpochGuard` is a zero-sized type that schedules destruction using the
//! global epoch collector:
//!
//! ```text
//! LockFreeSet<T, EpochGuard>
//!     │
//!     ├── every operation pins the calling thread (Guard::pin)
//!     └── spliced-out nodes go to the global collector (defer_destroy)
//! ```
//!
//! A node handed to the collector is freed only after every thread pinned at
//! the time has unpinned, so a traversal that was standing on the node when
//! it got spliced out can still step off it safely.

use crossbeam_epoch::{self as epoch, Guard as CrossbeamGuard};
use keyset_core::guard::Guard;
use keyset_core::{HashKey, LockFreeSet};

/// Lock-free set reclaiming its nodes through the global epoch collector.
pub type EpochLockFreeSet<T, K = HashKey> = LockFreeSet<T, EpochGuard, K>;

/// Epoch-based memory reclamation guard.
///
/// Unlike `DeferredGuard` which stores pending destructions, `EpochGuard`
/// keeps no state of its own. Memory stays bounded by the number of nodes
/// unlinked during the longest pinned operation rather than growing with
/// every removal.
///
/// Items are dropped by whichever thread collects them, possibly after the
/// set is gone, so a set only accepts items that are `Send + 'static`:
///
/// ```compile_fail
/// use std::rc::Rc;
///
/// use keyset_core::{ConcurrentSet, LockFreeSet};
/// use keyset_crossbeam::EpochGuard;
///
/// let set: LockFreeSet<Rc<u64>, EpochGuard> = LockFreeSet::new();
/// set.add(Rc::new(1));
/// ```
///
/// ```compile_fail
/// use keyset_core::{ConcurrentSet, LockFreeSet};
/// use keyset_crossbeam::EpochGuard;
///
/// let value = 7u64;
/// let set: LockFreeSet<&u64, EpochGuard> = LockFreeSet::new();
/// set.add(&value);
/// ```
///
#[derive(Clone, Copy, Debug, Default)]
pub struct EpochGuard {
    // Zero-sized - all state is in the global epoch collector
}

impl EpochGuard {
    pub fn new() -> Self {
        EpochGuard {}
    }
}

impl Guard for EpochGuard {
    /// A pinned crossbeam guard, held for the duration of one set
    /// operation.
    type ReadGuard = CrossbeamGuard;

    fn pin() -> Self::ReadGuard {
        epoch::pin()
    }

    unsafe fn defer_destroy<N: Send + 'static>(
        &self,
        node: *mut N,
        dealloc: unsafe fn(*mut N),
    ) {
        // Re-pinning is cheap when the thread is already pinned by the
        // enclosing operation.
        let guard = epoch::pin();
        unsafe {
            guard.defer_unchecked(move || {
                dealloc(node);
            });
        }
    }
}
