//! Deferred guard implementation.
//!
//! This module provides `DeferredGuard`, a simple guard implementation that
//! defers all node destruction until the guard is dropped.

#[cfg(debug_assertions)]
use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};

use super::Guard;

/// A simple guard that defers all node destruction until the guard is dropped.
///
/// Stored inside a collection, this frees every unlinked node when the
/// collection drops. Memory accumulates with the number of removals, which
/// is fine for tests and bounded simulations.
///
/// # Thread Safety
///
/// `DeferredGuard` uses a `Mutex` internally to safely collect nodes from
/// multiple threads.
///
pub struct DeferredGuard {
    deferred: Mutex<Vec<DeferredNode>>,
    #[cfg(debug_assertions)]
    seen: Mutex<HashSet<usize>>,
}

struct DeferredNode {
    ptr: *mut (),
    dealloc: unsafe fn(*mut ()),
}

// Safety: DeferredNode is Send because we only store the pointer
// and deallocation function, and ensure proper synchronization via Mutex
unsafe impl Send for DeferredNode {}

impl DeferredGuard {
    /// Create a new deferred guard.
    pub fn new() -> Self {
        DeferredGuard {
            deferred: Mutex::new(Vec::new()),
            #[cfg(debug_assertions)]
            seen: Mutex::new(HashSet::new()),
        }
    }

    /// Number of nodes waiting for destruction.
    pub fn pending(&self) -> usize {
        self.deferred
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl Default for DeferredGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for DeferredGuard {
    fn drop(&mut self) {
        let nodes = self
            .deferred
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner);

        log::debug!("DeferredGuard freeing {} nodes", nodes.len());

        for node in nodes.drain(..) {
            unsafe {
                (node.dealloc)(node.ptr);
            }
        }
    }
}

impl Guard for DeferredGuard {
    /// Protection is provided by the collection's stored guard.
    type ReadGuard = ();

    fn pin() -> Self::ReadGuard {}

    unsafe fn defer_destroy<N: Send + 'static>(
        &self,
        node: *mut N,
        dealloc: unsafe fn(*mut N),
    ) {
        #[cfg(debug_assertions)]
        {
            let addr = node as usize;
            let mut seen = self.seen.lock().unwrap_or_else(PoisonError::into_inner);
            if !seen.insert(addr) {
                panic!("DUPLICATE defer_destroy at {:#x}", addr);
            }
        }

        let node = DeferredNode {
            ptr: node as *mut (),
            dealloc: unsafe {
                std::mem::transmute::<unsafe fn(*mut N), unsafe fn(*mut ())>(dealloc)
            },
        };
        self.deferred
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(node);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    unsafe fn free_u64(ptr: *mut u64) {
        unsafe { drop(Box::from_raw(ptr)) };
    }

    #[test]
    fn test_deferred_guard_counts_pending() {
        let guard = DeferredGuard::default();

        for i in 0..10u64 {
            let ptr = Box::into_raw(Box::new(i));
            unsafe {
                guard.defer_destroy(ptr, free_u64);
            }
        }

        assert_eq!(guard.pending(), 10);
        // All 10 nodes freed when guard drops
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "DUPLICATE defer_destroy")]
    fn test_duplicate_deferral_panics() {
        let guard = DeferredGuard::default();
        let ptr = Box::into_raw(Box::new(1u64));

        unsafe {
            guard.defer_destroy(ptr, free_u64);
            // Second deferral of the same node is a double free in waiting.
            guard.defer_destroy(ptr, free_u64);
        }
    }
}
