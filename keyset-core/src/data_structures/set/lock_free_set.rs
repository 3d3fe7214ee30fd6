use std::ptr;

use crate::data_structures::ConcurrentSet;
use crate::data_structures::item_key::{HEAD_KEY, HashKey, ItemKey, Key, TAIL_KEY};
use crate::data_structures::node::{LockFreeKeyNode, NodePtr};
use crate::guard::{DeferredGuard, Guard};

///
/// Lock-free sorted set after Harris, 'A Pragmatic Implementation of
/// Non-Blocking Linked-Lists'.
///
/// Removal is two-phase: the victim's own next pointer is marked first
/// (logical delete, the linearization point), then the node is spliced out of
/// its predecessor. Splicing is lazy; any traversal that meets a marked node
/// helps unlink it.
///
// =============================================================================
// LIST STRUCTURE
// =============================================================================
//
// ┌──────┐    ┌──────┐    ┌──────┐    ┌──────┐
// │ HEAD │───►│  10  │──x►│  20  │───►│ TAIL │
// │ MIN  │    │      │    │      │    │ MAX  │
// └──────┘    └──────┘    └──────┘    └──────┘
//
// `──x►` : 10 is marked. It is still linked but no longer a member, and its
//          successor pointer is frozen: every CAS on it expects an unmarked
//          word and fails.
//
// =============================================================================
// RECLAMATION
// =============================================================================
//
// A node leaves the chain only through a successful CAS on its predecessor's
// next pointer from (node, unmarked) to (successor, unmarked). Once that CAS
// succeeds no pointer in the chain refers to the node again, so exactly one
// thread ever wins it. That thread hands the node to the guard.
//
// Nodes still linked when the set drops (marked or not) are freed by Drop;
// the two populations never overlap.
//
pub struct LockFreeSet<T, G: Guard = DeferredGuard, K = HashKey> {
    head: NodePtr<T>,
    tail: NodePtr<T>,

    /// Unlinked nodes are deferred to this guard.
    guard: G,
    key_fn: K,
}

// Safety: all shared mutation goes through atomic CAS on next pointers.
// Items are read concurrently (Sync) and dropped by whichever thread
// reclaims them (Send).
unsafe impl<T: Send, G: Guard, K: Send> Send for LockFreeSet<T, G, K> {}
unsafe impl<T: Send + Sync, G: Guard, K: Sync> Sync for LockFreeSet<T, G, K> {}

/// Adjacent pair seen during a traversal.
#[derive(Debug)]
struct Window<T> {
    prev: NodePtr<T>,
    curr: NodePtr<T>,
}

// Manual impls to avoid requiring T: Clone/Copy
impl<T> Clone for Window<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Window<T> {}

impl<T, G: Guard> LockFreeSet<T, G, HashKey> {
    pub fn new() -> Self {
        Self::with_key_fn(HashKey::default())
    }
}

impl<T, G: Guard, K> LockFreeSet<T, G, K> {
    /// Create a set that orders items by `key_fn`.
    pub fn with_key_fn(key_fn: K) -> Self {
        let tail = Box::into_raw(Box::new(LockFreeKeyNode::new_sentinel(
            TAIL_KEY,
            ptr::null_mut(),
        )));
        let head = Box::into_raw(Box::new(LockFreeKeyNode::new_sentinel(HEAD_KEY, tail)));

        log::debug!("LockFreeSet created");

        LockFreeSet {
            head,
            tail,
            guard: G::default(),
            key_fn,
        }
    }

    /// Get the guard unlinked nodes are deferred to.
    pub fn guard(&self) -> &G {
        &self.guard
    }

    #[inline]
    fn node(&self, ptr: NodePtr<T>) -> &LockFreeKeyNode<T> {
        // Safety: pointers come from the chain and the caller is pinned, so
        // the node can't have been reclaimed yet.
        unsafe { &*ptr }
    }

    /// Hand a node unlinked by our own CAS to the guard.
    ///
    #[inline]
    fn retire(&self, victim: NodePtr<T>)
    where
        T: Send + 'static,
    {
        unsafe { self.guard.defer_destroy(victim, LockFreeKeyNode::dealloc_ptr) };
    }

    /// Physically unlink a node this thread has just marked.
    ///
    /// Returns `false` if `prev` no longer points at `curr` unmarked; the node
    /// then stays linked until a later `find` splices it.
    fn finish_removal(&self, prev: NodePtr<T>, curr: NodePtr<T>, succ: NodePtr<T>) -> bool
    where
        T: Send + 'static,
    {
        if self
            .node(prev)
            .compare_and_set_next(curr, succ, false, false)
        {
            self.retire(curr);
            true
        } else {
            log::trace!("unlink after mark failed, leaving it to a later find");
            false
        }
    }

    /// Locate the window for `key`, splicing out marked nodes on the way.
    ///
    /// Returns `prev` unmarked at the time it was read, with
    /// `prev.key < key <= curr.key` or `curr == tail`.
    ///
    // When a splice CAS fails, `prev` was marked or its successor changed
    // underneath us. The traversal restarts from head.
    //
    fn find(&self, key: Key) -> Window<T>
    where
        T: Send + 'static,
    {
        'retry: loop {
            let mut prev = self.head;
            let mut curr = self.node(prev).next_ptr();

            loop {
                let next = self.node(curr).next();

                if next.is_marked() {
                    let spliced =
                        self.node(prev)
                            .compare_and_set_next(curr, next.as_ptr(), false, false);

                    if !spliced {
                        log::trace!("splice of marked node failed, retrying from head");
                        continue 'retry;
                    }

                    self.retire(curr);
                    curr = next.as_ptr();
                    continue;
                }

                if curr == self.tail || self.node(curr).key() >= key {
                    return Window { prev, curr };
                }

                prev = curr;
                curr = next.as_ptr();
            }
        }
    }

    /// Search the key-equal run starting at `window.curr` for an unmarked
    /// node holding `item`.
    ///
    /// Returns the node together with its predecessor in the run.
    fn find_in_run(&self, window: Window<T>, key: Key, item: &T) -> Option<Window<T>>
    where
        T: Eq,
    {
        let Window { mut prev, mut curr } = window;

        while curr != self.tail {
            let node = self.node(curr);
            if node.key() != key {
                break;
            }

            let next = node.next();
            if !next.is_marked() && node.holds(item) {
                return Some(Window { prev, curr });
            }

            prev = curr;
            curr = next.as_ptr();
        }

        None
    }

    /// Number of unmarked nodes between the sentinels, stopping early once
    /// `limit` are seen.
    fn count_members(&self, limit: usize) -> usize {
        let mut count = 0;
        let mut curr = self.node(self.head).next_ptr();

        while curr != self.tail && count < limit {
            let next = self.node(curr).next();
            if !next.is_marked() {
                count += 1;
            }
            curr = next.as_ptr();
        }

        count
    }
}

// An unlinked item may be dropped after the set itself, on another
// thread.
impl<T, G, K> ConcurrentSet<T> for LockFreeSet<T, G, K>
where
    T: Eq + Send + 'static,
    G: Guard,
    K: ItemKey<T>,
{
    fn add(&self, item: T) -> bool {
        let _pin = G::pin();
        let key = self.key_fn.key_of(&item);
        let new_node = Box::into_raw(Box::new(LockFreeKeyNode::new(item, key)));

        loop {
            let window = self.find(key);

            // Safety: new_node is still private to this thread.
            let item = unsafe { (*new_node).item() };
            if item.is_some_and(|item| self.find_in_run(window, key, item).is_some()) {
                unsafe { LockFreeKeyNode::dealloc_ptr(new_node) };
                return false;
            }

            // Colliding items go to the front of their run.
            self.node(new_node).set_next(window.curr, false);

            let linked =
                self.node(window.prev)
                    .compare_and_set_next(window.curr, new_node, false, false);

            if linked {
                return true;
            }

            log::trace!("insert CAS failed, retrying");
        }
    }

    fn remove(&self, item: &T) -> bool {
        let _pin = G::pin();
        let key = self.key_fn.key_of(item);

        loop {
            let Some(Window { prev, curr }) = self.find_in_run(self.find(key), key, item) else {
                return false;
            };

            let victim = self.node(curr);
            debug_assert!(!victim.is_sentinel());
            let succ = victim.next();
            if succ.is_marked() {
                // Lost the race to another remover in between; look again.
                continue;
            }

            // Logical delete.
            if !victim.compare_and_set_next(succ.as_ptr(), succ.as_ptr(), false, true) {
                log::trace!("mark CAS failed, retrying");
                continue;
            }

            self.finish_removal(prev, curr, succ.as_ptr());
            return true;
        }
    }

    fn contains(&self, item: &T) -> bool {
        let _pin = G::pin();
        let key = self.key_fn.key_of(item);

        // Read only: marked nodes are stepped over but never spliced.
        let mut curr = self.node(self.head).next_ptr();
        while curr != self.tail {
            let node = self.node(curr);
            if node.key() > key {
                return false;
            }

            let next = node.next();
            if node.key() == key && !next.is_marked() && node.holds(item) {
                return true;
            }
            curr = next.as_ptr();
        }

        false
    }

    fn is_empty(&self) -> bool {
        let _pin = G::pin();
        self.count_members(1) == 0
    }

    fn len(&self) -> usize {
        let _pin = G::pin();
        self.count_members(usize::MAX)
    }
}

impl<T, G: Guard> Default for LockFreeSet<T, G, HashKey> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, G: Guard, K> Drop for LockFreeSet<T, G, K> {
    fn drop(&mut self) {
        // Free everything still linked, marked or not, including sentinels.
        // Unlinked nodes belong to the guard.
        //
        let mut freed = 0usize;
        let mut curr = self.head;
        while !curr.is_null() {
            let next = self.node(curr).next_ptr();
            if curr != self.head && curr != self.tail {
                freed += 1;
            }
            unsafe { LockFreeKeyNode::dealloc_ptr(curr) };
            curr = next;
        }

        log::debug!("LockFreeSet dropped, freed {} linked nodes", freed);
    }
}
