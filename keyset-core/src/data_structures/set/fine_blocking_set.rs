use std::ptr;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::data_structures::ConcurrentSet;
use crate::data_structures::item_key::{HEAD_KEY, HashKey, ItemKey, Key, TAIL_KEY};
use crate::data_structures::node::{LockableKeyNode, LockableNodePtr, LockedNode};

///
/// Sorted set using hand-over-hand (lock coupling) locking.
///
/// Every node carries its own mutex. A traversal holds at most two adjacent
/// locks and always acquires them in list order, so two threads contending
/// for the same pair of nodes lock them in the same global order.
///
// =============================================================================
// LIST STRUCTURE
// =============================================================================
//
// ┌──────┐    ┌──────┐    ┌──────┐    ┌──────┐    ┌──────┐
// │ HEAD │───►│  10  │───►│  20  │───►│  20' │───►│ TAIL │
// │ MIN  │    │      │    │      │    │      │    │ MAX  │
// └──────┘    └──────┘    └──────┘    └──────┘    └──────┘
//
// 20 and 20' are distinct items whose keys collided. Membership within a
// key-equal run is decided by item equality.
//
// =============================================================================
// LOCK COUPLING
// =============================================================================
//
// find(15):
//   lock(HEAD) lock(10)              10 < 15, advance
//   unlock(HEAD) lock(20)            20 >= 15, stop
//   window = (10, 20), both locked
//
// Removing 20 rewires 10.next while holding both 10 and 20. No other thread
// can hold 10 at that moment, and reaching 20 requires holding 10 first, so
// the unlinked node is unreachable and is freed immediately.
//
pub struct FineBlockingSet<T, K = HashKey> {
    head: LockableNodePtr<T>,
    tail: LockableNodePtr<T>,
    size: AtomicUsize,
    key_fn: K,
}

// Safety: nodes are only mutated under their own lock; items are shared
// between threads by reference (Sync) and dropped on whichever thread
// removes them (Send).
unsafe impl<T: Send, K: Send> Send for FineBlockingSet<T, K> {}
unsafe impl<T: Send + Sync, K: Sync> Sync for FineBlockingSet<T, K> {}

/// Two adjacent locked nodes with `prev.key < key <= curr.key`.
///
/// Dropping the window releases both locks.
struct Window<'a, T> {
    prev: LockedNode<'a, T>,
    curr: LockedNode<'a, T>,
}

impl<T> FineBlockingSet<T, HashKey> {
    pub fn new() -> Self {
        Self::with_key_fn(HashKey::default())
    }
}

impl<T, K> FineBlockingSet<T, K> {
    /// Create a set that orders items by `key_fn`.
    pub fn with_key_fn(key_fn: K) -> Self {
        let tail = Box::into_raw(Box::new(LockableKeyNode::new_sentinel(
            TAIL_KEY,
            ptr::null_mut(),
        )));
        let head = Box::into_raw(Box::new(LockableKeyNode::new_sentinel(HEAD_KEY, tail)));

        log::debug!("FineBlockingSet created");

        FineBlockingSet {
            head,
            tail,
            size: AtomicUsize::new(0),
            key_fn,
        }
    }

    #[inline]
    fn node(&self, ptr: LockableNodePtr<T>) -> &LockableKeyNode<T> {
        // Safety: every pointer reached from head while holding the
        // predecessor's lock refers to a live node owned by this set.
        unsafe { &*ptr }
    }

    #[inline]
    fn is_tail(&self, locked: &LockedNode<'_, T>) -> bool {
        locked.as_ptr() == self.tail
    }

    /// Locate the window for `key` using lock coupling.
    ///
    /// Returns with both `prev` and `curr` locked.
    fn find(&self, key: Key) -> Window<'_, T> {
        let mut prev = self.node(self.head).lock();
        let mut curr = self.node(prev.next()).lock();

        while !self.is_tail(&curr) && curr.node().key() < key {
            // Assigning releases the old prev before the next lock is taken.
            prev = curr;
            curr = self.node(prev.next()).lock();
        }

        Window { prev, curr }
    }

    /// Slide the window along the key-equal run looking for `item`.
    ///
    /// Returns whether the item was found in `window.curr`; on `false` the
    /// window sits at the end of the run, the insertion point for `item`.
    fn scan_run<'a>(&'a self, window: Window<'a, T>, key: Key, item: &T) -> (Window<'a, T>, bool)
    where
        T: Eq,
    {
        let Window { mut prev, mut curr } = window;

        while !self.is_tail(&curr) && curr.node().key() == key {
            if curr.node().holds(item) {
                return (Window { prev, curr }, true);
            }

            prev = curr;
            curr = self.node(prev.next()).lock();
        }

        (Window { prev, curr }, false)
    }
}

impl<T, K> ConcurrentSet<T> for FineBlockingSet<T, K>
where
    T: Eq,
    K: ItemKey<T>,
{
    fn add(&self, item: T) -> bool {
        let key = self.key_fn.key_of(&item);
        let (mut window, found) = self.scan_run(self.find(key), key, &item);

        if found {
            return false;
        }

        let node = Box::into_raw(Box::new(LockableKeyNode::new(
            item,
            key,
            window.curr.as_ptr(),
        )));
        window.prev.set_next(node);
        self.size.fetch_add(1, Ordering::Relaxed);
        true
    }

    fn remove(&self, item: &T) -> bool {
        let key = self.key_fn.key_of(item);
        let (window, found) = self.scan_run(self.find(key), key, item);

        if !found {
            return false;
        }

        let Window { mut prev, curr } = window;
        debug_assert!(!curr.node().is_sentinel());
        prev.set_next(curr.next());

        let victim = curr.as_ptr();
        drop(curr);

        // Safety: victim is unlinked and we still hold its predecessor's
        // lock, so no other thread can reach it.
        unsafe { LockableKeyNode::dealloc_ptr(victim) };

        self.size.fetch_sub(1, Ordering::Relaxed);
        drop(prev);
        true
    }

    fn contains(&self, item: &T) -> bool {
        let key = self.key_fn.key_of(item);
        let (_window, found) = self.scan_run(self.find(key), key, item);
        found
    }

    fn is_empty(&self) -> bool {
        self.node(self.head).lock().next() == self.tail
    }

    fn len(&self) -> usize {
        self.size.load(Ordering::Relaxed)
    }
}

impl<T> Default for FineBlockingSet<T, HashKey> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, K> Drop for FineBlockingSet<T, K> {
    fn drop(&mut self) {
        // Exclusive access: walk the chain and free every node including
        // both sentinels.
        //
        let mut freed = 0usize;
        let mut curr = self.head;
        while !curr.is_null() {
            let node = unsafe { Box::from_raw(curr) };
            if !node.is_sentinel() {
                freed += 1;
            }
            curr = node.into_next();
        }

        log::debug!("FineBlockingSet dropped, freed {} nodes", freed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    impl<T, K> FineBlockingSet<T, K> {
        /// Keys of the whole chain, sentinels included.
        fn chain_keys(&self) -> Vec<Key> {
            let mut keys = Vec::new();
            let mut curr = self.head;
            while !curr.is_null() {
                let node = self.node(curr);
                keys.push(node.key());
                curr = node.lock().next();
            }
            keys
        }
    }

    #[test]
    fn test_chain_is_sorted_between_sentinels() {
        let set = FineBlockingSet::new();
        for i in (0..200u64).rev() {
            set.add(i);
        }
        for i in (0..200u64).step_by(3) {
            set.remove(&i);
        }

        let keys = set.chain_keys();
        assert_eq!(keys.first(), Some(&HEAD_KEY));
        assert_eq!(keys.last(), Some(&TAIL_KEY));
        assert!(keys.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(keys.len() - 2, set.len());
    }

    #[test]
    fn test_colliding_items_are_kept_in_one_run() {
        let set = FineBlockingSet::with_key_fn(|item: &u64| (*item % 2) as Key);
        for i in 0..10u64 {
            assert!(set.add(i));
        }

        let keys = set.chain_keys();
        assert_eq!(&keys[1..6], &[0, 0, 0, 0, 0]);
        assert_eq!(&keys[6..11], &[1, 1, 1, 1, 1]);

        assert!(set.remove(&4));
        assert!(set.contains(&2));
        assert!(set.contains(&6));
        assert!(!set.contains(&4));
    }

    #[test]
    fn test_sentinel_keys_are_usable_by_items() {
        let set = FineBlockingSet::with_key_fn(|item: &i64| *item);
        assert!(set.add(Key::MAX));
        assert!(set.add(Key::MIN));
        assert!(set.contains(&Key::MAX));
        assert!(set.contains(&Key::MIN));
        assert!(set.remove(&Key::MAX));
        assert!(set.remove(&Key::MIN));
        assert!(set.is_empty());
    }

    #[test]
    fn test_panicking_eq_poisons_and_fails_later_calls() {
        #[derive(Debug)]
        struct Touchy(u64);

        impl PartialEq for Touchy {
            fn eq(&self, other: &Self) -> bool {
                if other.0 == 13 {
                    panic!("refusing to compare with 13");
                }
                self.0 == other.0
            }
        }
        impl Eq for Touchy {}

        let set = Arc::new(FineBlockingSet::with_key_fn(|_: &Touchy| 1 as Key));
        assert!(set.add(Touchy(1)));

        let worker = {
            let set = Arc::clone(&set);
            thread::spawn(move || set.contains(&Touchy(13)))
        };
        assert!(worker.join().is_err());

        // The node lock is poisoned: the next call must fail abruptly rather
        // than report a result.
        let set_clone = Arc::clone(&set);
        let later = thread::spawn(move || set_clone.contains(&Touchy(1)));
        assert!(later.join().is_err());
    }

    #[test]
    fn test_drop_logs_freed_nodes() {
        crate::test_logging::capture();
        {
            let set = FineBlockingSet::new();
            for i in 0..42u64 {
                set.add(i);
            }
            set.remove(&0);
        }

        assert!(crate::test_logging::logged(
            log::Level::Debug,
            "FineBlockingSet dropped, freed 41 nodes"
        ));
    }
}
