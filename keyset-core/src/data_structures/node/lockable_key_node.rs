use std::ptr;
use std::sync::{Mutex, MutexGuard};

use crate::data_structures::item_key::Key;

pub(crate) type LockableNodePtr<T> = *mut LockableKeyNode<T>;

/// Node of a lock-coupled sorted list.
///
/// The node's mutex guards its `next` pointer. Item and key are immutable
/// after construction and may be read by whoever holds the lock.
///
#[derive(Debug)]
pub(crate) struct LockableKeyNode<T> {
    item: Option<T>,
    key: Key,
    next: Mutex<LockableNodePtr<T>>,
}

impl<T> LockableKeyNode<T> {
    pub(crate) fn new(item: T, key: Key, next: LockableNodePtr<T>) -> Self {
        LockableKeyNode {
            item: Some(item),
            key,
            next: Mutex::new(next),
        }
    }

    pub(crate) fn new_sentinel(key: Key, next: LockableNodePtr<T>) -> Self {
        LockableKeyNode {
            item: None,
            key,
            next: Mutex::new(next),
        }
    }

    #[inline]
    pub(crate) fn key(&self) -> Key {
        self.key
    }

    #[inline]
    pub(crate) fn is_sentinel(&self) -> bool {
        self.item.is_none()
    }

    /// Item equality; sentinels never match.
    #[inline]
    pub(crate) fn holds(&self, item: &T) -> bool
    where
        T: Eq,
    {
        self.item.as_ref() == Some(item)
    }

    /// Acquire this node's lock. The lock is released when the returned
    /// `LockedNode` is dropped.
    ///
    /// A poisoned lock means another thread died inside a critical section
    /// of this node; the waiting call cannot continue and panics.
    pub(crate) fn lock(&self) -> LockedNode<'_, T> {
        let next = self
            .next
            .lock()
            .unwrap_or_else(|_| panic!("lock of node with key {} is poisoned", self.key));
        LockedNode { node: self, next }
    }

    /// Successor pointer of a node no other thread can reach.
    pub(crate) fn into_next(self) -> LockableNodePtr<T> {
        self.next
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Deallocate a node created with `Box::new`.
    ///
    /// # Safety
    /// - The pointer must have been produced by `Box::into_raw`
    /// - Must only be called once, after the node became unreachable
    ///   and its lock is no longer held
    ///
    pub(crate) unsafe fn dealloc_ptr(ptr: LockableNodePtr<T>) {
        unsafe { drop(Box::from_raw(ptr)) };
    }
}

/// A node whose lock is held by the current thread.
pub(crate) struct LockedNode<'a, T> {
    node: &'a LockableKeyNode<T>,
    next: MutexGuard<'a, LockableNodePtr<T>>,
}

impl<'a, T> LockedNode<'a, T> {
    #[inline]
    pub(crate) fn node(&self) -> &'a LockableKeyNode<T> {
        self.node
    }

    #[inline]
    pub(crate) fn as_ptr(&self) -> LockableNodePtr<T> {
        ptr::from_ref(self.node).cast_mut()
    }

    #[inline]
    pub(crate) fn next(&self) -> LockableNodePtr<T> {
        *self.next
    }

    #[inline]
    pub(crate) fn set_next(&mut self, next: LockableNodePtr<T>) {
        *self.next = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lock_guards_next_pointer() {
        let tail = Box::into_raw(Box::new(LockableKeyNode::<u32>::new_sentinel(
            Key::MAX,
            ptr::null_mut(),
        )));
        let head = LockableKeyNode::new_sentinel(Key::MIN, ptr::null_mut());

        {
            let mut locked = head.lock();
            assert!(locked.next().is_null());
            locked.set_next(tail);
        }

        // Lock was released by the drop above.
        assert_eq!(head.lock().next(), tail);
        assert_eq!(head.into_next(), tail);

        unsafe { LockableKeyNode::dealloc_ptr(tail) };
    }

    #[test]
    fn test_holds_compares_by_value() {
        let node = LockableKeyNode::new(String::from("a"), 1, ptr::null_mut());
        assert!(node.holds(&String::from("a")));
        assert!(!node.holds(&String::from("b")));
        assert!(!node.is_sentinel());
    }
}
