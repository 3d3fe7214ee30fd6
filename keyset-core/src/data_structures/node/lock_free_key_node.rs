use std::ptr;
use std::sync::atomic::{AtomicPtr, Ordering};

use crate::data_structures::MarkedPtr;
use crate::data_structures::item_key::Key;

pub(crate) type NodePtr<T> = *mut LockFreeKeyNode<T>;

/// Node of a lock-free sorted list.
///
/// The successor pointer and the node's own deletion flag share one
/// `AtomicPtr` word (see `MarkedPtr`), so they are always read and swapped
/// together. A set flag means *this* node is logically deleted.
///
#[derive(Debug)]
pub(crate) struct LockFreeKeyNode<T> {
    item: Option<T>,
    key: Key,
    next: AtomicPtr<LockFreeKeyNode<T>>,
}

impl<T> LockFreeKeyNode<T> {
    pub(crate) fn new(item: T, key: Key) -> Self {
        LockFreeKeyNode {
            item: Some(item),
            key,
            next: AtomicPtr::new(ptr::null_mut()),
        }
    }

    pub(crate) fn new_sentinel(key: Key, next: NodePtr<T>) -> Self {
        LockFreeKeyNode {
            item: None,
            key,
            next: AtomicPtr::new(next),
        }
    }

    #[inline]
    pub(crate) fn item(&self) -> Option<&T> {
        self.item.as_ref()
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

    // =========================================================================
    // Next pointer accessors
    // =========================================================================

    /// Load next pointer together with the deletion flag (Acquire ordering).
    #[inline]
    pub(crate) fn next(&self) -> MarkedPtr<Self> {
        MarkedPtr::new(self.next.load(Ordering::Acquire))
    }

    /// Load the successor, ignoring the deletion flag.
    #[inline]
    pub(crate) fn next_ptr(&self) -> NodePtr<T> {
        self.next().as_ptr()
    }

    #[cfg(test)]
    pub(crate) fn is_marked(&self) -> bool {
        self.next().is_marked()
    }

    /// Store next pointer (Release ordering).
    ///
    /// Only valid before the node is published into a list.
    #[inline]
    pub(crate) fn set_next(&self, next: NodePtr<T>, marked: bool) {
        self.next
            .store(MarkedPtr::compose(next, marked).as_raw(), Ordering::Release)
    }

    /// Atomically replace `(expected, expected_mark)` with `(new, new_mark)`.
    ///
    /// Fails if either the pointer or the flag differs from the expectation.
    #[inline]
    pub(crate) fn compare_and_set_next(
        &self,
        expected: NodePtr<T>,
        new: NodePtr<T>,
        expected_mark: bool,
        new_mark: bool,
    ) -> bool {
        let expected = MarkedPtr::compose(expected, expected_mark).as_raw();
        let new = MarkedPtr::compose(new, new_mark).as_raw();
        self.next
            .compare_exchange(expected, new, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Deallocate a node created with `Box::new`.
    ///
    /// # Safety
    /// - The pointer must have been produced by `Box::into_raw`
    /// - Must only be called once, after the node became unreachable
    ///
    pub(crate) unsafe fn dealloc_ptr(ptr: NodePtr<T>) {
        unsafe { drop(Box::from_raw(ptr)) };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cas_requires_matching_pointer_and_flag() {
        let tail = Box::into_raw(Box::new(LockFreeKeyNode::<u32>::new_sentinel(
            Key::MAX,
            ptr::null_mut(),
        )));
        let node = LockFreeKeyNode::new(5u32, 5);
        node.set_next(tail, false);

        // Wrong flag.
        assert!(!node.compare_and_set_next(tail, tail, true, true));
        assert!(!node.is_marked());

        // Matching pair: logical delete keeps the successor.
        assert!(node.compare_and_set_next(tail, tail, false, true));
        assert!(node.is_marked());
        assert_eq!(node.next_ptr(), tail);

        // Once marked, an unmarked expectation never matches again.
        assert!(!node.compare_and_set_next(tail, tail, false, false));

        unsafe { LockFreeKeyNode::dealloc_ptr(tail) };
    }

    #[test]
    fn test_sentinel_never_holds_an_item() {
        let sentinel = LockFreeKeyNode::<u32>::new_sentinel(Key::MIN, ptr::null_mut());
        assert!(sentinel.is_sentinel());
        assert!(!sentinel.holds(&0));
        assert!(sentinel.item().is_none());
    }
}
