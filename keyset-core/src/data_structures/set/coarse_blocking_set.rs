use std::sync::{Mutex, MutexGuard};

use crate::data_structures::ConcurrentSet;

type Link<T> = Option<Box<CoarseNode<T>>>;

struct CoarseNode<T> {
    item: T,
    next: Link<T>,
}

struct CoarseList<T> {
    head: Link<T>,
    len: usize,
}

impl<T: Eq> CoarseList<T> {
    fn contains(&self, item: &T) -> bool {
        let mut curr = &self.head;
        while let Some(node) = curr {
            if node.item == *item {
                return true;
            }
            curr = &node.next;
        }
        false
    }

    fn remove(&mut self, item: &T) -> bool {
        let mut link = &mut self.head;
        loop {
            match link {
                None => return false,
                Some(node) if node.item == *item => {
                    *link = node.next.take();
                    self.len -= 1;
                    return true;
                }
                Some(node) => link = &mut node.next,
            }
        }
    }
}

///
/// Set guarded by a single mutex over an unsorted singly linked list.
///
/// Every operation serializes on the one lock. This is the trivially correct
/// reference that the sorted backends are checked against.
///
pub struct CoarseBlockingSet<T> {
    list: Mutex<CoarseList<T>>,
}

impl<T> CoarseBlockingSet<T> {
    pub fn new() -> Self {
        log::debug!("CoarseBlockingSet created");
        CoarseBlockingSet {
            list: Mutex::new(CoarseList { head: None, len: 0 }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, CoarseList<T>> {
        self.list
            .lock()
            .unwrap_or_else(|_| panic!("CoarseBlockingSet lock is poisoned"))
    }
}

impl<T: Eq> ConcurrentSet<T> for CoarseBlockingSet<T> {
    fn add(&self, item: T) -> bool {
        let mut list = self.lock();
        if list.contains(&item) {
            return false;
        }

        // Prepend.
        let head = list.head.take();
        list.head = Some(Box::new(CoarseNode { item, next: head }));
        list.len += 1;
        true
    }

    fn remove(&self, item: &T) -> bool {
        self.lock().remove(item)
    }

    fn contains(&self, item: &T) -> bool {
        self.lock().contains(item)
    }

    fn is_empty(&self) -> bool {
        self.lock().head.is_none()
    }

    fn len(&self) -> usize {
        self.lock().len
    }
}

impl<T> Default for CoarseBlockingSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Drop for CoarseBlockingSet<T> {
    fn drop(&mut self) {
        // Unlink iteratively; the default recursive Box drop can overflow the
        // stack on long lists.
        //
        let list = self
            .list
            .get_mut()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        log::debug!("CoarseBlockingSet dropped with {} items", list.len);

        let mut curr = list.head.take();
        while let Some(mut node) = curr {
            curr = node.next.take();
        }
    }
}
