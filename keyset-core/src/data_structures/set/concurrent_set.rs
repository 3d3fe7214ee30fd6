/// The capability shared by every set backend.
///
/// All operations take `&self` and are safe to call from many threads at
/// once. Outcomes are reported through return values only; no operation
/// fails with an error.
///
/// # Design
///
/// ```text
/// ConcurrentSet<T>
///     │
///     ├── CoarseBlockingSet<T>         one mutex, unsorted list
///     ├── FineBlockingSet<T, K>        hand-over-hand locking, sorted list
///     └── LockFreeSet<T, G, K>         Harris-style marked list
/// ```
///
/// Callers are generic over this trait; the backend is picked when the set
/// is constructed.
///
pub trait ConcurrentSet<T> {
    /// Insert `item` if it is absent.
    ///
    /// Returns `true` iff the item was absent and is now present.
    ///
    /// # Example
    ///
    /// ```rust
    /// use keyset_core::{ConcurrentSet, FineBlockingSet};
    ///
    /// let set = FineBlockingSet::new();
    /// assert!(set.add(5));
    /// assert!(!set.add(5)); // Duplicate
    /// ```
    fn add(&self, item: T) -> bool;

    /// Remove `item` if it is present.
    ///
    /// Returns `true` iff the item was present and is now absent.
    fn remove(&self, item: &T) -> bool;

    /// Returns `true` iff `item` is currently (logically) present.
    fn contains(&self, item: &T) -> bool;

    /// Returns `true` if the set holds no items.
    fn is_empty(&self) -> bool;

    /// Number of items in the set.
    ///
    /// Exact only while no mutation is in flight; under contention this is
    /// a count taken at a glance.
    fn len(&self) -> usize;
}
