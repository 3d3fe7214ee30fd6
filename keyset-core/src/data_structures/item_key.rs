//! Key derivation for the sorted set backends.
//!
//! The sorted sets order their nodes by an integer [`Key`] computed once per
//! item. Key derivation is injected through [`ItemKey`], so callers can pick:
//!
//! - [`HashKey`] - hashes the item with a `BuildHasher` (the default)
//! - [`NullableKey`] - for `Option<U>` items, `None` always gets key `0`
//! - any `Fn(&T) -> Key` closure or function pointer
//!
//! Two unequal items may share a key. The sets resolve membership inside a
//! key-equal run by `Eq`, never by key alone.

use std::hash::{BuildHasher, BuildHasherDefault, DefaultHasher, Hash};

/// Integer key used to order list nodes.
pub type Key = i64;

/// Key of the permanent head sentinel.
pub const HEAD_KEY: Key = Key::MIN;

/// Key of the permanent tail sentinel.
pub const TAIL_KEY: Key = Key::MAX;

/// Key [`NullableKey`] assigns to `None`.
pub const NULL_KEY: Key = 0;

/// Derives the ordering key of an item.
///
/// Implementations must be deterministic: the same item must yield the same
/// key for as long as it is a member of a set.
pub trait ItemKey<T: ?Sized> {
    fn key_of(&self, item: &T) -> Key;
}

impl<T, F> ItemKey<T> for F
where
    T: ?Sized,
    F: Fn(&T) -> Key,
{
    #[inline]
    fn key_of(&self, item: &T) -> Key {
        self(item)
    }
}

/// Derives keys by hashing the item.
///
/// The default hasher has a fixed seed, so two sets built with
/// `HashKey::default()` agree on every key.
#[derive(Clone, Debug, Default)]
pub struct HashKey<S = BuildHasherDefault<DefaultHasher>> {
    build_hasher: S,
}

impl<S> HashKey<S> {
    pub fn with_hasher(build_hasher: S) -> Self {
        HashKey { build_hasher }
    }
}

impl<T, S> ItemKey<T> for HashKey<S>
where
    T: Hash + ?Sized,
    S: BuildHasher,
{
    #[inline]
    fn key_of(&self, item: &T) -> Key {
        self.build_hasher.hash_one(item) as Key
    }
}

/// Key derivation for nullable items.
///
/// `None` is assigned [`NULL_KEY`]; `Some(u)` delegates to the inner
/// derivation.
#[derive(Clone, Debug, Default)]
pub struct NullableKey<K = HashKey> {
    inner: K,
}

impl<K> NullableKey<K> {
    pub fn new(inner: K) -> Self {
        NullableKey { inner }
    }
}

impl<U, K> ItemKey<Option<U>> for NullableKey<K>
where
    K: ItemKey<U>,
{
    #[inline]
    fn key_of(&self, item: &Option<U>) -> Key {
        match item {
            Some(value) => self.inner.key_of(value),
            None => NULL_KEY,
        }
    }
}
