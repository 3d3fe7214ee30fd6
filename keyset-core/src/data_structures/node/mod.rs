//! Node abstractions shared by the sorted set backends.
//!
//! - [`LockableKeyNode`] - item, key and a mutex-guarded next pointer
//!   (hand-over-hand locking)
//! - [`LockFreeKeyNode`] - item, key and an atomic next pointer packed with
//!   the node's deletion flag (Harris-style marking)
//!
//! Neither node exposes a predecessor. Traversal is forward-only from the
//! head sentinel, which gives lock-based traversals a single global lock
//! order.

pub mod lock_free_key_node;
pub mod lockable_key_node;

pub(crate) use lock_free_key_node::{LockFreeKeyNode, NodePtr};
pub(crate) use lockable_key_node::{LockableKeyNode, LockableNodePtr, LockedNode};
