//! Shared test suites, generic over [`ConcurrentSet`](crate::ConcurrentSet)
//! backends.
//!
//! Integration tests instantiate each suite once per backend.
