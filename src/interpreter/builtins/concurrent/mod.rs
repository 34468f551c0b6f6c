//! Thread-safe collections living under the `Concurrent` namespace.
//!
//! `Concurrent::Hash` is a sharded map that needs no caller-side locking
//! and promises no corruption, not snapshot consistency. `Concurrent::Array`
//! puts one reader/writer lock in front of a plain array and forwards each
//! operation to it under the lock mode the forwarding table assigns.

pub mod array;
pub mod hash;

pub use array::{AccessMode, ConcurrentArrayObject, FORWARDING_TABLE};
pub use hash::ConcurrentHashObject;
