//! Blocking queue primitives shared by the batchq crates.

pub mod collections;
pub mod concurrent;
