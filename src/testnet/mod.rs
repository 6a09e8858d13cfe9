//! Shared fixtures for unit tests
//!
//! Deterministic keys, signed payments and a freshly forged genesis block, so
//! tests across modules build the same chain the same way.

pub mod test_utils;

pub use test_utils::*;
