//! Injected state collaborators
//!
//! The ledger reads and mutates accounts and alias records through these
//! traits. The in-memory implementations back tests, the CLI and any embedder
//! that has no persistence of its own.

pub mod accounts;
pub mod aliases;

pub use accounts::{AccountRepository, MemoryAccounts};
pub use aliases::{AliasTable, MemoryAliases};
