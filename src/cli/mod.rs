//! Command-line interface
//!
//! Argument parsing for the ledger tool.

pub mod commands;

pub use commands::{AllocationArg, Command, Opt};
