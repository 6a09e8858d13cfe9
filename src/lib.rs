//! # Stake Ledger - the ledger core of a proof-of-stake chain
//!
//! Everything a node needs to agree with its peers on what a block means:
//!
//! ## What's Here
//! - **Entities**: blocks and transactions with memoized ids and ed25519 signatures
//! - **Codec**: the fixed byte layouts that every hash and signature covers
//! - **Retargeting**: base target and cumulative difficulty in arbitrary precision
//! - **Forging**: generation signatures and the stake-weighted eligibility check
//! - **State transition**: `Ledger::accept`, which links a block to the tip and
//!   applies it to accounts all at once or not at all
//!
//! ## How the Code Is Organized
//! - `core/`: entities, codec, difficulty, forging and block acceptance
//! - `storage/`: account and alias repositories the ledger is handed
//! - `config/`: chain parameters
//! - `utils/`: hashing, keys, ids and hex helpers
//! - `cli/`: command-line arguments for the `stake-ledger` binary
//!
//! Peer networking, persistence and fork choice live elsewhere; the ledger
//! works against whatever repositories it is given.

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod storage;
pub mod utils;

#[cfg(test)]
pub mod testnet;

// Re-export commonly used types for convenience
pub use cli::{Command, Opt};
pub use config::ChainConfig;
pub use core::{
    Account, AddressRecord, Asset, Block, Blockchain, DifficultyAdjustment, Ledger,
    SharedLedger, Transaction, TransactionType,
};
pub use error::{LedgerError, Result};
pub use storage::{AccountRepository, AliasTable, MemoryAccounts, MemoryAliases};
pub use utils::{
    address_from_public_key, derive_id, derive_keypair, ed25519_sign, ed25519_verify,
    sha256_digest, Keypair, PUBLIC_KEY_LENGTH,
};
