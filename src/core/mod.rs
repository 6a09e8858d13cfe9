//! Core ledger functionality
//!
//! The block and transaction entities, their canonical byte layouts, the
//! base-target arithmetic and the state transition that applies accepted
//! blocks to accounts.

pub mod account;
pub mod address;
pub mod asset;
pub mod block;
pub mod blockchain;
pub mod chain;
pub mod codec;
pub mod difficulty;
pub mod forging;
pub mod monetary;
pub mod transaction;

pub use account::Account;
pub use address::AddressRecord;
pub use asset::{Asset, DelegateAsset, SignatureAsset, TransactionType};
pub use block::{Block, BlockJson};
pub use blockchain::{Blockchain, BlockchainIterator};
pub use chain::{Ledger, SharedLedger};
pub use difficulty::DifficultyAdjustment;
pub use monetary::{
    ACCOUNT_SUFFIX, ALIAS_SUFFIX, BLOCK_INTERVAL_SECONDS, BLOCK_VERSION, GENESIS_BLOCK_ID,
    INITIAL_BASE_TARGET, MAX_BASE_TARGET, UNITS_PER_COIN,
};
pub use transaction::{Transaction, TransactionJson};
