//! Test utilities for ledger testing

use crate::config::ChainConfig;
use crate::core::{Block, Ledger, Transaction};
use crate::storage::{MemoryAccounts, MemoryAliases};
use crate::utils::{derive_keypair, Keypair};

/// Keypair derived from a fixed phrase
pub fn keypair(phrase: &str) -> Keypair {
    derive_keypair(phrase).unwrap()
}

/// A signed plain payment
pub fn payment(
    sender: &Keypair,
    recipient_id: &str,
    amount: u64,
    fee: u64,
    timestamp: u32,
) -> Transaction {
    Transaction::new_payment(sender, recipient_id, amount, fee, timestamp).unwrap()
}

/// A signed genesis block at timestamp 0
pub fn genesis_block(forger: &Keypair, transactions: Vec<Transaction>) -> Block {
    Block::forge(None, 0, transactions, vec![], forger).unwrap()
}

/// An empty in-memory ledger with the default chain parameters
pub fn test_ledger() -> Ledger<MemoryAccounts, MemoryAliases> {
    Ledger::in_memory(ChainConfig::default())
}
