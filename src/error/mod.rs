//! Error handling for the ledger
//!
//! Every fallible operation in the crate reports one of these variants.
//! Nothing here is retried: the caller decides what to do with a rejection.

use std::fmt;

/// Result type alias for ledger operations
pub type Result<T> = std::result::Result<T, LedgerError>;

/// Error types for encoding, signing and block acceptance
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// Malformed or wrong-length binary or numeric fields
    Encoding(String),
    /// Declared previous block does not match the chain tip
    Linkage(String),
    /// Block or transaction signature did not verify
    InvalidSignature(String),
    /// Key derivation or signing failures
    Crypto(String),
    /// Alias-targeted recipient has no record in the alias table
    UnknownAlias(String),
    /// Balance arithmetic left the i64 range
    BalanceOverflow(String),
    /// Block is structurally unacceptable
    InvalidBlock(String),
    /// Transaction is structurally unacceptable
    InvalidTransaction(String),
    /// Configuration errors
    Config(String),
    /// JSON projection errors
    Serialization(String),
    /// File I/O errors
    Io(String),
    /// Shared ledger lock was poisoned by a panicking writer
    Lock(String),
}

impl fmt::Display for LedgerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LedgerError::Encoding(msg) => write!(f, "Encoding error: {msg}"),
            LedgerError::Linkage(msg) => write!(f, "Linkage error: {msg}"),
            LedgerError::InvalidSignature(msg) => write!(f, "Invalid signature: {msg}"),
            LedgerError::Crypto(msg) => write!(f, "Cryptographic error: {msg}"),
            LedgerError::UnknownAlias(alias) => write!(f, "Unknown alias: {alias}"),
            LedgerError::BalanceOverflow(msg) => write!(f, "Balance overflow: {msg}"),
            LedgerError::InvalidBlock(msg) => write!(f, "Invalid block: {msg}"),
            LedgerError::InvalidTransaction(msg) => write!(f, "Invalid transaction: {msg}"),
            LedgerError::Config(msg) => write!(f, "Configuration error: {msg}"),
            LedgerError::Serialization(msg) => write!(f, "Serialization error: {msg}"),
            LedgerError::Io(msg) => write!(f, "I/O error: {msg}"),
            LedgerError::Lock(msg) => write!(f, "Lock error: {msg}"),
        }
    }
}

impl std::error::Error for LedgerError {}

impl From<std::io::Error> for LedgerError {
    fn from(err: std::io::Error) -> Self {
        LedgerError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for LedgerError {
    fn from(err: serde_json::Error) -> Self {
        LedgerError::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for LedgerError {
    fn from(err: toml::de::Error) -> Self {
        LedgerError::Config(err.to_string())
    }
}
