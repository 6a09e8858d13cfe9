// Type-specific transaction payloads. Only the delegate registration carries
// bytes into the pre-image; every other (type, subtype) pair encodes nothing.

use crate::error::{LedgerError, Result};
use crate::utils::{hex_bytes, PUBLIC_KEY_LENGTH};
use serde::{Deserialize, Serialize};

/// Encoded width of a delegate registration asset
pub const DELEGATE_ASSET_SIZE: usize = 196;

/// Room left for the username after the delegate public key
pub const DELEGATE_USERNAME_SIZE: usize = DELEGATE_ASSET_SIZE - PUBLIC_KEY_LENGTH;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransactionType {
    Send,
    Signature,
    Delegate,
    Vote,
    Unknown(u8),
}

impl TransactionType {
    pub fn as_u8(self) -> u8 {
        match self {
            TransactionType::Send => 0,
            TransactionType::Signature => 1,
            TransactionType::Delegate => 2,
            TransactionType::Vote => 3,
            TransactionType::Unknown(code) => code,
        }
    }
}

impl From<u8> for TransactionType {
    fn from(code: u8) -> Self {
        match code {
            0 => TransactionType::Send,
            1 => TransactionType::Signature,
            2 => TransactionType::Delegate,
            3 => TransactionType::Vote,
            other => TransactionType::Unknown(other),
        }
    }
}

/// Encoded asset width for a (type, subtype) pair
pub fn asset_size(tx_type: TransactionType, subtype: u8) -> usize {
    match (tx_type, subtype) {
        (TransactionType::Delegate, 0) => DELEGATE_ASSET_SIZE,
        _ => 0,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignatureAsset {
    #[serde(with = "hex_bytes")]
    pub public_key: [u8; PUBLIC_KEY_LENGTH],
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DelegateAsset {
    pub username: String,
    #[serde(with = "hex_bytes")]
    pub public_key: [u8; PUBLIC_KEY_LENGTH],
}

impl DelegateAsset {
    /// Public key followed by the UTF-8 username, zero-padded
    pub fn get_bytes(&self) -> Result<Vec<u8>> {
        let username = self.username.as_bytes();
        if username.is_empty() {
            return Err(LedgerError::Encoding(
                "Delegate username must not be empty".to_string(),
            ));
        }
        if username.len() > DELEGATE_USERNAME_SIZE {
            return Err(LedgerError::Encoding(format!(
                "Delegate username is {} bytes, at most {DELEGATE_USERNAME_SIZE} fit",
                username.len()
            )));
        }

        let mut bytes = Vec::with_capacity(DELEGATE_ASSET_SIZE);
        bytes.extend_from_slice(&self.public_key);
        bytes.extend_from_slice(username);
        bytes.resize(DELEGATE_ASSET_SIZE, 0);
        Ok(bytes)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Asset {
    #[default]
    None,
    Signature(SignatureAsset),
    Delegate(DelegateAsset),
    Votes(Vec<String>),
}

impl Asset {
    pub fn is_none(&self) -> bool {
        matches!(self, Asset::None)
    }

    /// Exactly `asset_size(tx_type, subtype)` bytes
    pub fn get_bytes(&self, tx_type: TransactionType, subtype: u8) -> Result<Vec<u8>> {
        let size = asset_size(tx_type, subtype);
        if size == 0 {
            return Ok(Vec::new());
        }

        match self {
            Asset::Delegate(delegate) => delegate.get_bytes(),
            _ => Err(LedgerError::Encoding(format!(
                "Transaction type {} subtype {subtype} requires a delegate asset",
                tx_type.as_u8()
            ))),
        }
    }
}
