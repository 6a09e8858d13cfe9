// This file implements the transaction entity - how value moves between accounts.
// A transaction is built unsigned, signed by its sender (and optionally a second key),
// then included in exactly one block, after which it never changes.

use crate::core::asset::{Asset, TransactionType};
use crate::core::codec::{encode_transaction, strip_signatures};
use crate::error::{LedgerError, Result};
use crate::utils::{
    derive_id, ed25519_sign, ed25519_verify, hex_bytes, hex_bytes_opt, sha256_digest, Keypair,
    HASH_LENGTH, PUBLIC_KEY_LENGTH, SIGNATURE_LENGTH,
};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone)]
pub struct Transaction {
    id: OnceCell<String>, // Written once from the hash, never recomputed
    tx_type: TransactionType,
    subtype: u8,
    timestamp: u32,
    sender_public_key: [u8; PUBLIC_KEY_LENGTH],
    recipient_id: Option<String>, // Decimal id, possibly with a marker suffix
    amount: u64,
    fee: u64,
    signature: Option<[u8; SIGNATURE_LENGTH]>,
    sign_signature: Option<[u8; SIGNATURE_LENGTH]>,
    asset: Asset,
    block_id: Option<String>,
    height: u64,
}

impl Transaction {
    // An unsigned transaction with subtype 0 and no asset
    pub fn new(
        tx_type: TransactionType,
        timestamp: u32,
        sender_public_key: [u8; PUBLIC_KEY_LENGTH],
        recipient_id: Option<String>,
        amount: u64,
        fee: u64,
    ) -> Transaction {
        Transaction {
            id: OnceCell::new(),
            tx_type,
            subtype: 0,
            timestamp,
            sender_public_key,
            recipient_id,
            amount,
            fee,
            signature: None,
            sign_signature: None,
            asset: Asset::None,
            block_id: None,
            height: 0,
        }
    }

    // A plain payment signed by the sender's keypair
    pub fn new_payment(
        keypair: &Keypair,
        recipient_id: &str,
        amount: u64,
        fee: u64,
        timestamp: u32,
    ) -> Result<Transaction> {
        let mut tx = Transaction::new(
            TransactionType::Send,
            timestamp,
            *keypair.public_key(),
            Some(recipient_id.to_string()),
            amount,
            fee,
        );
        tx.sign(keypair)?;
        Ok(tx)
    }

    pub fn with_type(mut self, tx_type: TransactionType, subtype: u8) -> Transaction {
        self.tx_type = tx_type;
        self.subtype = subtype;
        self
    }

    pub fn with_asset(mut self, asset: Asset) -> Transaction {
        self.asset = asset;
        self
    }

    pub fn get_type(&self) -> TransactionType {
        self.tx_type
    }

    pub fn get_subtype(&self) -> u8 {
        self.subtype
    }

    pub fn get_timestamp(&self) -> u32 {
        self.timestamp
    }

    pub fn get_sender_public_key(&self) -> &[u8; PUBLIC_KEY_LENGTH] {
        &self.sender_public_key
    }

    pub fn get_recipient_id(&self) -> Option<&str> {
        self.recipient_id.as_deref()
    }

    pub fn get_amount(&self) -> u64 {
        self.amount
    }

    pub fn get_fee(&self) -> u64 {
        self.fee
    }

    pub fn get_signature(&self) -> Option<&[u8; SIGNATURE_LENGTH]> {
        self.signature.as_ref()
    }

    pub fn get_sign_signature(&self) -> Option<&[u8; SIGNATURE_LENGTH]> {
        self.sign_signature.as_ref()
    }

    pub fn get_asset(&self) -> &Asset {
        &self.asset
    }

    pub fn get_block_id(&self) -> Option<&str> {
        self.block_id.as_deref()
    }

    pub fn get_height(&self) -> u64 {
        self.height
    }

    /// Recorded once the containing block is accepted
    pub(crate) fn set_inclusion(&mut self, block_id: &str, height: u64) {
        self.block_id = Some(block_id.to_string());
        self.height = height;
    }

    #[cfg(test)]
    pub(crate) fn set_signatures(
        &mut self,
        signature: Option<[u8; SIGNATURE_LENGTH]>,
        sign_signature: Option<[u8; SIGNATURE_LENGTH]>,
    ) {
        self.signature = signature;
        self.sign_signature = sign_signature;
    }

    pub fn get_bytes(&self) -> Result<Vec<u8>> {
        encode_transaction(self)
    }

    pub fn get_size(&self) -> Result<usize> {
        Ok(self.get_bytes()?.len())
    }

    pub fn get_hash(&self) -> Result<[u8; HASH_LENGTH]> {
        Ok(sha256_digest(&self.get_bytes()?))
    }

    /// Derived from the hash on first call. Changing fields afterwards
    /// does not change the id.
    pub fn get_id(&self) -> Result<&str> {
        self.id
            .get_or_try_init(|| self.get_hash().map(|hash| derive_id(&hash)))
            .map(String::as_str)
    }

    /// Whether the id this transaction carries is the one its bytes derive to
    pub fn verify_id(&self) -> Result<bool> {
        Ok(self.get_id()? == derive_id(&self.get_hash()?))
    }

    fn signature_count(&self) -> usize {
        self.signature.iter().count() + self.sign_signature.iter().count()
    }

    // Hash of the pre-image with both signatures left out
    fn unsigned_hash(&self) -> Result<[u8; HASH_LENGTH]> {
        let bytes = strip_signatures(self.get_bytes()?, self.signature_count())?;
        Ok(sha256_digest(&bytes))
    }

    /// Fill `signature`. Any second signature is dropped since it would
    /// no longer cover the new first signature.
    pub fn sign(&mut self, keypair: &Keypair) -> Result<()> {
        let hash = self.unsigned_hash()?;
        self.signature = Some(ed25519_sign(&hash, keypair));
        self.sign_signature = None;
        Ok(())
    }

    /// Fill `sign_signature` over the pre-image that includes the first signature
    pub fn sign_second(&mut self, keypair: &Keypair) -> Result<()> {
        if self.signature.is_none() {
            return Err(LedgerError::InvalidTransaction(
                "Second signature requires a first signature".to_string(),
            ));
        }
        self.sign_signature = None;
        let hash = self.get_hash()?;
        self.sign_signature = Some(ed25519_sign(&hash, keypair));
        Ok(())
    }

    pub fn verify(&self) -> bool {
        let Some(signature) = self.signature.as_ref() else {
            return false;
        };
        match self.unsigned_hash() {
            Ok(hash) => ed25519_verify(&hash, signature, &self.sender_public_key),
            Err(_) => false,
        }
    }

    pub fn verify_second_signature(&self, public_key: &[u8]) -> bool {
        let Some(sign_signature) = self.sign_signature.as_ref() else {
            return false;
        };
        let bytes = match self.get_bytes().and_then(|b| strip_signatures(b, 1)) {
            Ok(bytes) => bytes,
            Err(_) => return false,
        };
        ed25519_verify(&sha256_digest(&bytes), sign_signature, public_key)
    }

    pub fn to_json(&self) -> Result<TransactionJson> {
        Ok(TransactionJson {
            id: self.get_id()?.to_string(),
            tx_type: self.tx_type.as_u8(),
            subtype: self.subtype,
            timestamp: self.timestamp,
            sender_public_key: self.sender_public_key,
            recipient_id: self.recipient_id.clone(),
            amount: self.amount,
            fee: self.fee,
            signature: self.signature,
            sign_signature: self.sign_signature,
            asset: if self.asset.is_none() {
                None
            } else {
                Some(self.asset.clone())
            },
            block_id: self.block_id.clone(),
            height: self.height,
        })
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.to_json()?)?)
    }

    pub fn from_json_str(json: &str) -> Result<Transaction> {
        let projection: TransactionJson = serde_json::from_str(json)?;
        Ok(Transaction::from(projection))
    }
}

/// External projection: binary fields as hex strings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionJson {
    pub id: String,
    #[serde(rename = "type")]
    pub tx_type: u8,
    #[serde(default)]
    pub subtype: u8,
    pub timestamp: u32,
    #[serde(with = "hex_bytes")]
    pub sender_public_key: [u8; PUBLIC_KEY_LENGTH],
    #[serde(default)]
    pub recipient_id: Option<String>,
    pub amount: u64,
    pub fee: u64,
    #[serde(with = "hex_bytes_opt", default)]
    pub signature: Option<[u8; SIGNATURE_LENGTH]>,
    #[serde(
        with = "hex_bytes_opt",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub sign_signature: Option<[u8; SIGNATURE_LENGTH]>,
    #[serde(default)]
    pub asset: Option<Asset>,
    #[serde(default)]
    pub block_id: Option<String>,
    #[serde(default)]
    pub height: u64,
}

impl From<TransactionJson> for Transaction {
    /// The published id is kept as is; `verify_id` tells whether it matches
    fn from(json: TransactionJson) -> Self {
        Transaction {
            id: OnceCell::with_value(json.id),
            tx_type: TransactionType::from(json.tx_type),
            subtype: json.subtype,
            timestamp: json.timestamp,
            sender_public_key: json.sender_public_key,
            recipient_id: json.recipient_id,
            amount: json.amount,
            fee: json.fee,
            signature: json.signature,
            sign_signature: json.sign_signature,
            asset: json.asset.unwrap_or_default(),
            block_id: json.block_id,
            height: json.height,
        }
    }
}
