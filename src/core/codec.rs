//! Canonical byte layouts for blocks and transactions
//!
//! These bytes are the pre-image for hashing, ids and signatures, so every
//! node must produce them identically. Integers are little-endian except the
//! two 8-byte identifier slots, which hold the id big-endian. Signatures are
//! appended only when present, in fixed order, so verifiers strip them by
//! truncating 64 bytes per signature from the tail.

use crate::core::asset::asset_size;
use crate::core::{Block, Transaction};
use crate::error::{LedgerError, Result};
use crate::utils::{HASH_LENGTH, PUBLIC_KEY_LENGTH, SIGNATURE_LENGTH};

/// Block pre-image without the trailing block signature
pub const BLOCK_UNSIGNED_SIZE: usize =
    4 + 4 + 8 + 4 + 4 + 8 + 8 + 4 + HASH_LENGTH + PUBLIC_KEY_LENGTH + SIGNATURE_LENGTH;

/// Transaction pre-image without asset or signatures
pub const TRANSACTION_BASE_SIZE: usize = 1 + 1 + 4 + PUBLIC_KEY_LENGTH + 8 + 8 + 8;

/// Parse a decimal block/account id into its numeric form
pub fn parse_id(id: &str) -> Result<u64> {
    id.parse::<u64>()
        .map_err(|e| LedgerError::Encoding(format!("Identifier {id} is not a u64 decimal: {e}")))
}

/// Digits of a recipient id with any single trailing marker letter removed
pub fn strip_marker(recipient_id: &str) -> &str {
    match recipient_id.chars().last() {
        Some(marker) if marker.is_ascii_alphabetic() => &recipient_id[..recipient_id.len() - 1],
        _ => recipient_id,
    }
}

fn put_id_slot(bytes: &mut Vec<u8>, id: Option<u64>) {
    bytes.extend(id.unwrap_or(0).to_be_bytes());
}

// Minimal big-endian bytes of the id, left-aligned and zero-padded on the right
fn put_recipient_slot(bytes: &mut Vec<u8>, id: Option<u64>) {
    let mut slot = [0u8; 8];
    if let Some(id) = id {
        let be = id.to_be_bytes();
        let skip = be.iter().take_while(|b| **b == 0).count();
        slot[..8 - skip].copy_from_slice(&be[skip..]);
    }
    bytes.extend(slot);
}

fn count_u32(what: &str, len: usize) -> Result<u32> {
    u32::try_from(len)
        .map_err(|_| LedgerError::Encoding(format!("Too many {what} to encode: {len}")))
}

pub fn encode_block(block: &Block) -> Result<Vec<u8>> {
    let previous = block.get_previous_block().map(parse_id).transpose()?;

    let mut bytes = Vec::with_capacity(BLOCK_UNSIGNED_SIZE + SIGNATURE_LENGTH);
    bytes.extend(block.get_version().to_le_bytes());
    bytes.extend(block.get_timestamp().to_le_bytes());
    put_id_slot(&mut bytes, previous);
    bytes.extend(count_u32("addresses", block.get_addresses().len())?.to_le_bytes());
    bytes.extend(count_u32("transactions", block.get_transactions().len())?.to_le_bytes());
    bytes.extend((block.get_total_amount() as f64).to_le_bytes());
    bytes.extend((block.get_total_fee() as f64).to_le_bytes());
    bytes.extend(block.get_payload_length().to_le_bytes());
    bytes.extend_from_slice(block.get_payload_hash());
    bytes.extend_from_slice(block.get_generator_public_key());
    bytes.extend_from_slice(block.get_generation_signature());

    if let Some(signature) = block.get_block_signature() {
        bytes.extend_from_slice(signature);
    }

    Ok(bytes)
}

pub fn encode_transaction(tx: &Transaction) -> Result<Vec<u8>> {
    let recipient = tx
        .get_recipient_id()
        .map(|id| parse_id(strip_marker(id)))
        .transpose()?;
    let asset = tx.get_asset().get_bytes(tx.get_type(), tx.get_subtype())?;

    let mut bytes = Vec::with_capacity(
        TRANSACTION_BASE_SIZE + asset_size(tx.get_type(), tx.get_subtype()) + 2 * SIGNATURE_LENGTH,
    );
    bytes.push(tx.get_type().as_u8());
    bytes.push(tx.get_subtype());
    bytes.extend(tx.get_timestamp().to_le_bytes());
    bytes.extend_from_slice(tx.get_sender_public_key());
    put_recipient_slot(&mut bytes, recipient);
    bytes.extend(tx.get_amount().to_le_bytes());
    bytes.extend(tx.get_fee().to_le_bytes());
    bytes.extend(asset);

    if let Some(signature) = tx.get_signature() {
        bytes.extend_from_slice(signature);
    }
    if let Some(sign_signature) = tx.get_sign_signature() {
        bytes.extend_from_slice(sign_signature);
    }

    Ok(bytes)
}

/// Drop `count` trailing signatures from an encoded entity
pub fn strip_signatures(mut bytes: Vec<u8>, count: usize) -> Result<Vec<u8>> {
    let remove = count * SIGNATURE_LENGTH;
    if bytes.len() < remove {
        return Err(LedgerError::Encoding(format!(
            "Cannot strip {remove} signature bytes from {} encoded bytes",
            bytes.len()
        )));
    }
    bytes.truncate(bytes.len() - remove);
    Ok(bytes)
}
