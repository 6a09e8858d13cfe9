// Generation signatures and stake-weighted forging eligibility.
//
// Every block signs its predecessor's generation signature with the generator
// key, which chains an unpredictable value through the whole history. The
// eligibility check turns that value into a "hit" and compares it against a
// target that grows with stake and with the time since the last block.
// Block acceptance does not consult eligibility; forgers call it to decide
// whether their slot has come up.

use crate::core::Block;
use crate::utils::{ed25519_verify, sha256_digest, Keypair, PUBLIC_KEY_LENGTH, SIGNATURE_LENGTH};
use log::debug;
use num_bigint::BigInt;

/// What a generation signature signs: the predecessor's generation
/// signature, or 64 zero bytes for genesis
pub fn generation_signature_message(previous: Option<&Block>) -> [u8; SIGNATURE_LENGTH] {
    previous
        .map(|block| *block.get_generation_signature())
        .unwrap_or([0u8; SIGNATURE_LENGTH])
}

pub fn create_generation_signature(
    previous: Option<&Block>,
    keypair: &Keypair,
) -> [u8; SIGNATURE_LENGTH] {
    keypair.sign(&generation_signature_message(previous))
}

pub fn verify_generation_signature(block: &Block, previous: Option<&Block>) -> bool {
    ed25519_verify(
        &generation_signature_message(previous),
        block.get_generation_signature(),
        block.get_generator_public_key(),
    )
}

/// First eight bytes of sha256(previous generation signature || generator key),
/// read little-endian
pub fn hit(
    previous_generation_signature: &[u8; SIGNATURE_LENGTH],
    generator_public_key: &[u8; PUBLIC_KEY_LENGTH],
) -> u64 {
    let mut preimage = Vec::with_capacity(SIGNATURE_LENGTH + PUBLIC_KEY_LENGTH);
    preimage.extend_from_slice(previous_generation_signature);
    preimage.extend_from_slice(generator_public_key);
    let hash = sha256_digest(&preimage);

    let mut head = [0u8; 8];
    head.copy_from_slice(&hash[..8]);
    u64::from_le_bytes(head)
}

pub fn target(base_target: &BigInt, effective_balance: u64, elapsed: i64) -> BigInt {
    base_target * BigInt::from(effective_balance) * BigInt::from(elapsed)
}

/// Whether `generator_public_key`, holding `effective_balance`, may forge on
/// top of `previous` at `timestamp`
pub fn is_eligible(
    previous: &Block,
    generator_public_key: &[u8; PUBLIC_KEY_LENGTH],
    effective_balance: u64,
    timestamp: u32,
) -> bool {
    let elapsed = i64::from(timestamp) - i64::from(previous.get_timestamp());
    if effective_balance == 0 || elapsed <= 0 {
        return false;
    }

    let hit = hit(previous.get_generation_signature(), generator_public_key);
    let target = target(previous.get_base_target(), effective_balance, elapsed);
    debug!("Forging check: hit {hit}, target {target}");
    BigInt::from(hit) < target
}
