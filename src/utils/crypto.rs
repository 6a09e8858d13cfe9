use ring::digest::{Context, SHA256};
use ring::signature::{Ed25519KeyPair, KeyPair, UnparsedPublicKey, ED25519};
use zeroize::Zeroizing;

use crate::error::{LedgerError, Result};

pub const PUBLIC_KEY_LENGTH: usize = 32;
pub const SIGNATURE_LENGTH: usize = 64;
pub const HASH_LENGTH: usize = 32;

pub fn sha256_digest(data: &[u8]) -> [u8; HASH_LENGTH] {
    let mut context = Context::new(&SHA256);
    context.update(data);
    let digest = context.finish();
    let mut out = [0u8; HASH_LENGTH];
    out.copy_from_slice(digest.as_ref());
    out
}

/// An ed25519 keypair seeded from the SHA-256 of a secret phrase.
pub struct Keypair {
    inner: Ed25519KeyPair,
    public_key: [u8; PUBLIC_KEY_LENGTH],
}

impl Keypair {
    pub fn public_key(&self) -> &[u8; PUBLIC_KEY_LENGTH] {
        &self.public_key
    }

    pub fn sign(&self, message: &[u8]) -> [u8; SIGNATURE_LENGTH] {
        let mut out = [0u8; SIGNATURE_LENGTH];
        out.copy_from_slice(self.inner.sign(message).as_ref());
        out
    }
}

impl std::fmt::Debug for Keypair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Keypair")
            .field("public_key", &data_encoding::HEXLOWER.encode(&self.public_key))
            .finish()
    }
}

/// Same phrase, same keypair. The seed never outlives this call.
pub fn derive_keypair(secret_phrase: &str) -> Result<Keypair> {
    let seed = Zeroizing::new(sha256_digest(secret_phrase.as_bytes()));
    let inner = Ed25519KeyPair::from_seed_unchecked(&seed[..])
        .map_err(|e| LedgerError::Crypto(format!("Failed to derive ed25519 key pair: {e}")))?;

    let mut public_key = [0u8; PUBLIC_KEY_LENGTH];
    public_key.copy_from_slice(inner.public_key().as_ref());
    Ok(Keypair { inner, public_key })
}

pub fn ed25519_sign(hash: &[u8; HASH_LENGTH], keypair: &Keypair) -> [u8; SIGNATURE_LENGTH] {
    keypair.sign(hash)
}

/// Never errors: wrong lengths and bad signatures are both just `false`.
pub fn ed25519_verify(message: &[u8], signature: &[u8], public_key: &[u8]) -> bool {
    if signature.len() != SIGNATURE_LENGTH || public_key.len() != PUBLIC_KEY_LENGTH {
        return false;
    }
    let peer_public_key = UnparsedPublicKey::new(&ED25519, public_key);
    peer_public_key.verify(message, signature).is_ok()
}

/// First 8 digest bytes, byte-reversed and read as an unsigned big-endian
/// integer, rendered in base 10.
pub fn derive_id(hash: &[u8; HASH_LENGTH]) -> String {
    let mut low = [0u8; 8];
    low.copy_from_slice(&hash[..8]);
    u64::from_le_bytes(low).to_string()
}

/// Account address of a public key: the derived id plus the account suffix.
pub fn address_from_public_key(public_key: &[u8; PUBLIC_KEY_LENGTH], suffix: char) -> String {
    let mut address = derive_id(&sha256_digest(public_key));
    address.push(suffix);
    address
}
