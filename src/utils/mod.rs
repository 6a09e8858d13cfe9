//! Utility functions and helpers
//!
//! Hashing, ed25519 key handling, identifier derivation and the hex
//! helpers used by the JSON projection.

pub mod crypto;
pub mod serialization;

pub use crypto::{
    address_from_public_key, derive_id, derive_keypair, ed25519_sign, ed25519_verify,
    sha256_digest, Keypair, HASH_LENGTH, PUBLIC_KEY_LENGTH, SIGNATURE_LENGTH,
};

pub use serialization::{decode_fixed, hex_bytes, hex_bytes_opt, hex_encode};
