// Alias/address records. A recipient id ending in the alias suffix names one of
// these instead of an account; the owning account is the record's generator.

use crate::utils::{address_from_public_key, hex_bytes, PUBLIC_KEY_LENGTH};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressRecord {
    pub id: String,
    #[serde(with = "hex_bytes")]
    pub generator_public_key: [u8; PUBLIC_KEY_LENGTH],
    pub timestamp: u32,
}

impl AddressRecord {
    pub fn new(id: &str, generator_public_key: [u8; PUBLIC_KEY_LENGTH], timestamp: u32) -> Self {
        AddressRecord {
            id: id.to_string(),
            generator_public_key,
            timestamp,
        }
    }

    /// Account id that actually receives payments sent to this alias
    pub fn owner_account_id(&self, account_suffix: char) -> String {
        address_from_public_key(&self.generator_public_key, account_suffix)
    }
}
