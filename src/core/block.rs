use crate::core::codec::{encode_block, strip_signatures};
use crate::core::forging::create_generation_signature;
use crate::core::monetary::BLOCK_VERSION;
use crate::core::{AddressRecord, Transaction, TransactionJson};
use crate::error::{LedgerError, Result};
use crate::utils::{
    derive_id, ed25519_sign, ed25519_verify, hex_bytes, hex_bytes_opt, sha256_digest, Keypair,
    HASH_LENGTH, PUBLIC_KEY_LENGTH, SIGNATURE_LENGTH,
};
use log::info;
use num_bigint::BigInt;
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone)]
pub struct Block {
    id: OnceCell<String>,
    version: u32,
    timestamp: u32,
    previous_block: Option<String>, // None only for genesis
    transactions: Vec<Transaction>,
    addresses: Vec<AddressRecord>,
    total_amount: u64,
    total_fee: u64,
    payload_length: u32,
    payload_hash: [u8; HASH_LENGTH],
    generator_public_key: [u8; PUBLIC_KEY_LENGTH],
    generation_signature: [u8; SIGNATURE_LENGTH],
    block_signature: Option<[u8; SIGNATURE_LENGTH]>,
    cumulative_difficulty: Option<BigInt>,
    next_block: Option<String>,
    height: u64,
    base_target: BigInt,
}

/// What the header commits to about the transaction list
#[derive(Debug, Clone, PartialEq, Eq)]
struct PayloadSummary {
    total_amount: u64,
    total_fee: u64,
    length: u32,
    hash: [u8; HASH_LENGTH],
}

impl PayloadSummary {
    fn of(transactions: &[Transaction]) -> Result<PayloadSummary> {
        let mut total_amount: u64 = 0;
        let mut total_fee: u64 = 0;
        let mut payload = Vec::new();
        for tx in transactions {
            total_amount = total_amount.checked_add(tx.get_amount()).ok_or_else(|| {
                LedgerError::InvalidBlock("Total amount overflows u64".to_string())
            })?;
            total_fee = total_fee
                .checked_add(tx.get_fee())
                .ok_or_else(|| LedgerError::InvalidBlock("Total fee overflows u64".to_string()))?;
            payload.extend(tx.get_bytes()?);
        }
        let length = u32::try_from(payload.len()).map_err(|_| {
            LedgerError::InvalidBlock(format!("Payload of {} bytes is too large", payload.len()))
        })?;

        Ok(PayloadSummary {
            total_amount,
            total_fee,
            length,
            hash: sha256_digest(&payload),
        })
    }
}

impl Block {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        version: u32,
        timestamp: u32,
        previous_block: Option<String>,
        transactions: Vec<Transaction>,
        total_amount: u64,
        total_fee: u64,
        payload_length: u32,
        payload_hash: [u8; HASH_LENGTH],
        generator_public_key: [u8; PUBLIC_KEY_LENGTH],
        generation_signature: [u8; SIGNATURE_LENGTH],
    ) -> Block {
        Block {
            id: OnceCell::new(),
            version,
            timestamp,
            previous_block,
            transactions,
            addresses: Vec::new(),
            total_amount,
            total_fee,
            payload_length,
            payload_hash,
            generator_public_key,
            generation_signature,
            block_signature: None,
            cumulative_difficulty: None,
            next_block: None,
            height: 0,
            base_target: BigInt::from(0),
        }
    }

    /// Build and sign a fresh block on top of `previous` (genesis when `None`)
    pub fn forge(
        previous: Option<&Block>,
        timestamp: u32,
        transactions: Vec<Transaction>,
        addresses: Vec<AddressRecord>,
        keypair: &Keypair,
    ) -> Result<Block> {
        let previous_id = previous.map(|b| b.get_id().map(str::to_string)).transpose()?;

        let payload = PayloadSummary::of(&transactions)?;

        let mut block = Block::new(
            BLOCK_VERSION,
            timestamp,
            previous_id,
            transactions,
            payload.total_amount,
            payload.total_fee,
            payload.length,
            payload.hash,
            *keypair.public_key(),
            create_generation_signature(previous, keypair),
        )
        .with_addresses(addresses);

        if let Some(previous) = previous {
            block.set_previous_block(Some(previous))?;
        }
        block.sign(keypair)?;

        info!(
            "Forged block at height {} with {} transactions",
            block.height,
            block.transactions.len()
        );
        Ok(block)
    }

    pub fn with_addresses(mut self, addresses: Vec<AddressRecord>) -> Block {
        self.addresses = addresses;
        self
    }

    pub fn get_version(&self) -> u32 {
        self.version
    }

    pub fn get_timestamp(&self) -> u32 {
        self.timestamp
    }

    pub fn get_previous_block(&self) -> Option<&str> {
        self.previous_block.as_deref()
    }

    pub fn is_genesis(&self) -> bool {
        self.previous_block.is_none()
    }

    pub fn get_transactions(&self) -> &[Transaction] {
        self.transactions.as_slice()
    }

    pub(crate) fn transactions_mut(&mut self) -> &mut [Transaction] {
        self.transactions.as_mut_slice()
    }

    pub fn get_addresses(&self) -> &[AddressRecord] {
        self.addresses.as_slice()
    }

    pub fn get_number_of_transactions(&self) -> usize {
        self.transactions.len()
    }

    pub fn get_number_of_addresses(&self) -> usize {
        self.addresses.len()
    }

    pub fn get_total_amount(&self) -> u64 {
        self.total_amount
    }

    pub fn get_total_fee(&self) -> u64 {
        self.total_fee
    }

    pub fn get_payload_length(&self) -> u32 {
        self.payload_length
    }

    pub fn get_payload_hash(&self) -> &[u8; HASH_LENGTH] {
        &self.payload_hash
    }

    pub fn get_generator_public_key(&self) -> &[u8; PUBLIC_KEY_LENGTH] {
        &self.generator_public_key
    }

    pub fn get_generation_signature(&self) -> &[u8; SIGNATURE_LENGTH] {
        &self.generation_signature
    }

    pub fn get_block_signature(&self) -> Option<&[u8; SIGNATURE_LENGTH]> {
        self.block_signature.as_ref()
    }

    pub fn get_cumulative_difficulty(&self) -> Option<&BigInt> {
        self.cumulative_difficulty.as_ref()
    }

    pub fn get_next_block(&self) -> Option<&str> {
        self.next_block.as_deref()
    }

    pub fn get_height(&self) -> u64 {
        self.height
    }

    pub fn get_base_target(&self) -> &BigInt {
        &self.base_target
    }

    pub(crate) fn set_next_block(&mut self, id: &str) {
        self.next_block = Some(id.to_string());
    }

    pub(crate) fn set_consensus_state(
        &mut self,
        height: u64,
        base_target: BigInt,
        cumulative_difficulty: BigInt,
    ) {
        self.height = height;
        self.base_target = base_target;
        self.cumulative_difficulty = Some(cumulative_difficulty);
    }

    /// Pin the id instead of deriving it. Only the genesis block needs this;
    /// an id that was already derived or pinned differently is a linkage error.
    pub(crate) fn assign_id(&self, id: &str) -> Result<()> {
        let assigned = self.id.get_or_init(|| id.to_string());
        if assigned != id {
            return Err(LedgerError::Linkage(format!(
                "Block already carries id {assigned}, expected {id}"
            )));
        }
        Ok(())
    }

    pub fn get_bytes(&self) -> Result<Vec<u8>> {
        encode_block(self)
    }

    pub fn get_hash(&self) -> Result<[u8; HASH_LENGTH]> {
        Ok(sha256_digest(&self.get_bytes()?))
    }

    pub fn get_id(&self) -> Result<&str> {
        self.id
            .get_or_try_init(|| self.get_hash().map(|hash| derive_id(&hash)))
            .map(String::as_str)
    }

    /// Whether the id this block carries is the one its bytes derive to.
    /// Decoded blocks keep the published id until this is checked.
    pub fn verify_id(&self) -> Result<bool> {
        Ok(self.get_id()? == derive_id(&self.get_hash()?))
    }

    /// Recompute totals, payload length and payload hash from the
    /// transactions and compare them with the signed header
    pub fn verify_payload(&self) -> Result<()> {
        let actual = PayloadSummary::of(&self.transactions)?;
        let declared = PayloadSummary {
            total_amount: self.total_amount,
            total_fee: self.total_fee,
            length: self.payload_length,
            hash: self.payload_hash,
        };
        if actual != declared {
            return Err(LedgerError::InvalidBlock(format!(
                "Header does not match its transactions: declared {declared:?}, computed {actual:?}"
            )));
        }
        Ok(())
    }

    fn unsigned_hash(&self) -> Result<[u8; HASH_LENGTH]> {
        let signatures = usize::from(self.block_signature.is_some());
        let bytes = strip_signatures(self.get_bytes()?, signatures)?;
        Ok(sha256_digest(&bytes))
    }

    pub fn sign(&mut self, keypair: &Keypair) -> Result<()> {
        let hash = self.unsigned_hash()?;
        self.block_signature = Some(ed25519_sign(&hash, keypair));
        Ok(())
    }

    pub fn verify_block_signature(&self) -> bool {
        let Some(signature) = self.block_signature.as_ref() else {
            return false;
        };
        match self.unsigned_hash() {
            Ok(hash) => ed25519_verify(&hash, signature, &self.generator_public_key),
            Err(_) => false,
        }
    }

    /// Check a candidate predecessor against the declared previous block
    /// and take height from it. `None` makes this a height-0 genesis.
    pub fn set_previous_block(&mut self, previous: Option<&Block>) -> Result<()> {
        match previous {
            Some(previous) => {
                if self.previous_block.as_deref() != Some(previous.get_id()?) {
                    return Err(LedgerError::Linkage(
                        "Previous block id not valid".to_string(),
                    ));
                }
                self.height = previous.height + 1;
            }
            None => self.height = 0,
        }
        Ok(())
    }

    pub fn to_json(&self) -> Result<BlockJson> {
        let transactions = self
            .transactions
            .iter()
            .map(Transaction::to_json)
            .collect::<Result<Vec<_>>>()?;

        Ok(BlockJson {
            id: self.get_id()?.to_string(),
            version: self.version,
            timestamp: self.timestamp,
            height: self.height,
            previous_block: self.previous_block.clone(),
            next_block: self.next_block.clone(),
            number_of_transactions: self.transactions.len(),
            number_of_addresses: self.addresses.len(),
            total_amount: self.total_amount,
            total_fee: self.total_fee,
            payload_length: self.payload_length,
            payload_hash: self.payload_hash,
            generator_public_key: self.generator_public_key,
            generation_signature: self.generation_signature,
            block_signature: self.block_signature,
            base_target: self.base_target.to_string(),
            cumulative_difficulty: self.cumulative_difficulty.as_ref().map(BigInt::to_string),
            transactions,
            addresses: self.addresses.clone(),
        })
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.to_json()?)?)
    }

    pub fn from_json_str(json: &str) -> Result<Block> {
        let projection: BlockJson = serde_json::from_str(json)?;
        Block::try_from(projection)
    }
}

/// External projection: binary fields as hex strings, big integers as decimals
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockJson {
    pub id: String,
    pub version: u32,
    pub timestamp: u32,
    #[serde(default)]
    pub height: u64,
    #[serde(default)]
    pub previous_block: Option<String>,
    #[serde(default)]
    pub next_block: Option<String>,
    pub number_of_transactions: usize,
    #[serde(default)]
    pub number_of_addresses: usize,
    pub total_amount: u64,
    pub total_fee: u64,
    pub payload_length: u32,
    #[serde(with = "hex_bytes")]
    pub payload_hash: [u8; HASH_LENGTH],
    #[serde(with = "hex_bytes")]
    pub generator_public_key: [u8; PUBLIC_KEY_LENGTH],
    #[serde(with = "hex_bytes")]
    pub generation_signature: [u8; SIGNATURE_LENGTH],
    #[serde(with = "hex_bytes_opt", default)]
    pub block_signature: Option<[u8; SIGNATURE_LENGTH]>,
    #[serde(default)]
    pub base_target: String,
    #[serde(default)]
    pub cumulative_difficulty: Option<String>,
    #[serde(default)]
    pub transactions: Vec<TransactionJson>,
    #[serde(default)]
    pub addresses: Vec<AddressRecord>,
}

fn parse_big(field: &str, value: &str) -> Result<BigInt> {
    value
        .parse::<BigInt>()
        .map_err(|e| LedgerError::Encoding(format!("{field} is not a decimal integer: {e}")))
}

impl TryFrom<BlockJson> for Block {
    type Error = LedgerError;

    fn try_from(json: BlockJson) -> Result<Block> {
        if json.number_of_transactions != json.transactions.len() {
            return Err(LedgerError::Encoding(format!(
                "numberOfTransactions is {} but {} transactions were supplied",
                json.number_of_transactions,
                json.transactions.len()
            )));
        }
        if json.number_of_addresses != json.addresses.len() {
            return Err(LedgerError::Encoding(format!(
                "numberOfAddresses is {} but {} addresses were supplied",
                json.number_of_addresses,
                json.addresses.len()
            )));
        }

        let base_target = if json.base_target.is_empty() {
            BigInt::from(0)
        } else {
            parse_big("baseTarget", &json.base_target)?
        };
        let cumulative_difficulty = json
            .cumulative_difficulty
            .as_deref()
            .map(|v| parse_big("cumulativeDifficulty", v))
            .transpose()?;

        Ok(Block {
            id: OnceCell::with_value(json.id),
            version: json.version,
            timestamp: json.timestamp,
            previous_block: json.previous_block,
            transactions: json.transactions.into_iter().map(Transaction::from).collect(),
            addresses: json.addresses,
            total_amount: json.total_amount,
            total_fee: json.total_fee,
            payload_length: json.payload_length,
            payload_hash: json.payload_hash,
            generator_public_key: json.generator_public_key,
            generation_signature: json.generation_signature,
            block_signature: json.block_signature,
            cumulative_difficulty,
            next_block: json.next_block,
            height: json.height,
            base_target,
        })
    }
}
