// The accepted chain: every block by id plus a pointer to the tip.
// Blocks only get in through the ledger, which has already linked them,
// so the index itself never has to re-check linkage.

use crate::config::ChainConfig;
use crate::core::{Block, DifficultyAdjustment};
use crate::error::{LedgerError, Result};
use num_bigint::BigInt;
use std::collections::HashMap;

#[derive(Debug, Default, Clone)]
pub struct Blockchain {
    blocks: HashMap<String, Block>,
    tip_id: Option<String>,
    genesis_id: Option<String>,
}

impl Blockchain {
    pub fn new() -> Blockchain {
        Blockchain::default()
    }

    pub fn get_block(&self, id: &str) -> Option<&Block> {
        self.blocks.get(id)
    }

    pub fn block_exists(&self, id: &str) -> bool {
        self.blocks.contains_key(id)
    }

    pub fn tip(&self) -> Option<&Block> {
        self.tip_id.as_deref().and_then(|id| self.blocks.get(id))
    }

    pub fn tip_id(&self) -> Option<&str> {
        self.tip_id.as_deref()
    }

    pub fn genesis_id(&self) -> Option<&str> {
        self.genesis_id.as_deref()
    }

    /// Height of the tip, `None` before genesis
    pub fn height(&self) -> Option<u64> {
        self.tip().map(Block::get_height)
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Base target for the block that will extend the current tip.
    /// A genesis tip hands its own base target on unchanged; otherwise the
    /// tip's predecessor is retargeted by the gap between the two.
    pub fn next_base_target(&self, config: &ChainConfig) -> Result<BigInt> {
        let tip = self
            .tip()
            .ok_or_else(|| LedgerError::Linkage("Chain has no tip".to_string()))?;

        let Some(previous_id) = tip.get_previous_block() else {
            return Ok(tip.get_base_target().clone());
        };
        let previous = self.get_block(previous_id).ok_or_else(|| {
            LedgerError::Linkage(format!("Predecessor {previous_id} of the tip is missing"))
        })?;

        let elapsed = i64::from(tip.get_timestamp()) - i64::from(previous.get_timestamp());
        Ok(DifficultyAdjustment::next_base_target(
            previous.get_base_target(),
            elapsed,
            config,
        ))
    }

    pub(crate) fn set_next_block(&mut self, id: &str, next_id: &str) -> Result<()> {
        let block = self
            .blocks
            .get_mut(id)
            .ok_or_else(|| LedgerError::Linkage(format!("Block {id} is not in the chain")))?;
        block.set_next_block(next_id);
        Ok(())
    }

    /// Store an accepted block and make it the tip
    pub(crate) fn push(&mut self, block: Block) -> Result<()> {
        let id = block.get_id()?.to_string();
        if self.blocks.contains_key(&id) {
            return Err(LedgerError::Linkage(format!("Block {id} is already in the chain")));
        }
        if block.is_genesis() {
            self.genesis_id = Some(id.clone());
        }
        self.blocks.insert(id.clone(), block);
        self.tip_id = Some(id);
        Ok(())
    }

    /// Walk from the tip back to genesis
    pub fn iter(&self) -> BlockchainIterator<'_> {
        BlockchainIterator {
            chain: self,
            current_id: self.tip_id.clone(),
        }
    }
}

pub struct BlockchainIterator<'a> {
    chain: &'a Blockchain,
    current_id: Option<String>,
}

impl<'a> Iterator for BlockchainIterator<'a> {
    type Item = &'a Block;

    fn next(&mut self) -> Option<Self::Item> {
        let block = self.chain.get_block(self.current_id.as_deref()?)?;
        self.current_id = block.get_previous_block().map(str::to_string);
        Some(block)
    }
}
