use crate::core::AddressRecord;
use crate::error::{LedgerError, Result};
use std::collections::HashMap;

/// Registered alias/address records, keyed by alias id
pub trait AliasTable {
    fn get_alias(&self, id: &str) -> Option<&AddressRecord>;

    /// Register a record. Ids are unique.
    fn add_alias(&mut self, record: AddressRecord) -> Result<()>;

    fn alias_count(&self) -> usize;
}

#[derive(Debug, Default, Clone)]
pub struct MemoryAliases {
    inner: HashMap<String, AddressRecord>,
}

impl MemoryAliases {
    pub fn new() -> MemoryAliases {
        MemoryAliases::default()
    }
}

impl AliasTable for MemoryAliases {
    fn get_alias(&self, id: &str) -> Option<&AddressRecord> {
        self.inner.get(id)
    }

    fn add_alias(&mut self, record: AddressRecord) -> Result<()> {
        if self.inner.contains_key(&record.id) {
            return Err(LedgerError::InvalidBlock(format!(
                "Alias {} is already registered",
                record.id
            )));
        }
        self.inner.insert(record.id.clone(), record);
        Ok(())
    }

    fn alias_count(&self) -> usize {
        self.inner.len()
    }
}
