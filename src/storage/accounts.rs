use crate::core::Account;
use crate::error::{LedgerError, Result};
use crate::utils::{address_from_public_key, PUBLIC_KEY_LENGTH};
use std::collections::HashMap;

/// Account state the ledger reads and mutates during block acceptance.
///
/// The ledger does not own persistence; anything that can look accounts up
/// and apply balance deltas can back it.
pub trait AccountRepository {
    /// Get an account by id.
    fn get_account(&self, id: &str) -> Option<&Account>;

    /// Get the account addressed by a public key.
    fn get_account_by_public_key(
        &self,
        public_key: &[u8; PUBLIC_KEY_LENGTH],
        suffix: char,
    ) -> Option<&Account> {
        self.get_account(&address_from_public_key(public_key, suffix))
    }

    /// Check if an account exists.
    fn account_exists(&self, id: &str) -> bool {
        self.get_account(id).is_some()
    }

    /// Insert a new account. Fails if the id is already taken.
    fn add_account(&mut self, account: Account) -> Result<()>;

    fn add_to_balance(&mut self, id: &str, amount: i64) -> Result<()>;

    fn add_to_unconfirmed_balance(&mut self, id: &str, amount: i64) -> Result<()>;

    fn set_public_key(&mut self, id: &str, public_key: [u8; PUBLIC_KEY_LENGTH]) -> Result<()>;

    fn account_count(&self) -> usize;
}

/// ( K -> account id, V => Account )
#[derive(Debug, Default, Clone)]
pub struct MemoryAccounts {
    inner: HashMap<String, Account>,
}

impl MemoryAccounts {
    pub fn new() -> MemoryAccounts {
        MemoryAccounts::default()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Account> {
        self.inner.values()
    }

    fn account_mut(&mut self, id: &str) -> Result<&mut Account> {
        self.inner
            .get_mut(id)
            .ok_or_else(|| LedgerError::InvalidTransaction(format!("Unknown account {id}")))
    }
}

impl AccountRepository for MemoryAccounts {
    fn get_account(&self, id: &str) -> Option<&Account> {
        self.inner.get(id)
    }

    fn add_account(&mut self, account: Account) -> Result<()> {
        if self.inner.contains_key(account.get_id()) {
            return Err(LedgerError::InvalidTransaction(format!(
                "Account {} already exists",
                account.get_id()
            )));
        }
        self.inner.insert(account.get_id().to_string(), account);
        Ok(())
    }

    fn add_to_balance(&mut self, id: &str, amount: i64) -> Result<()> {
        self.account_mut(id)?.add_to_balance(amount)
    }

    fn add_to_unconfirmed_balance(&mut self, id: &str, amount: i64) -> Result<()> {
        self.account_mut(id)?.add_to_unconfirmed_balance(amount)
    }

    fn set_public_key(&mut self, id: &str, public_key: [u8; PUBLIC_KEY_LENGTH]) -> Result<()> {
        self.account_mut(id)?.set_public_key(public_key);
        Ok(())
    }

    fn account_count(&self) -> usize {
        self.inner.len()
    }
}
