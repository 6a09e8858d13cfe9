// Account state touched by block acceptance. Balances are signed: the genesis
// generator funds the initial distribution and legitimately goes negative.

use crate::error::{LedgerError, Result};
use crate::utils::PUBLIC_KEY_LENGTH;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    id: String,
    #[serde(with = "crate::utils::hex_bytes_opt", default)]
    public_key: Option<[u8; PUBLIC_KEY_LENGTH]>,
    balance: i64,
    unconfirmed_balance: i64,
    height: u64, // Chain height when the account first appeared
}

impl Account {
    pub fn new(id: &str, height: u64) -> Account {
        Account {
            id: id.to_string(),
            public_key: None,
            balance: 0,
            unconfirmed_balance: 0,
            height,
        }
    }

    pub fn with_public_key(mut self, public_key: [u8; PUBLIC_KEY_LENGTH]) -> Account {
        self.public_key = Some(public_key);
        self
    }

    pub fn get_id(&self) -> &str {
        self.id.as_str()
    }

    pub fn get_public_key(&self) -> Option<&[u8; PUBLIC_KEY_LENGTH]> {
        self.public_key.as_ref()
    }

    pub fn set_public_key(&mut self, public_key: [u8; PUBLIC_KEY_LENGTH]) {
        self.public_key = Some(public_key);
    }

    pub fn get_balance(&self) -> i64 {
        self.balance
    }

    pub fn get_unconfirmed_balance(&self) -> i64 {
        self.unconfirmed_balance
    }

    pub fn get_height(&self) -> u64 {
        self.height
    }

    pub fn add_to_balance(&mut self, amount: i64) -> Result<()> {
        self.balance = checked_add(&self.id, self.balance, amount)?;
        Ok(())
    }

    pub fn add_to_unconfirmed_balance(&mut self, amount: i64) -> Result<()> {
        self.unconfirmed_balance = checked_add(&self.id, self.unconfirmed_balance, amount)?;
        Ok(())
    }

    /// Stake weight for forging: the confirmed balance, never below zero
    pub fn effective_balance(&self) -> u64 {
        u64::try_from(self.balance).unwrap_or(0)
    }
}

fn checked_add(id: &str, balance: i64, amount: i64) -> Result<i64> {
    balance.checked_add(amount).ok_or_else(|| {
        LedgerError::BalanceOverflow(format!("Account {id}: {balance} + {amount} overflows"))
    })
}

/// Widen a u64 ledger amount into signed balance arithmetic
pub fn to_signed(what: &str, amount: u64) -> Result<i64> {
    i64::try_from(amount)
        .map_err(|_| LedgerError::BalanceOverflow(format!("{what} {amount} exceeds i64")))
}
