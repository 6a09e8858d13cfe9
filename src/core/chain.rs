//! Block acceptance
//!
//! `Ledger::accept` is the only way state changes. It checks the block's id
//! and links it to the tip, checks every signature and the payload totals,
//! then applies the generator reward and each transaction in order. All
//! account and alias changes are first worked out against a staging overlay;
//! the repositories are touched only after the whole block has been applied
//! without error, so a rejected block leaves no trace.

use crate::config::ChainConfig;
use crate::core::account::to_signed;
use crate::core::codec::strip_marker;
use crate::core::forging::is_eligible;
use crate::core::{
    Account, AddressRecord, Block, Blockchain, DifficultyAdjustment, Transaction, TransactionType,
};
use crate::error::{LedgerError, Result};
use crate::storage::{AccountRepository, AliasTable, MemoryAccounts, MemoryAliases};
use crate::utils::{address_from_public_key, PUBLIC_KEY_LENGTH};
use log::{debug, error, info, warn};
use num_bigint::BigInt;
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// A working copy of one account for the block being applied
struct StagedAccount {
    account: Account,
    existed: bool,
    initial_balance: i64,
    initial_unconfirmed: i64,
    key_assigned: bool,
}

impl StagedAccount {
    fn new(account: Account, existed: bool) -> Self {
        StagedAccount {
            initial_balance: account.get_balance(),
            initial_unconfirmed: account.get_unconfirmed_balance(),
            account,
            existed,
            key_assigned: false,
        }
    }

    // Net change over the whole block, which may not fit in an i64
    fn balance_delta(&self) -> i128 {
        i128::from(self.account.get_balance()) - i128::from(self.initial_balance)
    }

    fn unconfirmed_delta(&self) -> i128 {
        i128::from(self.account.get_unconfirmed_balance()) - i128::from(self.initial_unconfirmed)
    }
}

/// Account changes of one block, in first-touch order
struct Staging<'a, R: AccountRepository> {
    accounts: &'a R,
    index: HashMap<String, usize>,
    staged: Vec<StagedAccount>,
}

impl<'a, R: AccountRepository> Staging<'a, R> {
    fn new(accounts: &'a R) -> Self {
        Staging {
            accounts,
            index: HashMap::new(),
            staged: Vec::new(),
        }
    }

    // Existing accounts are copied in; unknown ids become empty accounts at `height`
    fn touch(&mut self, id: &str, height: u64) -> &mut StagedAccount {
        let slot = match self.index.get(id) {
            Some(slot) => *slot,
            None => {
                let staged = match self.accounts.get_account(id) {
                    Some(account) => StagedAccount::new(account.clone(), true),
                    None => {
                        debug!("Creating account {id} at height {height}");
                        StagedAccount::new(Account::new(id, height), false)
                    }
                };
                self.staged.push(staged);
                self.index.insert(id.to_string(), self.staged.len() - 1);
                self.staged.len() - 1
            }
        };
        &mut self.staged[slot]
    }

    // Sender and generator accounts learn their public key on first use
    fn register(&mut self, id: &str, public_key: &[u8; PUBLIC_KEY_LENGTH], height: u64) {
        let staged = self.touch(id, height);
        if staged.account.get_public_key().is_none() {
            staged.account.set_public_key(*public_key);
            staged.key_assigned = true;
        }
    }

    // Both balance tracks move together
    fn credit(&mut self, id: &str, amount: i64, height: u64) -> Result<()> {
        let staged = self.touch(id, height);
        staged.account.add_to_balance(amount)?;
        staged.account.add_to_unconfirmed_balance(amount)?;
        Ok(())
    }

    fn into_changes(self) -> Vec<StagedAccount> {
        self.staged
    }
}

/// Feed a net change to `apply` in i64-sized steps. Every intermediate
/// balance lies between the initial and the final one, so no step overflows.
fn apply_delta(mut delta: i128, mut apply: impl FnMut(i64) -> Result<()>) -> Result<()> {
    while delta != 0 {
        let step = delta.clamp(i128::from(i64::MIN), i128::from(i64::MAX));
        apply(step as i64)?;
        delta -= step;
    }
    Ok(())
}

/// Everything a block will change, worked out before anything is written
struct BlockEffects {
    block_id: String,
    height: u64,
    base_target: BigInt,
    cumulative_difficulty: BigInt,
    accounts: Vec<StagedAccount>,
}

pub struct Ledger<R: AccountRepository, A: AliasTable> {
    config: ChainConfig,
    chain: Blockchain,
    accounts: R,
    aliases: A,
}

impl Ledger<MemoryAccounts, MemoryAliases> {
    pub fn in_memory(config: ChainConfig) -> Self {
        Ledger::new(config, MemoryAccounts::new(), MemoryAliases::new())
    }
}

impl<R: AccountRepository, A: AliasTable> Ledger<R, A> {
    pub fn new(config: ChainConfig, accounts: R, aliases: A) -> Self {
        Ledger {
            config,
            chain: Blockchain::new(),
            accounts,
            aliases,
        }
    }

    pub fn config(&self) -> &ChainConfig {
        &self.config
    }

    pub fn chain(&self) -> &Blockchain {
        &self.chain
    }

    pub fn accounts(&self) -> &R {
        &self.accounts
    }

    pub fn aliases(&self) -> &A {
        &self.aliases
    }

    pub fn tip(&self) -> Option<&Block> {
        self.chain.tip()
    }

    pub fn get_block(&self, id: &str) -> Option<&Block> {
        self.chain.get_block(id)
    }

    pub fn get_account(&self, id: &str) -> Option<&Account> {
        self.accounts.get_account(id)
    }

    pub fn get_account_by_public_key(
        &self,
        public_key: &[u8; PUBLIC_KEY_LENGTH],
    ) -> Option<&Account> {
        self.accounts
            .get_account_by_public_key(public_key, self.config.account_suffix)
    }

    /// Whether the holder of `public_key` may forge on top of the tip at `timestamp`
    pub fn can_forge(&self, public_key: &[u8; PUBLIC_KEY_LENGTH], timestamp: u32) -> bool {
        let (Some(tip), Some(account)) = (self.tip(), self.get_account_by_public_key(public_key))
        else {
            return false;
        };
        is_eligible(tip, public_key, account.effective_balance(), timestamp)
    }

    /// Link, verify and apply `block`. On error nothing has changed.
    pub fn accept(&mut self, mut block: Block) -> Result<()> {
        let genesis = block.is_genesis();

        let result = self
            .check(&mut block)
            .and_then(|_| self.stage(&block));
        let effects = match result {
            Ok(effects) => effects,
            Err(e) => {
                if genesis {
                    error!("Genesis block rejected: {e}");
                } else {
                    warn!("Block rejected: {e}");
                }
                return Err(e);
            }
        };

        self.commit(block, effects)
    }

    // Identity, linkage, signatures and payload. Only the block's own
    // fields change here.
    fn check(&self, block: &mut Block) -> Result<()> {
        let previous = block.get_previous_block().map(str::to_string);

        // Genesis gets its id pinned below; everything else must carry the derived one
        if previous.is_some() {
            let id = block.get_id()?;
            if !block.verify_id()? {
                return Err(LedgerError::Encoding(format!(
                    "Block id {id} does not match its contents"
                )));
            }
            if self.chain.block_exists(id) {
                return Err(LedgerError::Linkage(format!(
                    "Block {id} is already in the chain"
                )));
            }
        }

        match (previous, self.chain.tip()) {
            (None, Some(_)) => {
                return Err(LedgerError::Linkage(
                    "Genesis block already accepted".to_string(),
                ))
            }
            (Some(previous), None) => {
                return Err(LedgerError::Linkage(format!(
                    "Cannot link to {previous}: chain has no genesis"
                )))
            }
            (Some(_), Some(tip)) => block.set_previous_block(Some(tip))?,
            (None, None) => {
                block.assign_id(&self.config.genesis_block_id)?;
                block.set_previous_block(None)?;
            }
        }

        if !block.verify_block_signature() {
            return Err(LedgerError::InvalidSignature(
                "Block signature not valid".to_string(),
            ));
        }

        for tx in block.get_transactions() {
            let id = tx.get_id()?;
            if !tx.verify() {
                return Err(LedgerError::InvalidSignature(format!(
                    "Transaction {id} signature not valid"
                )));
            }
            if !tx.verify_id()? {
                return Err(LedgerError::InvalidTransaction(format!(
                    "Transaction id {id} does not match its contents"
                )));
            }
        }

        block.verify_payload()
    }

    fn stage(&self, block: &Block) -> Result<BlockEffects> {
        let (height, base_target, cumulative_difficulty) = match self.chain.tip() {
            None => (
                0,
                DifficultyAdjustment::initial_base_target(&self.config),
                BigInt::from(0),
            ),
            Some(tip) => {
                let base_target = self.chain.next_base_target(&self.config)?;
                let zero = BigInt::from(0);
                let previous = tip.get_cumulative_difficulty().unwrap_or(&zero);
                let cumulative =
                    DifficultyAdjustment::next_cumulative_difficulty(previous, &base_target)?;
                (tip.get_height() + 1, base_target, cumulative)
            }
        };
        // New accounts are stamped with the height the chain had before this block
        let account_height = self.chain.height().unwrap_or(0);

        let staged_aliases = self.check_aliases(block.get_addresses())?;

        let mut staging = Staging::new(&self.accounts);
        let suffix = self.config.account_suffix;

        let generator = block.get_generator_public_key();
        let generator_id = address_from_public_key(generator, suffix);
        staging.register(&generator_id, generator, account_height);
        staging.credit(
            &generator_id,
            to_signed("Total fee", block.get_total_fee())?,
            account_height,
        )?;

        for tx in block.get_transactions() {
            self.apply_transaction(&mut staging, &staged_aliases, tx, account_height)?;
        }

        Ok(BlockEffects {
            block_id: block.get_id()?.to_string(),
            height,
            base_target,
            cumulative_difficulty,
            accounts: staging.into_changes(),
        })
    }

    fn check_aliases<'b>(
        &self,
        records: &'b [AddressRecord],
    ) -> Result<HashMap<&'b str, &'b AddressRecord>> {
        let mut staged = HashMap::new();
        for record in records {
            if self.aliases.get_alias(&record.id).is_some()
                || staged.insert(record.id.as_str(), record).is_some()
            {
                return Err(LedgerError::InvalidBlock(format!(
                    "Alias {} is already registered",
                    record.id
                )));
            }
        }
        Ok(staged)
    }

    fn apply_transaction(
        &self,
        staging: &mut Staging<'_, R>,
        staged_aliases: &HashMap<&str, &AddressRecord>,
        tx: &Transaction,
        height: u64,
    ) -> Result<()> {
        let suffix = self.config.account_suffix;
        let sender = tx.get_sender_public_key();
        let sender_id = address_from_public_key(sender, suffix);

        let spent = tx.get_amount().checked_add(tx.get_fee()).ok_or_else(|| {
            LedgerError::BalanceOverflow("Transaction amount plus fee overflows".to_string())
        })?;
        staging.register(&sender_id, sender, height);
        staging.credit(&sender_id, -to_signed("Amount plus fee", spent)?, height)?;

        let Some(recipient_id) = tx.get_recipient_id() else {
            debug!("Transaction debited {spent} from {sender_id}, no recipient");
            return Ok(());
        };
        staging.touch(recipient_id, height);

        let is_alias = recipient_id.ends_with(self.config.alias_suffix);
        let credited_id = if is_alias {
            let record = staged_aliases
                .get(recipient_id)
                .copied()
                .or_else(|| self.aliases.get_alias(recipient_id))
                .ok_or_else(|| {
                    LedgerError::UnknownAlias(format!(
                        "No alias registered for {}",
                        strip_marker(recipient_id)
                    ))
                })?;
            let owner = record.owner_account_id(suffix);
            staging.touch(&owner, height);
            owner
        } else {
            recipient_id.to_string()
        };

        // Alias targets settle as alias payments whatever their declared type
        let effective_type = if is_alias {
            TransactionType::Signature
        } else {
            tx.get_type()
        };
        let credit = match (effective_type, tx.get_subtype()) {
            (TransactionType::Send, 0) => tx.get_amount(),
            (TransactionType::Signature, 0) => tx
                .get_amount()
                .checked_add(tx.get_fee() / 2)
                .ok_or_else(|| {
                    LedgerError::BalanceOverflow("Alias credit overflows".to_string())
                })?,
            _ => 0,
        };
        if credit > 0 {
            staging.credit(&credited_id, to_signed("Credit", credit)?, height)?;
        }

        debug!("Transaction moved {spent} from {sender_id}, credited {credit} to {credited_id}");
        Ok(())
    }

    fn commit(&mut self, mut block: Block, effects: BlockEffects) -> Result<()> {
        let BlockEffects {
            block_id,
            height,
            base_target,
            cumulative_difficulty,
            accounts,
        } = effects;

        for record in block.get_addresses() {
            self.aliases.add_alias(record.clone())?;
        }

        for staged in accounts {
            let id = staged.account.get_id().to_string();
            if !staged.existed {
                self.accounts.add_account(staged.account)?;
                continue;
            }
            if staged.key_assigned {
                if let Some(public_key) = staged.account.get_public_key() {
                    self.accounts.set_public_key(&id, *public_key)?;
                }
            }
            apply_delta(staged.balance_delta(), |step| {
                self.accounts.add_to_balance(&id, step)
            })?;
            apply_delta(staged.unconfirmed_delta(), |step| {
                self.accounts.add_to_unconfirmed_balance(&id, step)
            })?;
        }

        for tx in block.transactions_mut() {
            tx.set_inclusion(&block_id, height);
        }
        block.set_consensus_state(height, base_target, cumulative_difficulty);

        if let Some(previous) = block.get_previous_block().map(str::to_string) {
            self.chain.set_next_block(&previous, &block_id)?;
        }

        let transactions = block.get_number_of_transactions();
        self.chain.push(block)?;

        info!("Accepted block {block_id} at height {height} with {transactions} transactions");
        Ok(())
    }
}

/// A ledger shared between threads. One write lock spans a whole block
/// acceptance, so readers never observe a half-applied block.
pub struct SharedLedger<R: AccountRepository, A: AliasTable> {
    inner: Arc<RwLock<Ledger<R, A>>>,
}

impl<R: AccountRepository, A: AliasTable> Clone for SharedLedger<R, A> {
    fn clone(&self) -> Self {
        SharedLedger {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<R: AccountRepository, A: AliasTable> SharedLedger<R, A> {
    pub fn new(ledger: Ledger<R, A>) -> Self {
        SharedLedger {
            inner: Arc::new(RwLock::new(ledger)),
        }
    }

    pub fn read(&self) -> Result<RwLockReadGuard<'_, Ledger<R, A>>> {
        self.inner
            .read()
            .map_err(|e| LedgerError::Lock(format!("Ledger read lock poisoned: {e}")))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Ledger<R, A>>> {
        self.inner
            .write()
            .map_err(|e| LedgerError::Lock(format!("Ledger write lock poisoned: {e}")))
    }

    pub fn accept(&self, block: Block) -> Result<()> {
        self.write()?.accept(block)
    }

    pub fn height(&self) -> Result<Option<u64>> {
        Ok(self.read()?.chain().height())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::forging::create_generation_signature;
    use crate::core::monetary::BLOCK_VERSION;
    use crate::testnet::{genesis_block, keypair, payment, test_ledger};
    use crate::utils::{sha256_digest, Keypair};

    fn address(keypair: &Keypair) -> String {
        address_from_public_key(keypair.public_key(), 'C')
    }

    fn balance<R: AccountRepository, A: AliasTable>(ledger: &Ledger<R, A>, id: &str) -> i64 {
        ledger.get_account(id).unwrap().get_balance()
    }

    // An empty genesis that still declares a total fee
    fn genesis_with_fee(forger: &Keypair, total_fee: u64) -> Block {
        Block::new(
            BLOCK_VERSION,
            0,
            None,
            vec![],
            0,
            total_fee,
            0,
            sha256_digest(&[]),
            *forger.public_key(),
            create_generation_signature(None, forger),
        )
    }

    #[test]
    fn test_genesis_credits_generator() {
        let forger = keypair("forger");
        let sender = keypair("sender");
        let mut ledger = test_ledger();
        let fee_only = payment(&sender, "1C", 0, 25, 0);

        ledger.accept(genesis_block(&forger, vec![fee_only])).unwrap();

        let tip = ledger.tip().unwrap();
        assert_eq!(tip.get_id().unwrap(), ledger.config().genesis_block_id);
        assert_eq!(tip.get_height(), 0);
        assert_eq!(tip.get_base_target(), &BigInt::from(153_722_867u64));
        assert_eq!(tip.get_cumulative_difficulty(), Some(&BigInt::from(0)));

        let account = ledger.get_account(&address(&forger)).unwrap();
        assert_eq!(account.get_balance(), 25);
        assert_eq!(account.get_unconfirmed_balance(), 25);
        assert_eq!(account.get_public_key(), Some(forger.public_key()));
        assert_eq!(balance(&ledger, &address(&sender)), -25);
        assert_eq!(ledger.accounts().account_count(), 3);
    }

    #[test]
    fn test_bad_genesis_signature_changes_nothing() {
        let forger = keypair("forger");
        let mut ledger = test_ledger();
        let mut genesis = genesis_with_fee(&forger, 25);
        genesis.sign(&keypair("intruder")).unwrap();

        let result = ledger.accept(genesis);
        assert!(matches!(result, Err(LedgerError::InvalidSignature(_))));
        assert!(ledger.tip().is_none());
        assert_eq!(ledger.accounts().account_count(), 0);
    }

    #[test]
    fn test_payment_moves_balances() {
        let forger = keypair("forger");
        let sender = keypair("sender");
        let recipient = "4242C";
        let mut ledger = test_ledger();

        // genesis hands the sender 1000 through a payment from the forger
        let seed = payment(&forger, &address(&sender), 1_000, 0, 0);
        ledger.accept(genesis_block(&forger, vec![seed])).unwrap();
        assert_eq!(balance(&ledger, &address(&sender)), 1_000);
        assert_eq!(balance(&ledger, &address(&forger)), -1_000);

        let tx = payment(&sender, recipient, 100, 10, 5);
        let block = Block::forge(ledger.tip(), 60, vec![tx], vec![], &forger).unwrap();
        ledger.accept(block).unwrap();

        assert_eq!(balance(&ledger, &address(&sender)), 890);
        assert_eq!(balance(&ledger, recipient), 100);
        // the forger gets the block's fees back
        assert_eq!(balance(&ledger, &address(&forger)), -990);

        let created = ledger.get_account(recipient).unwrap();
        assert_eq!(created.get_height(), 0);
        assert!(created.get_public_key().is_none());

        let tip = ledger.tip().unwrap();
        assert_eq!(tip.get_height(), 1);
        let included = &tip.get_transactions()[0];
        assert_eq!(included.get_block_id(), Some(tip.get_id().unwrap()));
        assert_eq!(included.get_height(), 1);
    }

    #[test]
    fn test_successor_links_and_accumulates() {
        let forger = keypair("forger");
        let mut ledger = test_ledger();
        ledger.accept(genesis_block(&forger, vec![])).unwrap();
        let genesis_id = ledger.tip().unwrap().get_id().unwrap().to_string();

        let block = Block::forge(ledger.tip(), 60, vec![], vec![], &forger).unwrap();
        ledger.accept(block).unwrap();

        let tip = ledger.tip().unwrap();
        let tip_id = tip.get_id().unwrap().to_string();
        let two64 = BigInt::from(1u8) << 64usize;
        let expected = two64 / BigInt::from(153_722_867u64);
        assert_eq!(tip.get_cumulative_difficulty(), Some(&expected));
        assert_eq!(tip.get_base_target(), &BigInt::from(153_722_867u64));
        assert_eq!(
            ledger.get_block(&genesis_id).unwrap().get_next_block(),
            Some(tip_id.as_str())
        );
    }

    #[test]
    fn test_wrong_previous_block_is_rejected() {
        let forger = keypair("forger");
        let mut ledger = test_ledger();
        ledger.accept(genesis_block(&forger, vec![])).unwrap();
        let first = Block::forge(ledger.tip(), 60, vec![], vec![], &forger).unwrap();
        let sibling = Block::forge(ledger.tip(), 61, vec![], vec![], &forger).unwrap();
        ledger.accept(first).unwrap();
        let tip_id = ledger.tip().unwrap().get_id().unwrap().to_string();

        let result = ledger.accept(sibling);
        assert_eq!(
            result,
            Err(LedgerError::Linkage("Previous block id not valid".to_string()))
        );
        assert_eq!(ledger.tip().unwrap().get_id().unwrap(), tip_id);
        assert_eq!(ledger.chain().len(), 2);
    }

    #[test]
    fn test_second_genesis_is_rejected() {
        let forger = keypair("forger");
        let mut ledger = test_ledger();
        ledger.accept(genesis_block(&forger, vec![])).unwrap();
        let again = ledger.accept(genesis_block(&keypair("other"), vec![]));
        assert!(matches!(again, Err(LedgerError::Linkage(_))));
    }

    #[test]
    fn test_orphan_on_empty_chain_is_rejected() {
        let forger = keypair("forger");
        let genesis = genesis_block(&forger, vec![]);
        let child = Block::forge(Some(&genesis), 60, vec![], vec![], &forger).unwrap();

        let mut ledger = test_ledger();
        assert!(matches!(ledger.accept(child), Err(LedgerError::Linkage(_))));
    }

    #[test]
    fn test_alias_payment_credits_owner_with_half_fee() {
        let forger = keypair("forger");
        let sender = keypair("sender");
        let owner = keypair("alias owner");
        let alias = AddressRecord::new("31337D", *owner.public_key(), 0);

        let mut ledger = test_ledger();
        let genesis = Block::forge(None, 0, vec![], vec![alias], &forger).unwrap();
        ledger.accept(genesis).unwrap();
        assert!(ledger.aliases().get_alias("31337D").is_some());

        let tx = payment(&sender, "31337D", 100, 11, 1);
        let block = Block::forge(ledger.tip(), 60, vec![tx], vec![], &forger).unwrap();
        ledger.accept(block).unwrap();

        assert_eq!(balance(&ledger, &address(&owner)), 105);
        assert_eq!(balance(&ledger, &address(&sender)), -111);
        assert_eq!(balance(&ledger, "31337D"), 0);
    }

    #[test]
    fn test_alias_registered_in_same_block_resolves() {
        let forger = keypair("forger");
        let owner = keypair("alias owner");
        let alias = AddressRecord::new("99D", *owner.public_key(), 0);
        let tx = payment(&forger, "99D", 10, 4, 0);

        let mut ledger = test_ledger();
        let genesis = Block::forge(None, 0, vec![tx], vec![alias], &forger).unwrap();
        ledger.accept(genesis).unwrap();

        assert_eq!(balance(&ledger, &address(&owner)), 12);
    }

    #[test]
    fn test_unknown_alias_rolls_back_block() {
        let forger = keypair("forger");
        let sender = keypair("sender");
        let mut ledger = test_ledger();
        ledger.accept(genesis_block(&forger, vec![])).unwrap();
        let accounts_before = ledger.accounts().account_count();

        let good = payment(&sender, "1C", 5, 1, 1);
        let bad = payment(&sender, "404D", 5, 1, 2);
        let block = Block::forge(ledger.tip(), 60, vec![good, bad], vec![], &forger).unwrap();

        assert!(matches!(
            ledger.accept(block),
            Err(LedgerError::UnknownAlias(_))
        ));
        assert_eq!(ledger.accounts().account_count(), accounts_before);
        assert!(ledger.get_account("1C").is_none());
        assert_eq!(balance(&ledger, &address(&forger)), 0);
        assert_eq!(ledger.chain().len(), 1);
    }

    #[test]
    fn test_forged_transaction_signature_is_rejected() {
        let forger = keypair("forger");
        let sender = keypair("sender");
        let mut tx = payment(&sender, "1C", 5, 1, 1);
        tx.set_signatures(Some([7u8; 64]), None);

        let mut ledger = test_ledger();
        let genesis = Block::forge(None, 0, vec![tx], vec![], &forger).unwrap();
        assert!(matches!(
            ledger.accept(genesis),
            Err(LedgerError::InvalidSignature(_))
        ));
        assert_eq!(ledger.accounts().account_count(), 0);
    }

    #[test]
    fn test_unrecognized_type_only_debits() {
        let forger = keypair("forger");
        let sender = keypair("sender");
        let mut vote = Transaction::new(
            TransactionType::Vote,
            1,
            *sender.public_key(),
            Some("77C".to_string()),
            30,
            3,
        );
        vote.sign(&sender).unwrap();

        let mut ledger = test_ledger();
        ledger
            .accept(Block::forge(None, 0, vec![vote], vec![], &forger).unwrap())
            .unwrap();

        assert_eq!(balance(&ledger, &address(&sender)), -33);
        assert_eq!(balance(&ledger, "77C"), 0);
    }

    #[test]
    fn test_duplicate_alias_is_rejected() {
        let forger = keypair("forger");
        let alias = AddressRecord::new("5D", *forger.public_key(), 0);
        let mut ledger = test_ledger();
        ledger
            .accept(Block::forge(None, 0, vec![], vec![alias.clone()], &forger).unwrap())
            .unwrap();

        let block = Block::forge(ledger.tip(), 60, vec![], vec![alias], &forger).unwrap();
        assert!(matches!(
            ledger.accept(block),
            Err(LedgerError::InvalidBlock(_))
        ));
    }

    #[test]
    fn test_can_forge_needs_positive_stake() {
        let forger = keypair("forger");
        let sender = keypair("sender");
        let mut ledger = test_ledger();
        let seed = payment(&forger, &address(&sender), 1_000, 0, 0);
        ledger.accept(genesis_block(&forger, vec![seed])).unwrap();

        // the forger paid out everything and sits below zero
        assert!(!ledger.can_forge(forger.public_key(), u32::MAX));
        assert!(!ledger.can_forge(sender.public_key(), 0));
        assert!(ledger.can_forge(sender.public_key(), u32::MAX));
        assert!(!ledger.can_forge(keypair("nobody").public_key(), u32::MAX));
    }

    #[test]
    fn test_shared_ledger_accepts_under_one_lock() {
        let forger = keypair("forger");
        let shared = SharedLedger::new(test_ledger());
        let reader = shared.clone();

        shared.accept(genesis_block(&forger, vec![])).unwrap();
        let block = {
            let ledger = reader.read().unwrap();
            Block::forge(ledger.tip(), 60, vec![], vec![], &forger).unwrap()
        };
        shared.accept(block).unwrap();

        assert_eq!(reader.height().unwrap(), Some(1));
    }

    // Genesis pays the sender 1000; returns the ledger and the genesis id
    fn funded(
        forger: &Keypair,
        sender: &Keypair,
    ) -> (Ledger<MemoryAccounts, MemoryAliases>, String) {
        let mut ledger = test_ledger();
        let seed = payment(forger, &address(sender), 1_000, 0, 0);
        ledger.accept(genesis_block(forger, vec![seed])).unwrap();
        let genesis_id = ledger.tip().unwrap().get_id().unwrap().to_string();
        (ledger, genesis_id)
    }

    #[test]
    fn test_relabelled_block_changes_nothing() {
        let forger = keypair("forger");
        let sender = keypair("sender");
        let owner = keypair("alias owner");
        let (mut ledger, genesis_id) = funded(&forger, &sender);
        let accounts_before = ledger.accounts().account_count();

        let tx = payment(&sender, "555C", 100, 10, 1);
        let alias = AddressRecord::new("77D", *owner.public_key(), 1);
        let block = Block::forge(ledger.tip(), 60, vec![tx], vec![alias], &forger).unwrap();

        // signed and linked, but published under the genesis id
        let mut projection = block.to_json().unwrap();
        projection.id = genesis_id.clone();
        let relabelled = Block::try_from(projection).unwrap();

        assert!(matches!(
            ledger.accept(relabelled),
            Err(LedgerError::Encoding(_))
        ));
        assert_eq!(balance(&ledger, &address(&sender)), 1_000);
        assert!(ledger.get_account("555C").is_none());
        assert_eq!(ledger.accounts().account_count(), accounts_before);
        assert_eq!(ledger.aliases().alias_count(), 0);
        assert_eq!(ledger.get_block(&genesis_id).unwrap().get_next_block(), None);
        assert_eq!(ledger.chain().len(), 1);

        // the block under its real id still goes in
        ledger.accept(block).unwrap();
        assert_eq!(balance(&ledger, &address(&sender)), 890);
        assert_eq!(ledger.aliases().alias_count(), 1);
    }

    #[test]
    fn test_resubmitted_block_changes_nothing() {
        let forger = keypair("forger");
        let sender = keypair("sender");
        let (mut ledger, _) = funded(&forger, &sender);

        let tx = payment(&sender, "555C", 100, 10, 1);
        let block = Block::forge(ledger.tip(), 60, vec![tx], vec![], &forger).unwrap();
        let again = block.clone();
        let id = block.get_id().unwrap().to_string();
        ledger.accept(block).unwrap();

        assert_eq!(
            ledger.accept(again),
            Err(LedgerError::Linkage(format!("Block {id} is already in the chain")))
        );
        assert_eq!(balance(&ledger, &address(&sender)), 890);
        assert_eq!(balance(&ledger, "555C"), 100);
        assert_eq!(ledger.get_block(&id).unwrap().get_next_block(), None);
        assert_eq!(ledger.chain().len(), 2);
    }

    #[test]
    fn test_swapped_transaction_changes_nothing() {
        let forger = keypair("forger");
        let sender = keypair("sender");
        let owner = keypair("alias owner");
        let (mut ledger, genesis_id) = funded(&forger, &sender);
        let accounts_before = ledger.accounts().account_count();

        let honest = payment(&sender, "1C", 900, 1, 1);
        let alias = AddressRecord::new("78D", *owner.public_key(), 1);
        let block = Block::forge(ledger.tip(), 60, vec![honest], vec![alias], &forger).unwrap();

        // same count, amount and fee, validly signed by the same sender
        let mut projection = block.to_json().unwrap();
        projection.transactions[0] = payment(&sender, "666C", 900, 1, 1).to_json().unwrap();
        let swapped = Block::try_from(projection).unwrap();
        assert!(swapped.verify_block_signature());

        assert!(matches!(
            ledger.accept(swapped),
            Err(LedgerError::InvalidBlock(_))
        ));
        assert!(ledger.get_account("666C").is_none());
        assert!(ledger.get_account("1C").is_none());
        assert_eq!(balance(&ledger, &address(&sender)), 1_000);
        assert_eq!(ledger.accounts().account_count(), accounts_before);
        assert_eq!(ledger.aliases().alias_count(), 0);
        assert_eq!(ledger.get_block(&genesis_id).unwrap().get_next_block(), None);
        assert_eq!(ledger.chain().len(), 1);
    }

    #[test]
    fn test_declared_fee_must_match_transactions() {
        let forger = keypair("forger");
        let sender = keypair("sender");

        let mut genesis = genesis_with_fee(&forger, 25);
        genesis.sign(&forger).unwrap();
        let mut ledger = test_ledger();
        assert!(matches!(
            ledger.accept(genesis),
            Err(LedgerError::InvalidBlock(_))
        ));
        assert!(ledger.tip().is_none());
        assert_eq!(ledger.accounts().account_count(), 0);

        let (mut ledger, genesis_id) = funded(&forger, &sender);
        let forger_before = balance(&ledger, &address(&forger));
        let tip = ledger.tip().unwrap();
        let mut greedy = Block::new(
            BLOCK_VERSION,
            60,
            Some(genesis_id.clone()),
            vec![],
            0,
            500,
            0,
            sha256_digest(&[]),
            *forger.public_key(),
            create_generation_signature(Some(tip), &forger),
        );
        greedy.sign(&forger).unwrap();

        assert!(matches!(
            ledger.accept(greedy),
            Err(LedgerError::InvalidBlock(_))
        ));
        assert_eq!(balance(&ledger, &address(&forger)), forger_before);
        assert_eq!(ledger.get_block(&genesis_id).unwrap().get_next_block(), None);
    }

    #[test]
    fn test_relabelled_transaction_is_rejected() {
        let forger = keypair("forger");
        let sender = keypair("sender");
        let mut projection = payment(&sender, "1C", 5, 1, 1).to_json().unwrap();
        projection.id = "1".to_string();
        let relabelled = Transaction::from(projection);

        let mut ledger = test_ledger();
        let genesis = Block::forge(None, 0, vec![relabelled], vec![], &forger).unwrap();
        assert!(matches!(
            ledger.accept(genesis),
            Err(LedgerError::InvalidTransaction(_))
        ));
        assert_eq!(ledger.accounts().account_count(), 0);
    }

    #[test]
    fn test_apply_delta_steps_through_wide_change() {
        let mut steps = Vec::new();
        apply_delta(i128::from(i64::MAX) + 100, |step| {
            steps.push(step);
            Ok(())
        })
        .unwrap();
        assert_eq!(steps, vec![i64::MAX, 100]);

        apply_delta(0, |_| panic!("zero delta needs no step")).unwrap();
    }

    #[test]
    fn test_block_swing_wider_than_i64_settles() {
        let forger = keypair("forger");
        let whale = keypair("whale");
        let minnow = keypair("minnow");

        let mut debtor = Account::new("9C", 0);
        debtor.add_to_balance(i64::MIN + 10).unwrap();
        debtor.add_to_unconfirmed_balance(i64::MIN + 10).unwrap();
        let mut accounts = MemoryAccounts::new();
        accounts.add_account(debtor).unwrap();
        let mut ledger = Ledger::new(ChainConfig::default(), accounts, MemoryAliases::new());

        // net credit of i64::MAX + 100 in one block
        let transactions = vec![
            payment(&whale, "9C", i64::MAX as u64, 0, 0),
            payment(&minnow, "9C", 100, 0, 1),
        ];
        ledger.accept(genesis_block(&forger, transactions)).unwrap();

        let account = ledger.get_account("9C").unwrap();
        assert_eq!(account.get_balance(), 109);
        assert_eq!(account.get_unconfirmed_balance(), 109);
        assert_eq!(balance(&ledger, &address(&whale)), -i64::MAX);
        assert_eq!(balance(&ledger, &address(&minnow)), -100);
    }
}
