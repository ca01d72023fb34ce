use std::collections::HashMap;

use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::pubkey::Pubkey;

use crate::error::EngineError;

/// Read access to position balances. Unseen keys read as zero.
pub trait LedgerRead {
    fn deposited(&self, user: &Pubkey, asset: &Pubkey) -> u128;
    fn minted(&self, user: &Pubkey) -> u128;
}

/// Committed per-user collateral and debt balances.
///
/// Only the engine writes here, and only by applying the changes of a
/// [`StagedLedger`] once an operation has fully succeeded.
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct PositionLedger {
    /// Deposited collateral keyed by (user, asset), asset-native precision
    deposited: HashMap<(Pubkey, Pubkey), u128>,

    /// Minted debt per user, 18 decimals
    minted: HashMap<Pubkey, u128>,

    /// Collateral held in custody per asset
    total_deposited: HashMap<Pubkey, u128>,

    /// Outstanding debt across all users
    total_minted: u128,
}

/// Snapshot of a single user's balances.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Position {
    pub owner: Pubkey,
    /// (asset, amount) in registry order, including zero balances
    pub collateral: Vec<(Pubkey, u128)>,
    pub debt: u128,
}

impl Position {
    /// A position with no collateral and no debt does not exist.
    pub fn is_empty(&self) -> bool {
        self.debt == 0 && self.collateral.iter().all(|(_, amount)| *amount == 0)
    }
}

impl LedgerRead for PositionLedger {
    fn deposited(&self, user: &Pubkey, asset: &Pubkey) -> u128 {
        self.deposited.get(&(*user, *asset)).copied().unwrap_or(0)
    }

    fn minted(&self, user: &Pubkey) -> u128 {
        self.minted.get(user).copied().unwrap_or(0)
    }
}

impl PositionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn total_deposited(&self, asset: &Pubkey) -> u128 {
        self.total_deposited.get(asset).copied().unwrap_or(0)
    }

    pub fn total_minted(&self) -> u128 {
        self.total_minted
    }

    pub fn position<'a>(&self, owner: &Pubkey, assets: impl Iterator<Item = &'a Pubkey>) -> Position {
        Position {
            owner: *owner,
            collateral: assets
                .map(|asset| (*asset, self.deposited(owner, asset)))
                .collect(),
            debt: self.minted(owner),
        }
    }

    /// Start staging changes on top of the committed balances.
    pub fn stage(&self) -> StagedLedger<'_> {
        StagedLedger {
            base: self,
            changes: LedgerChanges::default(),
        }
    }

    /// Resolve staged balances into a commit, computing the new aggregate
    /// totals. Nothing is written, so a failure here leaves the ledger as is.
    pub fn prepare(&self, changes: LedgerChanges) -> Result<PreparedCommit, EngineError> {
        let mut totals: HashMap<Pubkey, u128> = HashMap::new();
        for ((user, asset), amount) in &changes.deposited {
            let total = totals
                .get(asset)
                .copied()
                .unwrap_or_else(|| self.total_deposited(asset));
            let total = total
                .checked_sub(self.deposited(user, asset))
                .and_then(|t| t.checked_add(*amount))
                .ok_or(EngineError::ArithmeticOverflow)?;
            totals.insert(*asset, total);
        }

        let mut total_minted = self.total_minted;
        for (user, amount) in &changes.minted {
            total_minted = total_minted
                .checked_sub(self.minted(user))
                .and_then(|t| t.checked_add(*amount))
                .ok_or(EngineError::ArithmeticOverflow)?;
        }

        Ok(PreparedCommit {
            changes,
            total_deposited: totals,
            total_minted,
        })
    }

    pub fn commit(&mut self, prepared: PreparedCommit) {
        for (key, amount) in prepared.changes.deposited {
            set_or_clear(&mut self.deposited, key, amount);
        }
        for (user, amount) in prepared.changes.minted {
            set_or_clear(&mut self.minted, user, amount);
        }
        for (asset, total) in prepared.total_deposited {
            set_or_clear(&mut self.total_deposited, asset, total);
        }
        self.total_minted = prepared.total_minted;
    }

    pub fn apply(&mut self, changes: LedgerChanges) -> Result<(), EngineError> {
        let prepared = self.prepare(changes)?;
        self.commit(prepared);
        Ok(())
    }
}

// Zero entries are dropped so an emptied position leaves nothing behind.
fn set_or_clear<K: std::hash::Hash + Eq>(map: &mut HashMap<K, u128>, key: K, amount: u128) {
    if amount == 0 {
        map.remove(&key);
    } else {
        map.insert(key, amount);
    }
}

/// Balances written during one operation, not yet committed.
#[derive(Debug, Clone, Default)]
pub struct LedgerChanges {
    deposited: HashMap<(Pubkey, Pubkey), u128>,
    minted: HashMap<Pubkey, u128>,
}

/// Staged balances with their aggregate totals already resolved.
#[derive(Debug)]
pub struct PreparedCommit {
    changes: LedgerChanges,
    total_deposited: HashMap<Pubkey, u128>,
    total_minted: u128,
}

/// Working view used by a single operation: reads fall through to the
/// committed ledger, writes stay local until [`PositionLedger::commit`].
#[derive(Debug)]
pub struct StagedLedger<'a> {
    base: &'a PositionLedger,
    changes: LedgerChanges,
}

impl<'a> LedgerRead for StagedLedger<'a> {
    fn deposited(&self, user: &Pubkey, asset: &Pubkey) -> u128 {
        match self.changes.deposited.get(&(*user, *asset)) {
            Some(amount) => *amount,
            None => self.base.deposited(user, asset),
        }
    }

    fn minted(&self, user: &Pubkey) -> u128 {
        match self.changes.minted.get(user) {
            Some(amount) => *amount,
            None => self.base.minted(user),
        }
    }
}

impl<'a> StagedLedger<'a> {
    pub fn credit_collateral(
        &mut self,
        user: &Pubkey,
        asset: &Pubkey,
        amount: u128,
    ) -> Result<(), EngineError> {
        let balance = self
            .deposited(user, asset)
            .checked_add(amount)
            .ok_or(EngineError::ArithmeticOverflow)?;
        self.changes.deposited.insert((*user, *asset), balance);
        Ok(())
    }

    pub fn debit_collateral(
        &mut self,
        user: &Pubkey,
        asset: &Pubkey,
        amount: u128,
    ) -> Result<(), EngineError> {
        let balance = self
            .deposited(user, asset)
            .checked_sub(amount)
            .ok_or(EngineError::InsufficientCollateral)?;
        self.changes.deposited.insert((*user, *asset), balance);
        Ok(())
    }

    pub fn add_debt(&mut self, user: &Pubkey, amount: u128) -> Result<(), EngineError> {
        let balance = self
            .minted(user)
            .checked_add(amount)
            .ok_or(EngineError::ArithmeticOverflow)?;
        self.changes.minted.insert(*user, balance);
        Ok(())
    }

    pub fn remove_debt(&mut self, user: &Pubkey, amount: u128) -> Result<(), EngineError> {
        let balance = self
            .minted(user)
            .checked_sub(amount)
            .ok_or(EngineError::ArithmeticOverflow)?;
        self.changes.minted.insert(*user, balance);
        Ok(())
    }

    pub fn into_changes(self) -> LedgerChanges {
        self.changes
    }
}
