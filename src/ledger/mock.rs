//! Mock token ledger for testing.

use super::traits::*;
use crate::types::{Address, Amount, SnapshotId};
use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex};

/// In-memory token ledger with snapshots and failure injection.
#[derive(Clone, Default)]
pub struct MockTokenLedger {
    state: Arc<Mutex<MockState>>,
}

#[derive(Default)]
struct MockState {
    balances: BTreeMap<Address, Amount>,
    snapshots: Vec<BTreeMap<Address, Amount>>,
    /// Per-snapshot voting power overrides (set explicitly by tests).
    power_overrides: BTreeMap<(SnapshotId, Address), Amount>,
    frozen_senders: BTreeSet<Address>,
    reject_supply_changes: bool,
}

impl MockTokenLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a live balance (for test setup).
    pub fn set_balance(&self, account: Address, amount: Amount) {
        let mut s = self.state.lock().unwrap();
        s.balances.insert(account, amount);
    }

    /// Force the voting power reported for `voter` at `snapshot`.
    pub fn set_voting_power(&self, snapshot: SnapshotId, voter: Address, amount: Amount) {
        let mut s = self.state.lock().unwrap();
        s.power_overrides.insert((snapshot, voter), amount);
    }

    /// Make every transfer out of `account` fail.
    pub fn freeze(&self, account: Address) {
        let mut s = self.state.lock().unwrap();
        s.frozen_senders.insert(account);
    }

    pub fn unfreeze(&self, account: &Address) {
        let mut s = self.state.lock().unwrap();
        s.frozen_senders.remove(account);
    }

    /// Make mint and burn fail.
    pub fn reject_supply_changes(&self, reject: bool) {
        let mut s = self.state.lock().unwrap();
        s.reject_supply_changes = reject;
    }

    /// Live balance without going through the async trait.
    pub fn balance(&self, account: &Address) -> Amount {
        let s = self.state.lock().unwrap();
        s.balances.get(account).copied().unwrap_or(0)
    }
}

#[async_trait]
impl TokenLedger for MockTokenLedger {
    async fn voting_power(&self, voter: &Address, snapshot: SnapshotId) -> LedgerResult<Amount> {
        let s = self.state.lock().unwrap();
        if let Some(power) = s.power_overrides.get(&(snapshot, *voter)) {
            return Ok(*power);
        }
        let frozen = s
            .snapshots
            .get(snapshot.0 as usize)
            .ok_or(LedgerError::UnknownSnapshot(snapshot))?;
        Ok(frozen.get(voter).copied().unwrap_or(0))
    }

    async fn balance_of(&self, account: &Address) -> LedgerResult<Amount> {
        Ok(self.balance(account))
    }

    async fn new_snapshot(&self) -> LedgerResult<SnapshotId> {
        let mut s = self.state.lock().unwrap();
        let frozen = s.balances.clone();
        s.snapshots.push(frozen);
        Ok(SnapshotId(s.snapshots.len() as u64 - 1))
    }

    async fn transfer(&self, from: &Address, to: &Address, amount: Amount) -> LedgerResult<()> {
        let mut s = self.state.lock().unwrap();
        if s.frozen_senders.contains(from) {
            return Err(LedgerError::Rejected(format!("account {} is frozen", from)));
        }
        let available = s.balances.get(from).copied().unwrap_or(0);
        if available < amount {
            return Err(LedgerError::InsufficientBalance {
                available,
                required: amount,
            });
        }
        s.balances.insert(*from, available - amount);
        *s.balances.entry(*to).or_insert(0) += amount;
        Ok(())
    }

    async fn mint(&self, to: &Address, amount: Amount) -> LedgerResult<()> {
        let mut s = self.state.lock().unwrap();
        if s.reject_supply_changes {
            return Err(LedgerError::Rejected("minting disabled".to_string()));
        }
        *s.balances.entry(*to).or_insert(0) += amount;
        Ok(())
    }

    async fn burn(&self, from: &Address, amount: Amount) -> LedgerResult<()> {
        let mut s = self.state.lock().unwrap();
        if s.reject_supply_changes {
            return Err(LedgerError::Rejected("burning disabled".to_string()));
        }
        let available = s.balances.get(from).copied().unwrap_or(0);
        if available < amount {
            return Err(LedgerError::InsufficientBalance {
                available,
                required: amount,
            });
        }
        s.balances.insert(*from, available - amount);
        Ok(())
    }
}
