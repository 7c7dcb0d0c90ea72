//! Mock treasury for testing.

use super::traits::*;
use crate::types::{Address, Amount};
use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex};

/// In-memory treasury that records every outbound effect.
#[derive(Clone, Default)]
pub struct MockTreasury {
    state: Arc<Mutex<MockState>>,
}

#[derive(Default)]
struct MockState {
    native: Amount,
    native_sent: BTreeMap<Address, Amount>,
    external: BTreeMap<Address, Amount>,
    external_sent: Vec<(Address, Address, Amount)>,
    calls: Vec<(Address, Vec<u8>)>,
    reverting_targets: BTreeMap<Address, String>,
    rejecting_recipients: BTreeSet<Address>,
}

impl MockTreasury {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fund_native(&self, amount: Amount) {
        self.state.lock().unwrap().native += amount;
    }

    pub fn fund_external(&self, token: Address, amount: Amount) {
        *self.state.lock().unwrap().external.entry(token).or_insert(0) += amount;
    }

    /// Make every call to `target` revert with `reason`.
    pub fn revert_calls_to(&self, target: Address, reason: &str) {
        self.state
            .lock()
            .unwrap()
            .reverting_targets
            .insert(target, reason.to_string());
    }

    /// Make native sends to `recipient` fail.
    pub fn reject_recipient(&self, recipient: Address) {
        self.state.lock().unwrap().rejecting_recipients.insert(recipient);
    }

    pub fn native_sent_to(&self, recipient: &Address) -> Amount {
        let s = self.state.lock().unwrap();
        s.native_sent.get(recipient).copied().unwrap_or(0)
    }

    pub fn external_transfers(&self) -> Vec<(Address, Address, Amount)> {
        self.state.lock().unwrap().external_sent.clone()
    }

    pub fn forwarded_calls(&self) -> Vec<(Address, Vec<u8>)> {
        self.state.lock().unwrap().calls.clone()
    }
}

#[async_trait]
impl Treasury for MockTreasury {
    async fn native_balance(&self) -> TreasuryResult<Amount> {
        Ok(self.state.lock().unwrap().native)
    }

    async fn send_native(&self, to: &Address, amount: Amount) -> TreasuryResult<()> {
        let mut s = self.state.lock().unwrap();
        if s.rejecting_recipients.contains(to) {
            return Err(TreasuryError::TransferFailed(format!(
                "recipient {} rejected funds",
                to
            )));
        }
        if s.native < amount {
            return Err(TreasuryError::InsufficientFunds {
                available: s.native,
                required: amount,
            });
        }
        s.native -= amount;
        *s.native_sent.entry(*to).or_insert(0) += amount;
        Ok(())
    }

    async fn transfer_external(
        &self,
        token: &Address,
        to: &Address,
        amount: Amount,
    ) -> TreasuryResult<()> {
        let mut s = self.state.lock().unwrap();
        let held = s.external.get(token).copied().unwrap_or(0);
        if held < amount {
            return Err(TreasuryError::InsufficientFunds {
                available: held,
                required: amount,
            });
        }
        s.external.insert(*token, held - amount);
        s.external_sent.push((*token, *to, amount));
        Ok(())
    }

    async fn forward_call(&self, target: &Address, payload: &[u8]) -> TreasuryResult<Vec<u8>> {
        let mut s = self.state.lock().unwrap();
        if let Some(reason) = s.reverting_targets.get(target) {
            return Err(TreasuryError::CallReverted(reason.clone()));
        }
        s.calls.push((*target, payload.to_vec()));
        Ok(Vec::new())
    }
}
