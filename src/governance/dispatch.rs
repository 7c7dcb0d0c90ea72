//! Execution callback.
//!
//! The scheduler delivers the payload built by `queue_proposal` to
//! [`ScheduledTarget::on_scheduled_call`]. The payload is a four byte
//! `exec` selector followed by the big-endian proposal id. Decoding it leads
//! to [`Governor::execute_scheduled`], which dispatches on the proposal type.

use super::events::EventKind;
use super::params::ParamKind;
use super::proposal::ProposalAction;
use super::Governor;
use crate::error::{GovernanceError, GovernanceResult};
use crate::ledger::LedgerError;
use crate::scheduler::ScheduledTarget;
use crate::treasury::TreasuryError;
use crate::types::{Address, ProposalId, Selector};
use async_trait::async_trait;
use tracing::{error, info};

/// Selector of the self-addressed execution call.
pub const EXECUTE_SELECTOR: Selector = Selector(*b"exec");

const EXECUTE_CALL_LEN: usize = 4 + 8;

pub fn encode_execute_call(id: ProposalId) -> Vec<u8> {
    let mut payload = Vec::with_capacity(EXECUTE_CALL_LEN);
    payload.extend_from_slice(&EXECUTE_SELECTOR.0);
    payload.extend_from_slice(&id.to_be_bytes());
    payload
}

pub fn decode_execute_call(payload: &[u8]) -> GovernanceResult<ProposalId> {
    if payload.len() != EXECUTE_CALL_LEN {
        return Err(GovernanceError::InvalidInput(format!(
            "execute call must be {} bytes, got {}",
            EXECUTE_CALL_LEN,
            payload.len()
        )));
    }
    if Selector::from_payload(payload) != Some(EXECUTE_SELECTOR) {
        return Err(GovernanceError::InvalidInput(
            "unknown scheduled call selector".to_string(),
        ));
    }
    let mut id = [0u8; 8];
    id.copy_from_slice(&payload[4..]);
    Ok(ProposalId::from_be_bytes(id))
}

impl Governor {
    /// Bridge-only execution entry.
    ///
    /// Any failure aborts the whole callback with nothing recorded on the
    /// proposal, so the scheduler keeps the job pending. The stake refund
    /// that follows a successful dispatch cannot fail the call.
    pub async fn execute_scheduled(&self, caller: &Address, id: ProposalId) -> GovernanceResult<()> {
        let _op = self.op_lock.enter()?;
        self.ensure_not_paused()?;

        if *caller != self.scheduler.address() {
            return Err(GovernanceError::NotAuthorized);
        }

        let (action, engine) = {
            let s = self.state();
            let proposal = s.proposals.get(id)?;
            if proposal.flags.executed() {
                return Err(GovernanceError::AlreadyExecuted);
            }
            if !proposal.flags.queued() {
                return Err(GovernanceError::NotQueued);
            }
            if proposal.flags.canceled() {
                return Err(GovernanceError::InvalidState {
                    expected: "Queued",
                    actual: super::ProposalState::Canceled,
                });
            }
            (proposal.action.clone(), s.engine_address)
        };

        let param_updates = self.dispatch(id, &action, &engine).await?;

        {
            let mut s = self.state();
            s.proposals.get_mut(id)?.flags.mark_executed()?;
        }

        for (parameter, old, new) in param_updates {
            self.emit(caller, EventKind::ParameterUpdated { parameter, old, new });
        }
        info!(proposal = id, kind = %action.kind(), "proposal executed");
        self.emit(caller, EventKind::ProposalExecuted { proposal_id: id });

        self.refund_after_execution(caller, id).await;
        Ok(())
    }

    /// Perform the proposal's effect. Parameter changes are committed here
    /// and returned as (kind, old, new) for event emission.
    async fn dispatch(
        &self,
        id: ProposalId,
        action: &ProposalAction,
        engine: &Address,
    ) -> GovernanceResult<Vec<(ParamKind, u128, u128)>> {
        match action {
            ProposalAction::Withdrawal { recipient, amount } => {
                let available = self
                    .treasury
                    .native_balance()
                    .await
                    .map_err(|e| GovernanceError::TransferFailed(e.to_string()))?;
                if available < *amount {
                    return Err(GovernanceError::InsufficientBalance {
                        available,
                        required: *amount,
                    });
                }
                self.treasury
                    .send_native(recipient, *amount)
                    .await
                    .map_err(treasury_error)?;
            }
            ProposalAction::InternalTokenTransfer { recipient, amount } => {
                self.ledger
                    .transfer(engine, recipient, *amount)
                    .await
                    .map_err(ledger_error)?;
            }
            ProposalAction::TokenMint { recipient, amount } => {
                self.ledger.mint(recipient, *amount).await?;
            }
            ProposalAction::TokenBurn { holder, amount } => {
                self.ledger.burn(holder, *amount).await.map_err(ledger_error)?;
            }
            ProposalAction::ExternalTokenTransfer {
                token,
                recipient,
                amount,
            } => {
                self.treasury
                    .transfer_external(token, recipient, *amount)
                    .await
                    .map_err(treasury_error)?;
            }
            ProposalAction::General { target, payload } => {
                if let Err(e) = self.treasury.forward_call(target, payload).await {
                    let reason = e.to_string();
                    error!(proposal = id, target = %target, reason = %reason, "forwarded call failed");
                    self.emit(
                        &self.scheduler.address(),
                        EventKind::ExecutionCallFailed {
                            proposal_id: id,
                            reason: reason.clone(),
                        },
                    );
                    return Err(GovernanceError::CallFailed(reason));
                }
            }
            ProposalAction::GovernanceParameterChange(changes) => {
                let mut params = self.state().params.clone();
                let mut updates = Vec::new();
                for (kind, value) in changes.entries() {
                    let old = params.set(kind, value)?;
                    updates.push((kind, old, value));
                }
                self.state().params = params;
                return Ok(updates);
            }
        }
        Ok(Vec::new())
    }
}

fn ledger_error(e: LedgerError) -> GovernanceError {
    match e {
        LedgerError::InsufficientBalance {
            available,
            required,
        } => GovernanceError::InsufficientBalance {
            available,
            required,
        },
        other => GovernanceError::Ledger(other),
    }
}

fn treasury_error(e: TreasuryError) -> GovernanceError {
    match e {
        TreasuryError::InsufficientFunds {
            available,
            required,
        } => GovernanceError::InsufficientBalance {
            available,
            required,
        },
        other => GovernanceError::TransferFailed(other.to_string()),
    }
}

#[async_trait]
impl ScheduledTarget for Governor {
    async fn on_scheduled_call(&self, caller: &Address, payload: &[u8]) -> Result<(), String> {
        let id = decode_execute_call(payload).map_err(|e| e.to_string())?;
        self.execute_scheduled(caller, id)
            .await
            .map_err(|e| e.to_string())
    }
}
