//! Stake refunds.
//!
//! Executed proposals return the whole stake automatically. Defeated,
//! canceled and expired proposals return the configured percentage when the
//! proposer claims it. The StakeRefunded flag is set before any transfer and
//! cleared again if the transfer fails.

use super::events::EventKind;
use super::Governor;
use crate::error::{GovernanceError, GovernanceResult};
use crate::types::{Address, Amount, ProposalId};
use tracing::{info, warn};

/// `stake * percentage / 100`, rounded down.
pub fn refund_amount(stake: Amount, percentage: u8) -> Amount {
    stake.saturating_mul(percentage as Amount) / 100
}

impl Governor {
    /// Claim the partial stake refund for a Defeated, Canceled or Expired
    /// proposal. Only the proposer may claim, once. Returns the amount sent.
    pub async fn claim_partial_stake_refund(
        &self,
        caller: &Address,
        id: ProposalId,
    ) -> GovernanceResult<Amount> {
        let _op = self.op_lock.enter()?;
        self.ensure_not_paused()?;

        {
            let s = self.state();
            let proposal = s.proposals.get(id)?;
            if proposal.proposer != *caller {
                return Err(GovernanceError::NotAuthorized);
            }
            if proposal.flags.stake_refunded() {
                return Err(GovernanceError::AlreadyRefunded);
            }
        }

        let current = self.get_proposal_state(id).await?;

        let (amount, percentage, engine) = {
            let mut s = self.state();
            let percentage = s
                .params
                .refund_percentage(current)
                .ok_or(GovernanceError::NotRefundable(current))?;
            let engine = s.engine_address;
            let proposal = s.proposals.get_mut(id)?;
            proposal.flags.mark_stake_refunded()?;
            (refund_amount(proposal.stake, percentage), percentage, engine)
        };

        if amount > 0 {
            if let Err(e) = self.ledger.transfer(&engine, caller, amount).await {
                self.state().proposals.get_mut(id)?.flags.rollback_stake_refunded();
                return Err(GovernanceError::TransferFailed(e.to_string()));
            }
        }

        info!(proposal = id, proposer = %caller, amount, percentage, state = %current, "partial stake refunded");
        self.emit(
            caller,
            EventKind::StakeRefunded {
                proposal_id: id,
                recipient: *caller,
                amount,
                percentage,
            },
        );
        Ok(amount)
    }

    /// Return the full stake after a successful execution. Failure is logged
    /// and recorded as an event; the execution stands.
    pub(super) async fn refund_after_execution(&self, actor: &Address, id: ProposalId) {
        // A guardian-rescued Expired proposal may already have paid its partial refund.
        let already_refunded = self
            .state()
            .proposals
            .get(id)
            .map(|p| p.flags.stake_refunded())
            .unwrap_or(false);
        if already_refunded {
            info!(proposal = id, "stake already refunded, skipping refund after execution");
            return;
        }

        match self.refund_full_stake(id).await {
            Ok((proposer, stake)) => {
                info!(proposal = id, proposer = %proposer, amount = stake, "stake refunded after execution");
                self.emit(
                    actor,
                    EventKind::StakeRefunded {
                        proposal_id: id,
                        recipient: proposer,
                        amount: stake,
                        percentage: 100,
                    },
                );
            }
            Err(e) => {
                warn!(proposal = id, error = %e, "stake refund after execution failed");
                self.emit(
                    actor,
                    EventKind::StakeRefundFailed {
                        proposal_id: id,
                        reason: e.to_string(),
                    },
                );
            }
        }
    }

    async fn refund_full_stake(&self, id: ProposalId) -> GovernanceResult<(Address, Amount)> {
        let (engine, proposer, stake) = {
            let mut s = self.state();
            let engine = s.engine_address;
            let proposal = s.proposals.get_mut(id)?;
            proposal.flags.mark_stake_refunded()?;
            (engine, proposal.proposer, proposal.stake)
        };

        if let Err(e) = self.ledger.transfer(&engine, &proposer, stake).await {
            self.state()
                .proposals
                .get_mut(id)?
                .flags
                .rollback_stake_refunded();
            return Err(GovernanceError::TransferFailed(e.to_string()));
        }
        Ok((proposer, stake))
    }
}
