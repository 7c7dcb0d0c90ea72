//! Proposal creation, cancellation, queueing and execution requests.

use super::dispatch::encode_execute_call;
use super::events::EventKind;
use super::proposal::{Proposal, ProposalAction, ProposalFlags, ProposalState, Tally};
use super::roles::Role;
use super::{Governor, GovernorState};
use crate::error::{GovernanceError, GovernanceResult};
use crate::types::{Address, Fingerprint, ProposalId, Selector};
use tracing::info;

impl Governor {
    /// Create a proposal. The caller must hold at least the proposal
    /// threshold and pays one stake into engine custody.
    pub async fn create_proposal(
        &self,
        caller: &Address,
        description: impl Into<String>,
        action: ProposalAction,
    ) -> GovernanceResult<ProposalId> {
        let _op = self.op_lock.enter()?;
        self.ensure_not_paused()?;

        let description = description.into();
        if description.trim().is_empty() {
            return Err(GovernanceError::InvalidInput(
                "description must not be empty".to_string(),
            ));
        }

        let (threshold, stake, duration, engine) = {
            let s = self.state();
            validate_action(&s, &action)?;
            (
                s.params.proposal_threshold,
                s.params.stake_amount,
                s.params.voting_duration,
                s.engine_address,
            )
        };

        let balance = self.ledger.balance_of(caller).await?;
        if balance < threshold {
            return Err(GovernanceError::BelowThreshold { balance, threshold });
        }

        let snapshot = self.ledger.new_snapshot().await?;

        // Last external step: nothing after this can fail.
        self.ledger
            .transfer(caller, &engine, stake)
            .await
            .map_err(GovernanceError::StakeTransferFailed)?;

        let now = self.now();
        let deadline = now.saturating_add(duration);
        let kind = action.kind();
        let id = {
            let mut s = self.state();
            let id = s.proposals.next_id();
            s.proposals.push(Proposal {
                id,
                proposer: *caller,
                description: description.clone(),
                action,
                created_at: now,
                deadline,
                snapshot,
                stake,
                tally: Tally::default(),
                flags: ProposalFlags::default(),
                fingerprint: None,
            })
        };

        info!(proposal = id, proposer = %caller, kind = %kind, deadline, "proposal created");
        self.emit(
            caller,
            EventKind::ProposalCreated {
                proposal_id: id,
                proposal_kind: kind,
                deadline,
                snapshot,
                stake,
                description,
            },
        );
        Ok(id)
    }

    /// Cancel a proposal.
    ///
    /// The proposer may cancel while nobody has voted and voting is open;
    /// otherwise only a guardian may. A queued job is canceled in the
    /// scheduler before the flag is set.
    pub async fn cancel_proposal(&self, caller: &Address, id: ProposalId) -> GovernanceResult<()> {
        let _op = self.op_lock.enter()?;
        self.ensure_not_paused()?;

        let current = self.get_proposal_state(id).await?;
        if !matches!(
            current,
            ProposalState::Active | ProposalState::Succeeded | ProposalState::Queued
        ) {
            return Err(GovernanceError::InvalidState {
                expected: "Active, Succeeded or Queued",
                actual: current,
            });
        }

        let now = self.now();
        let (queued_job, authorized) = {
            let s = self.state();
            let proposal = s.proposals.get(id)?;
            let no_votes = s.proposals.ledger(id)?.unique_voters() == 0;
            let proposer_may =
                *caller == proposal.proposer && no_votes && now < proposal.deadline;
            let authorized = proposer_may || s.roles.has_role(Role::Guardian, caller);
            let queued_job = if proposal.flags.queued() {
                proposal.fingerprint
            } else {
                None
            };
            (queued_job, authorized)
        };
        if !authorized {
            return Err(GovernanceError::NotAuthorized);
        }

        if let Some(fp) = queued_job {
            self.scheduler.cancel(&fp).await?;
        }

        {
            let mut s = self.state();
            s.proposals.get_mut(id)?.flags.mark_canceled()?;
        }

        info!(proposal = id, actor = %caller, scheduler_job = queued_job.is_some(), "proposal canceled");
        self.emit(
            caller,
            EventKind::ProposalCanceled {
                proposal_id: id,
                scheduler_job_canceled: queued_job.is_some(),
            },
        );
        Ok(())
    }

    /// Hand a Succeeded proposal to the scheduler. The scheduler picks the
    /// delay; the returned fingerprint identifies the job.
    pub async fn queue_proposal(
        &self,
        caller: &Address,
        id: ProposalId,
    ) -> GovernanceResult<Fingerprint> {
        let _op = self.op_lock.enter()?;
        self.ensure_not_paused()?;

        let current = self.get_proposal_state(id).await?;
        if current != ProposalState::Succeeded {
            return Err(GovernanceError::InvalidState {
                expected: "Succeeded",
                actual: current,
            });
        }

        let engine = self.address();
        let payload = encode_execute_call(id);
        let fingerprint = self
            .scheduler
            .schedule_with_risk_tier(&engine, 0, &payload)
            .await?;

        {
            let mut s = self.state();
            let proposal = s.proposals.get_mut(id)?;
            proposal.fingerprint = Some(fingerprint);
            proposal.flags.mark_queued();
        }

        info!(proposal = id, actor = %caller, fingerprint = %fingerprint, "proposal queued");
        self.emit(
            caller,
            EventKind::ProposalQueued {
                proposal_id: id,
                fingerprint,
            },
        );
        Ok(fingerprint)
    }

    /// Ask the scheduler to run a queued proposal's job.
    ///
    /// Changes nothing by itself: the proposal becomes Executed only when the
    /// scheduler calls back into [`Governor::execute_scheduled`]. Not taken
    /// under the operation lock so that a synchronous callback can enter.
    pub async fn execute_proposal(&self, caller: &Address, id: ProposalId) -> GovernanceResult<()> {
        self.ensure_not_paused()?;

        let current = self.get_proposal_state(id).await?;
        if current != ProposalState::Queued {
            return Err(GovernanceError::InvalidState {
                expected: "Queued",
                actual: current,
            });
        }
        let fingerprint = self.active_fingerprint(id).await?;

        info!(proposal = id, actor = %caller, fingerprint = %fingerprint, "execution requested");
        self.scheduler.execute(&fingerprint).await?;
        Ok(())
    }

    /// Guardian rescue for a job whose grace period elapsed.
    pub async fn execute_expired_proposal(
        &self,
        caller: &Address,
        id: ProposalId,
    ) -> GovernanceResult<()> {
        self.ensure_not_paused()?;
        if !self.has_role(Role::Guardian, caller) {
            return Err(GovernanceError::NotAuthorized);
        }

        let current = self.get_proposal_state(id).await?;
        if current != ProposalState::Expired {
            return Err(GovernanceError::InvalidState {
                expected: "Expired",
                actual: current,
            });
        }
        let fingerprint = self.active_fingerprint(id).await?;

        info!(proposal = id, actor = %caller, fingerprint = %fingerprint, "execution after grace requested");
        self.scheduler.execute_after_grace(&fingerprint).await?;
        Ok(())
    }

    /// Stored fingerprint, provided the scheduler still holds the job.
    async fn active_fingerprint(&self, id: ProposalId) -> GovernanceResult<Fingerprint> {
        let fingerprint = self
            .state()
            .proposals
            .get(id)?
            .fingerprint
            .ok_or(GovernanceError::NotQueued)?;
        if !self.scheduler.is_scheduled(&fingerprint).await? {
            return Err(GovernanceError::NotInScheduler);
        }
        Ok(fingerprint)
    }
}

/// Per-type input validation for new proposals.
fn validate_action(s: &GovernorState, action: &ProposalAction) -> GovernanceResult<()> {
    let nonzero = |who: &Address, field: &str| {
        if who.is_zero() {
            Err(GovernanceError::InvalidInput(format!("{} must not be zero", field)))
        } else {
            Ok(())
        }
    };
    let positive = |amount: u128| {
        if amount == 0 {
            Err(GovernanceError::InvalidInput(
                "amount must be positive".to_string(),
            ))
        } else {
            Ok(())
        }
    };

    match action {
        ProposalAction::General { target, payload } => {
            nonzero(target, "target")?;
            let selector = Selector::from_payload(payload).ok_or_else(|| {
                GovernanceError::InvalidInput("payload shorter than a selector".to_string())
            })?;
            if !s.whitelist.selector_allowed(&selector) {
                return Err(GovernanceError::SelectorNotWhitelisted(selector));
            }
            if !s.whitelist.target_allowed(target) {
                return Err(GovernanceError::TargetNotWhitelisted(*target));
            }
        }
        ProposalAction::Withdrawal { recipient, amount }
        | ProposalAction::InternalTokenTransfer { recipient, amount }
        | ProposalAction::TokenMint { recipient, amount } => {
            nonzero(recipient, "recipient")?;
            positive(*amount)?;
        }
        ProposalAction::TokenBurn { holder, amount } => {
            nonzero(holder, "holder")?;
            positive(*amount)?;
        }
        ProposalAction::ExternalTokenTransfer {
            token,
            recipient,
            amount,
        } => {
            nonzero(token, "token")?;
            nonzero(recipient, "recipient")?;
            positive(*amount)?;
        }
        ProposalAction::GovernanceParameterChange(changes) => {
            let entries = changes.entries();
            if entries.is_empty() {
                return Err(GovernanceError::InvalidInput(
                    "parameter change proposes no changes".to_string(),
                ));
            }
            let mut params = s.params.clone();
            for (kind, value) in entries {
                params.set(kind, value)?;
            }
        }
    }
    Ok(())
}
