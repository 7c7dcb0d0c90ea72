//! Token-weighted governance engine.
//!
//! - Proposals are staked, voted on at a frozen snapshot, and executed
//!   through the delayed-execution scheduler
//! - Lifecycle state is derived on every read, never stored
//! - Mutating entry points run one at a time behind an operation lock
//! - Every state change is recorded in the event log
//!
//! Configuration, role sets and proposals are owned by each [`Governor`]
//! instance; there is no process-wide state.

pub mod admin;
pub mod dispatch;
pub mod events;
pub mod guard;
pub mod lifecycle;
pub mod params;
pub mod persist;
pub mod proposal;
pub mod refund;
pub mod roles;
pub mod state;
pub mod store;
pub mod voting;

#[cfg(test)]
mod proptests;
#[cfg(test)]
pub(crate) mod test_support;

pub use dispatch::{decode_execute_call, encode_execute_call};
pub use events::{EventKind, EventLog, EventQuery, GovernanceEvent};
pub use params::{CallWhitelist, GovernanceParams, ParamKind, ParameterChanges};
pub use proposal::{
    Proposal, ProposalAction, ProposalFlags, ProposalKind, ProposalState, Tally, VoteSupport,
    VoteTotals, VoterRecord,
};
pub use roles::{Role, RoleRegistry};
pub use store::{ProposalStore, VoterLedger};

use crate::clock::Clock;
use crate::error::{GovernanceError, GovernanceResult};
use crate::ledger::TokenLedger;
use crate::scheduler::SchedulerBridge;
use crate::treasury::Treasury;
use crate::types::{Address, ProposalId, Selector, Timestamp};
use guard::OperationLock;
use serde::{Deserialize, Serialize};
use state::Derivation;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// External systems the engine talks to.
#[derive(Clone)]
pub struct Collaborators {
    pub ledger: Arc<dyn TokenLedger>,
    pub scheduler: Arc<dyn SchedulerBridge>,
    pub treasury: Arc<dyn Treasury>,
    pub clock: Arc<dyn Clock>,
}

/// Initial configuration of an engine instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GovernanceSetup {
    /// Identity holding staked tokens and receiving scheduled calls.
    pub engine_address: Address,
    pub params: GovernanceParams,
    pub administrators: Vec<Address>,
    pub guardians: Vec<Address>,
    pub allowed_selectors: Vec<Selector>,
    pub allowed_targets: Vec<Address>,
}

/// Persisted engine state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GovernorState {
    pub engine_address: Address,
    pub proposals: ProposalStore,
    pub params: GovernanceParams,
    pub whitelist: CallWhitelist,
    pub roles: RoleRegistry,
    pub paused: bool,
}

impl GovernorState {
    pub fn from_setup(setup: GovernanceSetup) -> GovernanceResult<Self> {
        setup.params.validate()?;
        if setup.engine_address.is_zero() {
            return Err(GovernanceError::InvalidInput(
                "engine address must not be zero".to_string(),
            ));
        }
        let roles = RoleRegistry::new(setup.administrators, setup.guardians)?;
        let mut whitelist = CallWhitelist::default();
        for selector in setup.allowed_selectors {
            whitelist.set_selector(selector, true);
        }
        for target in setup.allowed_targets {
            whitelist.set_target(target, true);
        }
        Ok(Self {
            engine_address: setup.engine_address,
            proposals: ProposalStore::default(),
            params: setup.params,
            whitelist,
            roles,
            paused: false,
        })
    }
}

/// The governance engine.
pub struct Governor {
    ledger: Arc<dyn TokenLedger>,
    scheduler: Arc<dyn SchedulerBridge>,
    treasury: Arc<dyn Treasury>,
    clock: Arc<dyn Clock>,
    state: Mutex<GovernorState>,
    events: Mutex<EventLog>,
    op_lock: OperationLock,
}

impl Governor {
    pub fn new(setup: GovernanceSetup, collaborators: Collaborators) -> GovernanceResult<Self> {
        let state = GovernorState::from_setup(setup)?;
        Ok(Self::from_state(state, collaborators))
    }

    pub(crate) fn from_state(state: GovernorState, collaborators: Collaborators) -> Self {
        tracing::info!(
            engine = %state.engine_address,
            proposals = state.proposals.len(),
            "governor initialised"
        );
        Self {
            ledger: collaborators.ledger,
            scheduler: collaborators.scheduler,
            treasury: collaborators.treasury,
            clock: collaborators.clock,
            state: Mutex::new(state),
            events: Mutex::new(EventLog::new()),
            op_lock: OperationLock::new(),
        }
    }

    // ---- internal helpers ----

    /// State lock. Held only between awaits, never across one.
    fn state(&self) -> MutexGuard<'_, GovernorState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn event_log(&self) -> MutexGuard<'_, EventLog> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn now(&self) -> Timestamp {
        self.clock.now()
    }

    fn emit(&self, actor: &Address, kind: EventKind) {
        let now = self.now();
        self.event_log().record(now, *actor, kind);
    }

    fn ensure_not_paused(&self) -> GovernanceResult<()> {
        if self.state().paused {
            return Err(GovernanceError::Paused);
        }
        Ok(())
    }

    // ---- reads ----

    pub fn address(&self) -> Address {
        self.state().engine_address
    }

    /// Current lifecycle state of a proposal.
    ///
    /// Queued proposals consult the scheduler; if that lookup fails the
    /// proposal reads as Queued.
    pub async fn get_proposal_state(&self, id: ProposalId) -> GovernanceResult<ProposalState> {
        let now = self.now();
        let derivation = {
            let s = self.state();
            let proposal = s.proposals.get(id)?;
            state::derive_local(proposal, now, s.params.quorum)
        };

        let fingerprint = match derivation {
            Derivation::Resolved(state) => return Ok(state),
            Derivation::AwaitScheduler(fp) => fp,
        };

        let lookup = async {
            let job = self.scheduler.job_details(&fingerprint).await?;
            let grace = self.scheduler.grace_period_secs().await?;
            Ok::<_, crate::scheduler::SchedulerError>(state::resolve_queued(&job, grace, now))
        };
        match lookup.await {
            Ok(state) => Ok(state),
            Err(e) => {
                tracing::warn!(proposal = id, error = %e, "scheduler lookup failed, reporting Queued");
                Ok(ProposalState::Queued)
            }
        }
    }

    pub fn proposal(&self, id: ProposalId) -> GovernanceResult<Proposal> {
        self.state().proposals.get(id).cloned()
    }

    pub fn proposal_count(&self) -> u64 {
        self.state().proposals.len()
    }

    pub fn get_proposal_vote_totals(&self, id: ProposalId) -> GovernanceResult<VoteTotals> {
        self.state().proposals.vote_totals(id)
    }

    pub fn voter_record(
        &self,
        id: ProposalId,
        voter: &Address,
    ) -> GovernanceResult<Option<VoterRecord>> {
        Ok(self.state().proposals.ledger(id)?.get(voter).copied())
    }

    /// Voters of a proposal in the order they voted.
    pub fn voters(&self, id: ProposalId) -> GovernanceResult<Vec<Address>> {
        Ok(self.state().proposals.ledger(id)?.voters().to_vec())
    }

    pub fn params(&self) -> GovernanceParams {
        self.state().params.clone()
    }

    pub fn has_role(&self, role: Role, account: &Address) -> bool {
        self.state().roles.has_role(role, account)
    }

    pub fn is_selector_whitelisted(&self, selector: &Selector) -> bool {
        self.state().whitelist.selector_allowed(selector)
    }

    pub fn is_target_whitelisted(&self, target: &Address) -> bool {
        self.state().whitelist.target_allowed(target)
    }

    pub fn is_paused(&self) -> bool {
        self.state().paused
    }

    pub fn events(&self) -> Vec<GovernanceEvent> {
        self.event_log().all().to_vec()
    }

    pub fn events_since(&self, sequence: u64) -> Vec<GovernanceEvent> {
        self.event_log().since(sequence).to_vec()
    }

    pub fn query_events(&self, query: &EventQuery) -> Vec<GovernanceEvent> {
        self.event_log().query(query)
    }

    /// Event log as JSON lines.
    pub fn export_events_json(&self) -> GovernanceResult<String> {
        self.event_log()
            .to_json_lines()
            .map_err(|e| GovernanceError::Persistence(e.to_string()))
    }
}
