//! Engine error kinds.
//!
//! Every variant is a distinct, mutually exclusive reason an entry point
//! refused to run. A returned error means no engine state changed.

use crate::governance::params::ParamKind;
use crate::governance::proposal::ProposalState;
use crate::ledger::LedgerError;
use crate::scheduler::SchedulerError;
use crate::types::{Address, Amount, ProposalId, Selector};

/// Result type for engine operations.
pub type GovernanceResult<T> = Result<T, GovernanceError>;

/// Governance engine errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GovernanceError {
    #[error("invalid proposal id: {0}")]
    InvalidProposalId(ProposalId),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("selector {0} is not whitelisted")]
    SelectorNotWhitelisted(Selector),

    #[error("call target {0} is not whitelisted")]
    TargetNotWhitelisted(Address),

    #[error("balance {balance} below proposal threshold {threshold}")]
    BelowThreshold { balance: Amount, threshold: Amount },

    #[error("stake transfer failed: {0}")]
    StakeTransferFailed(LedgerError),

    #[error("already voted")]
    AlreadyVoted,

    #[error("voting ended")]
    VotingEnded,

    #[error("no voting power at proposal snapshot")]
    NoVotingPower,

    #[error("proposal is {actual}, expected {expected}")]
    InvalidState {
        expected: &'static str,
        actual: ProposalState,
    },

    #[error("not authorized")]
    NotAuthorized,

    #[error("insufficient balance: have {available}, need {required}")]
    InsufficientBalance { available: Amount, required: Amount },

    #[error("stake already refunded")]
    AlreadyRefunded,

    #[error("stake is not refundable while proposal is {0}")]
    NotRefundable(ProposalState),

    #[error("proposal already executed")]
    AlreadyExecuted,

    #[error("proposal not queued")]
    NotQueued,

    #[error("job not active in scheduler")]
    NotInScheduler,

    #[error("call failed: {0}")]
    CallFailed(String),

    #[error("transfer failed: {0}")]
    TransferFailed(String),

    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("scheduler error: {0}")]
    Scheduler(#[from] SchedulerError),

    #[error("invalid value {value} for {kind}: {reason}")]
    InvalidParameter {
        kind: ParamKind,
        value: u128,
        reason: &'static str,
    },

    #[error("cannot remove the last administrator")]
    LastAdministrator,

    #[error("engine is paused")]
    Paused,

    #[error("engine is not paused")]
    NotPaused,

    #[error("re-entrant call rejected")]
    Reentrant,

    #[error("persistence error: {0}")]
    Persistence(String),
}
