//! Proposal data model.
//!
//! A proposal's action is a tagged union, so type-specific fields exist only
//! for the matching type. Lifecycle flags are independent booleans whose
//! legal combinations are enforced by the `mark_*` transitions.

use super::params::ParameterChanges;
use crate::error::{GovernanceError, GovernanceResult};
use crate::types::{Address, Amount, Fingerprint, ProposalId, SnapshotId, Timestamp};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Proposal type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProposalKind {
    General,
    Withdrawal,
    InternalTokenTransfer,
    GovernanceParameterChange,
    ExternalTokenTransfer,
    TokenMint,
    TokenBurn,
}

impl fmt::Display for ProposalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ProposalKind::General => "general",
            ProposalKind::Withdrawal => "withdrawal",
            ProposalKind::InternalTokenTransfer => "internal_token_transfer",
            ProposalKind::GovernanceParameterChange => "governance_parameter_change",
            ProposalKind::ExternalTokenTransfer => "external_token_transfer",
            ProposalKind::TokenMint => "token_mint",
            ProposalKind::TokenBurn => "token_burn",
        };
        write!(f, "{}", name)
    }
}

/// What an approved proposal does when executed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProposalAction {
    /// Forward `payload` (selector + arguments) to `target`.
    General { target: Address, payload: Vec<u8> },
    /// Send native funds held by the engine.
    Withdrawal { recipient: Address, amount: Amount },
    /// Move governance tokens held by the engine.
    InternalTokenTransfer { recipient: Address, amount: Amount },
    /// Move an external token held by the engine.
    ExternalTokenTransfer {
        token: Address,
        recipient: Address,
        amount: Amount,
    },
    TokenMint { recipient: Address, amount: Amount },
    /// Burn governance tokens held by `holder`.
    TokenBurn { holder: Address, amount: Amount },
    GovernanceParameterChange(ParameterChanges),
}

impl ProposalAction {
    pub fn kind(&self) -> ProposalKind {
        match self {
            ProposalAction::General { .. } => ProposalKind::General,
            ProposalAction::Withdrawal { .. } => ProposalKind::Withdrawal,
            ProposalAction::InternalTokenTransfer { .. } => ProposalKind::InternalTokenTransfer,
            ProposalAction::ExternalTokenTransfer { .. } => ProposalKind::ExternalTokenTransfer,
            ProposalAction::TokenMint { .. } => ProposalKind::TokenMint,
            ProposalAction::TokenBurn { .. } => ProposalKind::TokenBurn,
            ProposalAction::GovernanceParameterChange(_) => {
                ProposalKind::GovernanceParameterChange
            }
        }
    }
}

/// Derived lifecycle state. Never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProposalState {
    Active,
    Canceled,
    Defeated,
    Succeeded,
    Queued,
    Expired,
    Executed,
}

impl ProposalState {
    /// States no entry point can leave.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ProposalState::Canceled | ProposalState::Executed)
    }
}

impl fmt::Display for ProposalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Vote direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VoteSupport {
    Against,
    For,
    Abstain,
}

impl TryFrom<u8> for VoteSupport {
    type Error = GovernanceError;

    fn try_from(raw: u8) -> Result<Self, Self::Error> {
        match raw {
            0 => Ok(VoteSupport::Against),
            1 => Ok(VoteSupport::For),
            2 => Ok(VoteSupport::Abstain),
            other => Err(GovernanceError::InvalidInput(format!(
                "invalid vote support {}",
                other
            ))),
        }
    }
}

/// Vote tallies in base units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tally {
    pub yes: Amount,
    pub no: Amount,
    pub abstain: Amount,
}

impl Tally {
    pub fn total(&self) -> Amount {
        self.yes.saturating_add(self.no).saturating_add(self.abstain)
    }

    pub fn add(&mut self, support: VoteSupport, power: Amount) {
        let slot = match support {
            VoteSupport::For => &mut self.yes,
            VoteSupport::Against => &mut self.no,
            VoteSupport::Abstain => &mut self.abstain,
        };
        *slot = slot.saturating_add(power);
    }
}

/// Lifecycle flags. Once set a flag stays set; `executed` and `canceled`
/// are mutually exclusive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalFlags {
    executed: bool,
    canceled: bool,
    stake_refunded: bool,
    queued: bool,
}

impl ProposalFlags {
    pub fn executed(&self) -> bool {
        self.executed
    }

    pub fn canceled(&self) -> bool {
        self.canceled
    }

    pub fn stake_refunded(&self) -> bool {
        self.stake_refunded
    }

    pub fn queued(&self) -> bool {
        self.queued
    }

    pub(crate) fn mark_executed(&mut self) -> GovernanceResult<()> {
        if self.executed {
            return Err(GovernanceError::AlreadyExecuted);
        }
        if self.canceled {
            return Err(GovernanceError::InvalidState {
                expected: "Queued",
                actual: ProposalState::Canceled,
            });
        }
        self.executed = true;
        Ok(())
    }

    pub(crate) fn mark_canceled(&mut self) -> GovernanceResult<()> {
        if self.executed {
            return Err(GovernanceError::InvalidState {
                expected: "not Executed",
                actual: ProposalState::Executed,
            });
        }
        if self.canceled {
            return Err(GovernanceError::InvalidState {
                expected: "not Canceled",
                actual: ProposalState::Canceled,
            });
        }
        self.canceled = true;
        Ok(())
    }

    pub(crate) fn mark_queued(&mut self) {
        self.queued = true;
    }

    pub(crate) fn mark_stake_refunded(&mut self) -> GovernanceResult<()> {
        if self.stake_refunded {
            return Err(GovernanceError::AlreadyRefunded);
        }
        self.stake_refunded = true;
        Ok(())
    }

    /// Undo `mark_stake_refunded` when the refund transfer it guarded failed.
    pub(crate) fn rollback_stake_refunded(&mut self) {
        self.stake_refunded = false;
    }

    /// Flags decoded from storage must still respect the exclusion rule.
    pub fn is_consistent(&self) -> bool {
        !(self.executed && self.canceled) && !(self.executed && !self.queued)
    }
}

/// A stored proposal record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    pub id: ProposalId,
    pub proposer: Address,
    pub description: String,
    pub action: ProposalAction,
    pub created_at: Timestamp,
    pub deadline: Timestamp,
    pub snapshot: SnapshotId,
    pub stake: Amount,
    pub tally: Tally,
    pub flags: ProposalFlags,
    /// Scheduler fingerprint, set once queued.
    pub fingerprint: Option<Fingerprint>,
}

impl Proposal {
    pub fn kind(&self) -> ProposalKind {
        self.action.kind()
    }
}

/// Per (proposal, voter) record. Present only if the voter voted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoterRecord {
    pub support: VoteSupport,
    pub power: Amount,
}

/// Vote totals as exposed to readers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteTotals {
    pub yes: Amount,
    pub no: Amount,
    pub abstain: Amount,
    pub unique_voters: u64,
}
