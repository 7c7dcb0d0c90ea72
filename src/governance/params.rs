//! Parameter store and General-call whitelist.
//!
//! All numeric updates funnel through [`GovernanceParams::set`], which
//! validates by parameter kind and returns the previous value so the caller
//! can emit an old/new event.

use super::proposal::ProposalState;
use crate::error::{GovernanceError, GovernanceResult};
use crate::types::{Address, Amount, Selector};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Updatable numeric parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ParamKind {
    VotingDuration,
    MinVotingDuration,
    MaxVotingDuration,
    Quorum,
    ProposalThreshold,
    StakeAmount,
    DefeatedRefundPercentage,
    CanceledRefundPercentage,
    ExpiredRefundPercentage,
}

impl ParamKind {
    pub const ALL: [ParamKind; 9] = [
        ParamKind::VotingDuration,
        ParamKind::MinVotingDuration,
        ParamKind::MaxVotingDuration,
        ParamKind::Quorum,
        ParamKind::ProposalThreshold,
        ParamKind::StakeAmount,
        ParamKind::DefeatedRefundPercentage,
        ParamKind::CanceledRefundPercentage,
        ParamKind::ExpiredRefundPercentage,
    ];
}

impl fmt::Display for ParamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ParamKind::VotingDuration => "voting_duration",
            ParamKind::MinVotingDuration => "min_voting_duration",
            ParamKind::MaxVotingDuration => "max_voting_duration",
            ParamKind::Quorum => "quorum",
            ParamKind::ProposalThreshold => "proposal_threshold",
            ParamKind::StakeAmount => "stake_amount",
            ParamKind::DefeatedRefundPercentage => "defeated_refund_percentage",
            ParamKind::CanceledRefundPercentage => "canceled_refund_percentage",
            ParamKind::ExpiredRefundPercentage => "expired_refund_percentage",
        };
        write!(f, "{}", name)
    }
}

/// Governance parameter record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GovernanceParams {
    /// Seconds a proposal stays open for votes.
    pub voting_duration: u64,
    pub min_voting_duration: u64,
    pub max_voting_duration: u64,
    /// Minimum total participation (yes + no + abstain).
    pub quorum: Amount,
    /// Live balance a proposer must hold.
    pub proposal_threshold: Amount,
    /// Stake escrowed per proposal.
    pub stake_amount: Amount,
    pub defeated_refund_percentage: u8,
    pub canceled_refund_percentage: u8,
    pub expired_refund_percentage: u8,
}

impl GovernanceParams {
    pub fn get(&self, kind: ParamKind) -> u128 {
        match kind {
            ParamKind::VotingDuration => self.voting_duration as u128,
            ParamKind::MinVotingDuration => self.min_voting_duration as u128,
            ParamKind::MaxVotingDuration => self.max_voting_duration as u128,
            ParamKind::Quorum => self.quorum,
            ParamKind::ProposalThreshold => self.proposal_threshold,
            ParamKind::StakeAmount => self.stake_amount,
            ParamKind::DefeatedRefundPercentage => self.defeated_refund_percentage as u128,
            ParamKind::CanceledRefundPercentage => self.canceled_refund_percentage as u128,
            ParamKind::ExpiredRefundPercentage => self.expired_refund_percentage as u128,
        }
    }

    /// Check `value` against the rule for `kind` without applying it.
    pub fn validate_value(&self, kind: ParamKind, value: u128) -> GovernanceResult<()> {
        let invalid = |reason| GovernanceError::InvalidParameter {
            kind,
            value,
            reason,
        };
        match kind {
            ParamKind::VotingDuration => {
                if value < self.min_voting_duration as u128 {
                    return Err(invalid("below minimum voting duration"));
                }
                if value > self.max_voting_duration as u128 {
                    return Err(invalid("above maximum voting duration"));
                }
            }
            ParamKind::MinVotingDuration => {
                if value == 0 {
                    return Err(invalid("must be positive"));
                }
                if value > self.voting_duration as u128 {
                    return Err(invalid("above current voting duration"));
                }
            }
            ParamKind::MaxVotingDuration => {
                if value < self.voting_duration as u128 {
                    return Err(invalid("below current voting duration"));
                }
                if value > u64::MAX as u128 {
                    return Err(invalid("duration out of range"));
                }
            }
            ParamKind::Quorum | ParamKind::ProposalThreshold | ParamKind::StakeAmount => {
                if value == 0 {
                    return Err(invalid("must be positive"));
                }
            }
            ParamKind::DefeatedRefundPercentage
            | ParamKind::CanceledRefundPercentage
            | ParamKind::ExpiredRefundPercentage => {
                if value > 100 {
                    return Err(invalid("percentage above 100"));
                }
            }
        }
        Ok(())
    }

    /// Validate and apply one update; returns the old value.
    pub(crate) fn set(&mut self, kind: ParamKind, value: u128) -> GovernanceResult<u128> {
        self.validate_value(kind, value)?;
        let old = self.get(kind);
        match kind {
            ParamKind::VotingDuration => self.voting_duration = value as u64,
            ParamKind::MinVotingDuration => self.min_voting_duration = value as u64,
            ParamKind::MaxVotingDuration => self.max_voting_duration = value as u64,
            ParamKind::Quorum => self.quorum = value,
            ParamKind::ProposalThreshold => self.proposal_threshold = value,
            ParamKind::StakeAmount => self.stake_amount = value,
            ParamKind::DefeatedRefundPercentage => self.defeated_refund_percentage = value as u8,
            ParamKind::CanceledRefundPercentage => self.canceled_refund_percentage = value as u8,
            ParamKind::ExpiredRefundPercentage => self.expired_refund_percentage = value as u8,
        }
        Ok(old)
    }

    /// Validate a whole record (bounds first, then every kind).
    pub fn validate(&self) -> GovernanceResult<()> {
        if self.min_voting_duration == 0 || self.min_voting_duration > self.max_voting_duration {
            return Err(GovernanceError::InvalidInput(format!(
                "invalid voting duration bounds [{}, {}]",
                self.min_voting_duration, self.max_voting_duration
            )));
        }
        for kind in ParamKind::ALL {
            self.validate_value(kind, self.get(kind))?;
        }
        Ok(())
    }

    /// Refund percentage for a terminal-for-refund state.
    pub fn refund_percentage(&self, state: ProposalState) -> Option<u8> {
        match state {
            ProposalState::Defeated => Some(self.defeated_refund_percentage),
            ProposalState::Canceled => Some(self.canceled_refund_percentage),
            ProposalState::Expired => Some(self.expired_refund_percentage),
            _ => None,
        }
    }
}

impl Default for GovernanceParams {
    fn default() -> Self {
        Self {
            voting_duration: 86_400,
            min_voting_duration: 3_600,
            max_voting_duration: 1_209_600,
            quorum: crate::types::tokens(500),
            proposal_threshold: crate::types::tokens(100),
            stake_amount: crate::types::tokens(1),
            defeated_refund_percentage: 50,
            canceled_refund_percentage: 50,
            expired_refund_percentage: 50,
        }
    }
}

/// Parameter values proposed by a GovernanceParameterChange proposal.
/// `None` leaves the parameter unchanged. Entries apply in setter order, each
/// validated against the record as left by the previous one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterChanges {
    pub voting_duration: Option<u64>,
    pub min_voting_duration: Option<u64>,
    pub max_voting_duration: Option<u64>,
    pub quorum: Option<Amount>,
    pub proposal_threshold: Option<Amount>,
    pub stake_amount: Option<Amount>,
    pub defeated_refund_percentage: Option<u8>,
    pub canceled_refund_percentage: Option<u8>,
    pub expired_refund_percentage: Option<u8>,
}

impl ParameterChanges {
    /// Supplied fields, in setter order.
    pub fn entries(&self) -> Vec<(ParamKind, u128)> {
        [
            (ParamKind::VotingDuration, self.voting_duration.map(u128::from)),
            (
                ParamKind::MinVotingDuration,
                self.min_voting_duration.map(u128::from),
            ),
            (
                ParamKind::MaxVotingDuration,
                self.max_voting_duration.map(u128::from),
            ),
            (ParamKind::Quorum, self.quorum),
            (ParamKind::ProposalThreshold, self.proposal_threshold),
            (ParamKind::StakeAmount, self.stake_amount),
            (
                ParamKind::DefeatedRefundPercentage,
                self.defeated_refund_percentage.map(u128::from),
            ),
            (
                ParamKind::CanceledRefundPercentage,
                self.canceled_refund_percentage.map(u128::from),
            ),
            (
                ParamKind::ExpiredRefundPercentage,
                self.expired_refund_percentage.map(u128::from),
            ),
        ]
        .into_iter()
        .filter_map(|(kind, value)| value.map(|v| (kind, v)))
        .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }
}

/// Allowed selectors and call targets for General proposals.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallWhitelist {
    selectors: BTreeMap<Selector, bool>,
    targets: BTreeMap<Address, bool>,
}

impl CallWhitelist {
    pub fn set_selector(&mut self, selector: Selector, allowed: bool) {
        self.selectors.insert(selector, allowed);
    }

    pub fn set_target(&mut self, target: Address, allowed: bool) {
        self.targets.insert(target, allowed);
    }

    pub fn selector_allowed(&self, selector: &Selector) -> bool {
        self.selectors.get(selector).copied().unwrap_or(false)
    }

    pub fn target_allowed(&self, target: &Address) -> bool {
        self.targets.get(target).copied().unwrap_or(false)
    }
}
