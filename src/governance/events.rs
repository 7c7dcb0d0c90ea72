//! Governance event log.
//!
//! - Append-only, sequence-numbered
//! - One entry per state-affecting operation (kind tag + actor + payload)
//! - Exported as JSON lines for an external indexer

use super::params::ParamKind;
use super::proposal::{ProposalKind, VoteSupport};
use super::roles::Role;
use crate::types::{Address, Amount, Fingerprint, ProposalId, Selector, SnapshotId, Timestamp};
use serde::Serialize;

/// Event payloads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EventKind {
    ProposalCreated {
        proposal_id: ProposalId,
        proposal_kind: ProposalKind,
        deadline: Timestamp,
        snapshot: SnapshotId,
        stake: Amount,
        description: String,
    },
    VoteCast {
        proposal_id: ProposalId,
        support: VoteSupport,
        power: Amount,
    },
    ProposalCanceled {
        proposal_id: ProposalId,
        scheduler_job_canceled: bool,
    },
    ProposalQueued {
        proposal_id: ProposalId,
        fingerprint: Fingerprint,
    },
    ProposalExecuted {
        proposal_id: ProposalId,
    },
    /// A General call reverted; the execution callback was rolled back.
    ExecutionCallFailed {
        proposal_id: ProposalId,
        reason: String,
    },
    StakeRefunded {
        proposal_id: ProposalId,
        recipient: Address,
        amount: Amount,
        percentage: u8,
    },
    /// Refund after a successful execution failed; execution stands.
    StakeRefundFailed {
        proposal_id: ProposalId,
        reason: String,
    },
    ParameterUpdated {
        parameter: ParamKind,
        old: u128,
        new: u128,
    },
    RoleGranted {
        role: Role,
        account: Address,
    },
    RoleRevoked {
        role: Role,
        account: Address,
    },
    SelectorWhitelisted {
        selector: Selector,
        allowed: bool,
    },
    TargetWhitelisted {
        target: Address,
        allowed: bool,
    },
    Paused,
    Unpaused,
}

impl EventKind {
    /// Proposal the event belongs to, if any.
    pub fn proposal_id(&self) -> Option<ProposalId> {
        match self {
            EventKind::ProposalCreated { proposal_id, .. }
            | EventKind::VoteCast { proposal_id, .. }
            | EventKind::ProposalCanceled { proposal_id, .. }
            | EventKind::ProposalQueued { proposal_id, .. }
            | EventKind::ProposalExecuted { proposal_id }
            | EventKind::ExecutionCallFailed { proposal_id, .. }
            | EventKind::StakeRefunded { proposal_id, .. }
            | EventKind::StakeRefundFailed { proposal_id, .. } => Some(*proposal_id),
            _ => None,
        }
    }
}

/// Single log entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GovernanceEvent {
    pub sequence: u64,
    pub timestamp: Timestamp,
    pub actor: Address,
    #[serde(flatten)]
    pub kind: EventKind,
}

/// Query options for the event log.
#[derive(Debug, Clone, Default)]
pub struct EventQuery {
    pub proposal_id: Option<ProposalId>,
    pub actor: Option<Address>,
    /// Most recent N matches, returned oldest first.
    pub limit: Option<usize>,
}

/// Append-only event log.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Vec<GovernanceEvent>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record(&mut self, timestamp: Timestamp, actor: Address, kind: EventKind) {
        let event = GovernanceEvent {
            sequence: self.events.len() as u64,
            timestamp,
            actor,
            kind,
        };
        tracing::debug!(sequence = event.sequence, actor = %actor, event = ?event.kind, "governance event");
        self.events.push(event);
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn all(&self) -> &[GovernanceEvent] {
        &self.events
    }

    /// Events with sequence >= `sequence`.
    pub fn since(&self, sequence: u64) -> &[GovernanceEvent] {
        let start = (sequence as usize).min(self.events.len());
        &self.events[start..]
    }

    pub fn query(&self, query: &EventQuery) -> Vec<GovernanceEvent> {
        let matching: Vec<GovernanceEvent> = self
            .events
            .iter()
            .filter(|e| {
                query
                    .proposal_id
                    .map_or(true, |id| e.kind.proposal_id() == Some(id))
            })
            .filter(|e| query.actor.map_or(true, |a| e.actor == a))
            .cloned()
            .collect();

        match query.limit {
            Some(limit) if matching.len() > limit => matching[matching.len() - limit..].to_vec(),
            _ => matching,
        }
    }

    /// One JSON object per line, in sequence order.
    pub fn to_json_lines(&self) -> serde_json::Result<String> {
        let mut out = String::new();
        for event in &self.events {
            out.push_str(&serde_json::to_string(event)?);
            out.push('\n');
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_log() -> EventLog {
        let mut log = EventLog::new();
        let alice = Address::repeat(1);
        let bob = Address::repeat(2);
        log.record(10, alice, EventKind::Paused);
        log.record(
            11,
            bob,
            EventKind::VoteCast {
                proposal_id: 0,
                support: VoteSupport::For,
                power: 300,
            },
        );
        log.record(12, alice, EventKind::ProposalExecuted { proposal_id: 1 });
        log.record(
            13,
            alice,
            EventKind::StakeRefunded {
                proposal_id: 0,
                recipient: alice,
                amount: 5,
                percentage: 50,
            },
        );
        log
    }

    #[test]
    fn test_sequence_numbers() {
        let log = sample_log();
        let seqs: Vec<u64> = log.all().iter().map(|e| e.sequence).collect();
        assert_eq!(seqs, vec![0, 1, 2, 3]);
        assert_eq!(log.since(2).len(), 2);
        assert!(log.since(99).is_empty());
    }

    #[test]
    fn test_query_by_proposal_and_actor() {
        let log = sample_log();
        let for_zero = log.query(&EventQuery {
            proposal_id: Some(0),
            ..EventQuery::default()
        });
        assert_eq!(for_zero.len(), 2);

        let by_alice = log.query(&EventQuery {
            actor: Some(Address::repeat(1)),
            limit: Some(2),
            ..EventQuery::default()
        });
        assert_eq!(
            by_alice.iter().map(|e| e.sequence).collect::<Vec<_>>(),
            vec![2, 3]
        );
    }

    #[test]
    fn test_json_lines_export() {
        let log = sample_log();
        let out = log.to_json_lines().unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 4);

        let vote: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(vote["kind"], "vote_cast");
        assert_eq!(vote["sequence"], 1);
        assert_eq!(vote["proposal_id"], 0);
        assert_eq!(vote["support"], "For");
        assert_eq!(vote["actor"], Address::repeat(2).to_string());

        let refund: serde_json::Value = serde_json::from_str(lines[3]).unwrap();
        assert_eq!(refund["recipient"], format!("0x{}", "01".repeat(20)));
    }
}
