//! Append-only proposal store with per-proposal voter ledgers.

use super::proposal::{Proposal, VoterRecord, VoteTotals};
use crate::error::{GovernanceError, GovernanceResult};
use crate::types::{Address, ProposalId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Voters of one proposal: a record map plus the order voters arrived in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoterLedger {
    records: BTreeMap<Address, VoterRecord>,
    order: Vec<Address>,
}

impl VoterLedger {
    pub fn get(&self, voter: &Address) -> Option<&VoterRecord> {
        self.records.get(voter)
    }

    pub fn has_voted(&self, voter: &Address) -> bool {
        self.records.contains_key(voter)
    }

    pub fn voters(&self) -> &[Address] {
        &self.order
    }

    pub fn unique_voters(&self) -> u64 {
        self.order.len() as u64
    }

    /// Record a vote. A record, once present, is never replaced.
    pub(crate) fn record(&mut self, voter: Address, record: VoterRecord) -> GovernanceResult<()> {
        if self.records.contains_key(&voter) {
            return Err(GovernanceError::AlreadyVoted);
        }
        self.records.insert(voter, record);
        self.order.push(voter);
        Ok(())
    }
}

/// Sequential proposal records, indexed by id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalStore {
    proposals: Vec<Proposal>,
    ledgers: Vec<VoterLedger>,
}

impl ProposalStore {
    pub fn len(&self) -> u64 {
        self.proposals.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.proposals.is_empty()
    }

    pub fn next_id(&self) -> ProposalId {
        self.len()
    }

    /// Append a proposal. Its id must be the next sequential id.
    pub(crate) fn push(&mut self, proposal: Proposal) -> ProposalId {
        debug_assert_eq!(proposal.id, self.next_id());
        let id = proposal.id;
        self.proposals.push(proposal);
        self.ledgers.push(VoterLedger::default());
        id
    }

    pub fn get(&self, id: ProposalId) -> GovernanceResult<&Proposal> {
        self.proposals
            .get(id as usize)
            .ok_or(GovernanceError::InvalidProposalId(id))
    }

    pub(crate) fn get_mut(&mut self, id: ProposalId) -> GovernanceResult<&mut Proposal> {
        self.proposals
            .get_mut(id as usize)
            .ok_or(GovernanceError::InvalidProposalId(id))
    }

    pub fn ledger(&self, id: ProposalId) -> GovernanceResult<&VoterLedger> {
        self.ledgers
            .get(id as usize)
            .ok_or(GovernanceError::InvalidProposalId(id))
    }

    /// Proposal and its voter ledger, mutably.
    pub(crate) fn entry_mut(
        &mut self,
        id: ProposalId,
    ) -> GovernanceResult<(&mut Proposal, &mut VoterLedger)> {
        let idx = id as usize;
        match (self.proposals.get_mut(idx), self.ledgers.get_mut(idx)) {
            (Some(p), Some(l)) => Ok((p, l)),
            _ => Err(GovernanceError::InvalidProposalId(id)),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Proposal> {
        self.proposals.iter()
    }

    pub fn vote_totals(&self, id: ProposalId) -> GovernanceResult<VoteTotals> {
        let proposal = self.get(id)?;
        let ledger = self.ledger(id)?;
        Ok(VoteTotals {
            yes: proposal.tally.yes,
            no: proposal.tally.no,
            abstain: proposal.tally.abstain,
            unique_voters: ledger.unique_voters(),
        })
    }

    /// Structural checks for a decoded store.
    pub fn check_consistency(&self) -> GovernanceResult<()> {
        if self.proposals.len() != self.ledgers.len() {
            return Err(GovernanceError::Persistence(
                "proposal and voter ledger counts differ".to_string(),
            ));
        }
        for (idx, (proposal, ledger)) in self.proposals.iter().zip(&self.ledgers).enumerate() {
            if proposal.id != idx as u64 {
                return Err(GovernanceError::Persistence(format!(
                    "proposal at index {} has id {}",
                    idx, proposal.id
                )));
            }
            if !proposal.flags.is_consistent() {
                return Err(GovernanceError::Persistence(format!(
                    "proposal {} has contradictory flags",
                    proposal.id
                )));
            }
            if ledger.order.len() != ledger.records.len() {
                return Err(GovernanceError::Persistence(format!(
                    "proposal {} voter list does not match records",
                    proposal.id
                )));
            }
        }
        Ok(())
    }
}
