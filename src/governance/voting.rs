//! Snapshot-weighted voting.

use super::events::EventKind;
use super::proposal::{VoteSupport, VoterRecord};
use super::Governor;
use crate::error::{GovernanceError, GovernanceResult};
use crate::types::{Address, Amount, ProposalId};
use tracing::debug;

impl Governor {
    /// Cast a vote with the caller's power at the proposal snapshot.
    ///
    /// One vote per address per proposal. Voting closes at the deadline, the
    /// same instant the proposal stops reading Active. Returns the power
    /// counted.
    pub async fn cast_vote(
        &self,
        caller: &Address,
        id: ProposalId,
        support: VoteSupport,
    ) -> GovernanceResult<Amount> {
        let _op = self.op_lock.enter()?;
        self.ensure_not_paused()?;

        let now = self.now();
        let snapshot = {
            let s = self.state();
            let proposal = s.proposals.get(id)?;
            if proposal.flags.canceled() || proposal.flags.executed() || proposal.flags.queued() {
                return Err(GovernanceError::VotingEnded);
            }
            if s.proposals.ledger(id)?.has_voted(caller) {
                return Err(GovernanceError::AlreadyVoted);
            }
            if now >= proposal.deadline {
                return Err(GovernanceError::VotingEnded);
            }
            proposal.snapshot
        };

        let power = self.ledger.voting_power(caller, snapshot).await?;
        if power == 0 {
            return Err(GovernanceError::NoVotingPower);
        }

        {
            let mut s = self.state();
            let (proposal, ledger) = s.proposals.entry_mut(id)?;
            ledger.record(*caller, VoterRecord { support, power })?;
            proposal.tally.add(support, power);
        }

        debug!(proposal = id, voter = %caller, ?support, power, "vote cast");
        self.emit(
            caller,
            EventKind::VoteCast {
                proposal_id: id,
                support,
                power,
            },
        );
        Ok(power)
    }
}
