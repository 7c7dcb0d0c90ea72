//! Proposal state derivation.
//!
//! State is recomputed from flags, tallies and time on every read. The check
//! order is fixed: Canceled, Executed, Active, Defeated, Succeeded, and only
//! then the scheduler lookup that separates Queued from Expired.

use super::proposal::{Proposal, ProposalState};
use crate::scheduler::JobDetails;
use crate::types::{Amount, Fingerprint, Timestamp};

/// Outcome of the local part of the derivation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Derivation {
    Resolved(ProposalState),
    /// Queued; the scheduler decides between Queued and Expired.
    AwaitScheduler(Fingerprint),
}

/// Everything that can be decided without the scheduler.
pub fn derive_local(proposal: &Proposal, now: Timestamp, quorum: Amount) -> Derivation {
    let flags = &proposal.flags;
    if flags.canceled() {
        return Derivation::Resolved(ProposalState::Canceled);
    }
    if flags.executed() {
        return Derivation::Resolved(ProposalState::Executed);
    }
    if now < proposal.deadline {
        return Derivation::Resolved(ProposalState::Active);
    }
    if !vote_succeeded(proposal.tally.yes, proposal.tally.no, proposal.tally.total(), quorum) {
        return Derivation::Resolved(ProposalState::Defeated);
    }
    if !flags.queued() {
        return Derivation::Resolved(ProposalState::Succeeded);
    }
    match proposal.fingerprint {
        Some(fp) => Derivation::AwaitScheduler(fp),
        None => Derivation::Resolved(ProposalState::Queued),
    }
}

/// Quorum law: strictly more yes than no, and participation at least quorum.
pub fn vote_succeeded(yes: Amount, no: Amount, total: Amount, quorum: Amount) -> bool {
    yes > no && total >= quorum
}

/// Queued vs Expired from the scheduler's view of the job.
pub fn resolve_queued(job: &JobDetails, grace_period: u64, now: Timestamp) -> ProposalState {
    if !job.executed && now > job.eta.saturating_add(grace_period) {
        ProposalState::Expired
    } else {
        ProposalState::Queued
    }
}
