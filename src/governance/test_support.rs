//! Shared fixtures for engine unit tests.

use super::{Collaborators, GovernanceParams, GovernanceSetup, Governor, ProposalAction, VoteSupport};
use crate::clock::MockClock;
use crate::error::GovernanceResult;
use crate::ledger::MockTokenLedger;
use crate::scheduler::{MockScheduler, ScheduledTarget};
use crate::treasury::MockTreasury;
use crate::types::{tokens, Address, Amount, ProposalId, Selector, Timestamp};
use std::sync::{Arc, Weak};

pub const T0: Timestamp = 1_700_000_000;

pub const ENGINE: Address = Address([0xe0; 20]);
pub const BRIDGE: Address = Address([0xb0; 20]);
pub const ADMIN: Address = Address([0xad; 20]);
pub const GUARDIAN: Address = Address([0x9a; 20]);
pub const PROPOSER: Address = Address([0x01; 20]);
pub const VOTER_X: Address = Address([0x0a; 20]);
pub const VOTER_Y: Address = Address([0x0b; 20]);
pub const VOTER_Z: Address = Address([0x0c; 20]);
pub const ANYONE: Address = Address([0x42; 20]);
pub const RECIPIENT: Address = Address([0x77; 20]);
pub const CALL_TARGET: Address = Address([0xca; 20]);
pub const ALLOWED_SELECTOR: Selector = Selector([0xa9, 0x05, 0x9c, 0xbb]);

pub struct Harness {
    pub governor: Arc<Governor>,
    pub ledger: MockTokenLedger,
    pub scheduler: MockScheduler,
    pub treasury: MockTreasury,
    pub clock: Arc<MockClock>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_params(GovernanceParams::default())
    }

    pub fn with_params(params: GovernanceParams) -> Self {
        let clock = Arc::new(MockClock::new(T0));
        let ledger = MockTokenLedger::new();
        let scheduler = MockScheduler::new(BRIDGE, clock.clone());
        let treasury = MockTreasury::new();

        let setup = GovernanceSetup {
            engine_address: ENGINE,
            params,
            administrators: vec![ADMIN],
            guardians: vec![GUARDIAN],
            allowed_selectors: vec![ALLOWED_SELECTOR],
            allowed_targets: vec![CALL_TARGET],
        };
        let collaborators = Collaborators {
            ledger: Arc::new(ledger.clone()),
            scheduler: Arc::new(scheduler.clone()),
            treasury: Arc::new(treasury.clone()),
            clock: clock.clone(),
        };
        let governor = Arc::new(Governor::new(setup, collaborators).unwrap());
        let weak: Weak<dyn ScheduledTarget> = Arc::downgrade(&governor) as Weak<dyn ScheduledTarget>;
        scheduler.attach(ENGINE, weak);

        Self {
            governor,
            ledger,
            scheduler,
            treasury,
            clock,
        }
    }

    pub fn general_action() -> ProposalAction {
        let mut payload = ALLOWED_SELECTOR.0.to_vec();
        payload.extend_from_slice(&[0u8; 32]);
        ProposalAction::General {
            target: CALL_TARGET,
            payload,
        }
    }

    pub async fn create_general(&self, proposer: Address) -> GovernanceResult<ProposalId> {
        self.governor
            .create_proposal(&proposer, "call the target", Self::general_action())
            .await
    }

    /// Fund the proposer and create a proposal with `action`.
    pub async fn create(&self, action: ProposalAction) -> ProposalId {
        if self.ledger.balance(&PROPOSER) < tokens(100) {
            self.ledger.set_balance(PROPOSER, tokens(150));
        }
        self.governor
            .create_proposal(&PROPOSER, "test proposal", action)
            .await
            .unwrap()
    }

    pub async fn active_proposal(&self) -> ProposalId {
        self.create(Self::general_action()).await
    }

    /// Cast a vote with an explicit power at the proposal's snapshot.
    pub async fn vote(&self, voter: Address, id: ProposalId, power: Amount, support: VoteSupport) {
        let snapshot = self.governor.proposal(id).unwrap().snapshot;
        self.ledger.set_voting_power(snapshot, voter, power);
        self.governor.cast_vote(&voter, id, support).await.unwrap();
    }

    /// Pass `id` with exactly quorum and close voting.
    pub async fn pass(&self, id: ProposalId) {
        self.vote(VOTER_X, id, tokens(500), VoteSupport::For).await;
        let deadline = self.governor.proposal(id).unwrap().deadline;
        self.clock.set(deadline);
    }

    pub async fn succeeded_proposal(&self) -> ProposalId {
        let id = self.active_proposal().await;
        self.pass(id).await;
        id
    }

    /// Pass, queue and run `action` through the scheduler.
    pub async fn execute(&self, action: ProposalAction) -> GovernanceResult<ProposalId> {
        let id = self.create(action).await;
        self.pass(id).await;
        self.governor.queue_proposal(&ANYONE, id).await?;
        self.clock.advance(172_800);
        self.governor.execute_proposal(&ANYONE, id).await?;
        Ok(id)
    }
}
