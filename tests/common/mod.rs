//! Shared engine fixture for integration tests.

#![allow(dead_code)]

use stakegov::clock::MockClock;
use stakegov::governance::{GovernanceParams, GovernanceSetup, Governor, ProposalAction};
use stakegov::ledger::MockTokenLedger;
use stakegov::scheduler::{MockScheduler, ScheduledTarget};
use stakegov::treasury::{MockTreasury, Treasury};
use stakegov::types::{Address, Selector, Timestamp};
use stakegov::Collaborators;
use std::sync::{Arc, Weak};

pub const T0: Timestamp = 1_700_000_000;
pub const DAY: u64 = 86_400;

pub const ENGINE: Address = Address([0xe0; 20]);
pub const BRIDGE: Address = Address([0xb0; 20]);
pub const ADMIN: Address = Address([0xad; 20]);
pub const GUARDIAN: Address = Address([0x9a; 20]);
pub const PROPOSER: Address = Address([0x01; 20]);
pub const X: Address = Address([0x0a; 20]);
pub const Y: Address = Address([0x0b; 20]);
pub const Z: Address = Address([0x0c; 20]);
pub const KEEPER: Address = Address([0x42; 20]);
pub const TARGET: Address = Address([0xca; 20]);
pub const SELECTOR: Selector = Selector([0xa9, 0x05, 0x9c, 0xbb]);

pub struct Engine {
    pub governor: Arc<Governor>,
    pub ledger: MockTokenLedger,
    pub scheduler: MockScheduler,
    pub treasury: MockTreasury,
    pub clock: Arc<MockClock>,
}

pub fn setup(params: GovernanceParams) -> GovernanceSetup {
    GovernanceSetup {
        engine_address: ENGINE,
        params,
        administrators: vec![ADMIN],
        guardians: vec![GUARDIAN],
        allowed_selectors: vec![SELECTOR],
        allowed_targets: vec![TARGET],
    }
}

impl Engine {
    pub fn new() -> Self {
        let treasury = MockTreasury::new();
        Self::with_treasury(Arc::new(treasury.clone()), treasury)
    }

    /// Engine whose collaborators use `treasury` instead of the mock.
    /// `mock` is still returned for funding and inspection.
    pub fn with_treasury(treasury: Arc<dyn Treasury>, mock: MockTreasury) -> Self {
        let clock = Arc::new(MockClock::new(T0));
        let ledger = MockTokenLedger::new();
        let scheduler = MockScheduler::new(BRIDGE, clock.clone());

        let collaborators = Collaborators {
            ledger: Arc::new(ledger.clone()),
            scheduler: Arc::new(scheduler.clone()),
            treasury,
            clock: clock.clone(),
        };
        let governor = Arc::new(
            Governor::new(setup(GovernanceParams::default()), collaborators).unwrap(),
        );
        let weak: Weak<dyn ScheduledTarget> = Arc::downgrade(&governor) as Weak<dyn ScheduledTarget>;
        scheduler.attach(ENGINE, weak);

        Self {
            governor,
            ledger,
            scheduler,
            treasury: mock,
            clock,
        }
    }

    pub fn collaborators(&self) -> Collaborators {
        Collaborators {
            ledger: Arc::new(self.ledger.clone()),
            scheduler: Arc::new(self.scheduler.clone()),
            treasury: Arc::new(self.treasury.clone()),
            clock: self.clock.clone(),
        }
    }
}

pub fn general_call() -> ProposalAction {
    let mut payload = SELECTOR.0.to_vec();
    payload.extend_from_slice(&[0u8; 32]);
    ProposalAction::General {
        target: TARGET,
        payload,
    }
}
