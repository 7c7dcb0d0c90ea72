//! A forwarded call that re-enters the engine must be refused while the
//! outer execution is still running.

mod common;

use async_trait::async_trait;
use common::*;
use stakegov::governance::{ProposalState, VoteSupport};
use stakegov::treasury::{MockTreasury, Treasury, TreasuryResult};
use stakegov::types::{tokens, Address, Amount, ProposalId};
use stakegov::{GovernanceError, Governor};
use std::sync::{Arc, Mutex, OnceLock, Weak};

/// Engine operation a forwarded call attempts against proposal 1.
#[derive(Debug, Clone, Copy)]
enum Reentry {
    Create,
    Vote,
    Cancel,
    Queue,
    ClaimRefund,
}

impl Reentry {
    async fn run(self, governor: &Governor) -> Result<(), GovernanceError> {
        match self {
            Reentry::Create => governor
                .create_proposal(&PROPOSER, "nested", general_call())
                .await
                .map(|_| ()),
            Reentry::Vote => governor
                .cast_vote(&TARGET, SECOND, VoteSupport::For)
                .await
                .map(|_| ()),
            Reentry::Cancel => governor.cancel_proposal(&GUARDIAN, SECOND).await,
            Reentry::Queue => governor.queue_proposal(&KEEPER, SECOND).await.map(|_| ()),
            Reentry::ClaimRefund => governor
                .claim_partial_stake_refund(&PROPOSER, SECOND)
                .await
                .map(|_| ()),
        }
    }
}

const FIRST: ProposalId = 0;
const SECOND: ProposalId = 1;

/// Treasury whose forwarded calls run one nested engine operation.
struct ReenteringTreasury {
    inner: MockTreasury,
    reentry: Reentry,
    governor: OnceLock<Weak<Governor>>,
    observed: Mutex<Vec<Result<(), GovernanceError>>>,
}

#[async_trait]
impl Treasury for ReenteringTreasury {
    async fn native_balance(&self) -> TreasuryResult<Amount> {
        self.inner.native_balance().await
    }

    async fn send_native(&self, to: &Address, amount: Amount) -> TreasuryResult<()> {
        self.inner.send_native(to, amount).await
    }

    async fn transfer_external(
        &self,
        token: &Address,
        to: &Address,
        amount: Amount,
    ) -> TreasuryResult<()> {
        self.inner.transfer_external(token, to, amount).await
    }

    async fn forward_call(&self, target: &Address, payload: &[u8]) -> TreasuryResult<Vec<u8>> {
        if let Some(governor) = self.governor.get().and_then(Weak::upgrade) {
            let result = self.reentry.run(&governor).await;
            self.observed.lock().unwrap().push(result);
        }
        self.inner.forward_call(target, payload).await
    }
}

/// Creates two proposals, puts the second where `reentry` would succeed on
/// its own, then executes the first one.
async fn execute_first(reentry: Reentry) -> (Engine, Arc<ReenteringTreasury>) {
    let mock = MockTreasury::new();
    let treasury = Arc::new(ReenteringTreasury {
        inner: mock.clone(),
        reentry,
        governor: OnceLock::new(),
        observed: Mutex::new(Vec::new()),
    });
    let e = Engine::with_treasury(treasury.clone(), mock);
    let _ = treasury.governor.set(Arc::downgrade(&e.governor));
    e.ledger.set_balance(PROPOSER, tokens(150));

    let first = e
        .governor
        .create_proposal(&PROPOSER, "call the target", general_call())
        .await
        .unwrap();
    let second = e
        .governor
        .create_proposal(&PROPOSER, "second call", general_call())
        .await
        .unwrap();
    assert_eq!((first, second), (FIRST, SECOND));

    let snapshot = e.governor.proposal(first).unwrap().snapshot;
    e.ledger.set_voting_power(snapshot, X, tokens(500));
    e.governor.cast_vote(&X, first, VoteSupport::For).await.unwrap();

    match reentry {
        Reentry::Vote => {
            let snapshot = e.governor.proposal(second).unwrap().snapshot;
            e.ledger.set_voting_power(snapshot, TARGET, tokens(10));
        }
        Reentry::Cancel | Reentry::Queue => {
            let snapshot = e.governor.proposal(second).unwrap().snapshot;
            e.ledger.set_voting_power(snapshot, X, tokens(500));
            e.governor.cast_vote(&X, second, VoteSupport::For).await.unwrap();
        }
        Reentry::ClaimRefund => {
            e.governor.cancel_proposal(&PROPOSER, second).await.unwrap();
        }
        Reentry::Create => {}
    }

    e.clock.set(T0 + DAY + 1);
    e.governor.queue_proposal(&KEEPER, first).await.unwrap();
    e.clock.advance(172_800);
    e.governor.execute_proposal(&KEEPER, first).await.unwrap();

    assert_eq!(
        e.governor.get_proposal_state(first).await.unwrap(),
        ProposalState::Executed
    );
    assert_eq!(
        *treasury.observed.lock().unwrap(),
        vec![Err(GovernanceError::Reentrant)]
    );
    (e, treasury)
}

#[tokio::test]
async fn test_vote_from_forwarded_call_is_reentrant() {
    let (e, _) = execute_first(Reentry::Vote).await;
    assert!(e.governor.voter_record(SECOND, &TARGET).unwrap().is_none());

    // Outside an execution the vote gets past the lock and fails on the deadline.
    assert_eq!(
        e.governor.cast_vote(&TARGET, SECOND, VoteSupport::For).await,
        Err(GovernanceError::VotingEnded)
    );
}

#[tokio::test]
async fn test_refund_claim_from_forwarded_call_is_reentrant() {
    let (e, _) = execute_first(Reentry::ClaimRefund).await;
    assert!(!e.governor.proposal(SECOND).unwrap().flags.stake_refunded());

    let before = e.ledger.balance(&PROPOSER);
    let paid = e
        .governor
        .claim_partial_stake_refund(&PROPOSER, SECOND)
        .await
        .unwrap();
    assert_eq!(paid, tokens(1) / 2);
    assert_eq!(e.ledger.balance(&PROPOSER), before + paid);
}

#[tokio::test]
async fn test_cancel_from_forwarded_call_is_reentrant() {
    let (e, _) = execute_first(Reentry::Cancel).await;
    assert_eq!(
        e.governor.get_proposal_state(SECOND).await.unwrap(),
        ProposalState::Succeeded
    );

    e.governor.cancel_proposal(&GUARDIAN, SECOND).await.unwrap();
    assert_eq!(
        e.governor.get_proposal_state(SECOND).await.unwrap(),
        ProposalState::Canceled
    );
}

#[tokio::test]
async fn test_queue_from_forwarded_call_is_reentrant() {
    let (e, _) = execute_first(Reentry::Queue).await;
    assert_eq!(
        e.governor.get_proposal_state(SECOND).await.unwrap(),
        ProposalState::Succeeded
    );

    e.governor.queue_proposal(&KEEPER, SECOND).await.unwrap();
    assert_eq!(
        e.governor.get_proposal_state(SECOND).await.unwrap(),
        ProposalState::Queued
    );
}

#[tokio::test]
async fn test_create_from_forwarded_call_is_reentrant() {
    let (e, _) = execute_first(Reentry::Create).await;
    assert!(e.governor.proposal(2).is_err());

    let third = e
        .governor
        .create_proposal(&PROPOSER, "after execution", general_call())
        .await
        .unwrap();
    assert_eq!(third, 2);
}
