//! Trait abstraction for the governance token ledger.
//!
//! Balances, snapshots and supply changes live outside the engine; this is
//! the boundary the engine talks through.

use crate::types::{Address, Amount, SnapshotId};
use async_trait::async_trait;

/// Result type for ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Token ledger errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    #[error("insufficient balance: have {available}, need {required}")]
    InsufficientBalance { available: Amount, required: Amount },

    #[error("unknown snapshot: {0}")]
    UnknownSnapshot(SnapshotId),

    #[error("ledger rejected operation: {0}")]
    Rejected(String),
}

/// Governance token ledger.
#[async_trait]
pub trait TokenLedger: Send + Sync {
    /// Voting power of `voter` frozen at `snapshot`.
    async fn voting_power(&self, voter: &Address, snapshot: SnapshotId) -> LedgerResult<Amount>;

    /// Live balance of `account`.
    async fn balance_of(&self, account: &Address) -> LedgerResult<Amount>;

    /// Freeze current balances and return the snapshot id.
    async fn new_snapshot(&self) -> LedgerResult<SnapshotId>;

    /// Move `amount` from `from` to `to`.
    async fn transfer(&self, from: &Address, to: &Address, amount: Amount) -> LedgerResult<()>;

    /// Create `amount` new tokens for `to`.
    async fn mint(&self, to: &Address, amount: Amount) -> LedgerResult<()>;

    /// Destroy `amount` tokens held by `from`.
    async fn burn(&self, from: &Address, amount: Amount) -> LedgerResult<()>;
}
