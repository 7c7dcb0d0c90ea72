//! Trait abstraction for the engine's treasury.
//!
//! Native funds, external tokens and General proposal calls are all effects
//! on the world outside the engine; they go through this seam.

use crate::types::{Address, Amount};
use async_trait::async_trait;

/// Result type for treasury operations.
pub type TreasuryResult<T> = Result<T, TreasuryError>;

/// Treasury errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TreasuryError {
    #[error("insufficient funds: have {available}, need {required}")]
    InsufficientFunds { available: Amount, required: Amount },

    #[error("transfer failed: {0}")]
    TransferFailed(String),

    #[error("call reverted: {0}")]
    CallReverted(String),
}

/// Engine-held funds and outbound calls.
#[async_trait]
pub trait Treasury: Send + Sync {
    /// Native funds held by the engine.
    async fn native_balance(&self) -> TreasuryResult<Amount>;

    async fn send_native(&self, to: &Address, amount: Amount) -> TreasuryResult<()>;

    /// Transfer `amount` of the external token `token` held by the engine.
    async fn transfer_external(
        &self,
        token: &Address,
        to: &Address,
        amount: Amount,
    ) -> TreasuryResult<()>;

    /// Forward an arbitrary call (selector + arguments) to `target`.
    async fn forward_call(&self, target: &Address, payload: &[u8]) -> TreasuryResult<Vec<u8>>;
}
