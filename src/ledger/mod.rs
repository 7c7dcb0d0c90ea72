//! Governance token ledger boundary.
//!
//! - Voting power is always read at a frozen snapshot
//! - Stakes move through ordinary transfers into engine custody
//! - Mock-friendly trait abstraction for testing

pub mod mock;
pub mod traits;

pub use mock::MockTokenLedger;
pub use traits::{LedgerError, LedgerResult, TokenLedger};
