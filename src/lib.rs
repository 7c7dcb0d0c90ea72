//! stakegov - token-weighted on-chain governance engine
//!
//! Proposals are backed by a stake, voted on with snapshot voting power, and
//! executed through an external delayed-execution scheduler.
//!
//! Key principles:
//! - Proposal state is derived on read, never stored
//! - Voting power is frozen at proposal creation
//! - Execution happens only when the scheduler calls back
//! - Stakes are refunded in full on execution, partially otherwise
//!
//! External systems (token ledger, scheduler, treasury, clock) sit behind
//! traits with in-crate mocks for testing.

pub mod clock;
pub mod config;
pub mod error;
pub mod governance;
pub mod ledger;
pub mod logging;
pub mod scheduler;
pub mod serialization;
pub mod treasury;
pub mod types;

pub use error::{GovernanceError, GovernanceResult};
pub use governance::{Collaborators, GovernanceSetup, Governor};
