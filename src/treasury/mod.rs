//! Engine treasury boundary (native funds, external tokens, forwarded calls).

pub mod mock;
pub mod traits;

pub use mock::MockTreasury;
pub use traits::{Treasury, TreasuryError, TreasuryResult};
