//! Delayed-execution scheduler boundary.
//!
//! Queueing is fire-and-forget: the scheduler picks the delay, and the
//! engine only learns the outcome when the scheduler calls back.

pub mod mock;
pub mod traits;

pub use mock::MockScheduler;
pub use traits::{
    JobDetails, RiskTier, ScheduledTarget, SchedulerBridge, SchedulerError, SchedulerResult,
};
