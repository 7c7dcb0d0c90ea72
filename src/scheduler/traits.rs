//! Trait abstractions for the delayed-execution scheduler.
//!
//! The scheduler owns delay selection. The engine hands it a job, gets a
//! fingerprint back, and later receives the job payload through
//! [`ScheduledTarget`] once the delay has elapsed.

use crate::types::{Address, Amount, Fingerprint, Timestamp};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Result type for scheduler operations.
pub type SchedulerResult<T> = Result<T, SchedulerError>;

/// Scheduler errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchedulerError {
    #[error("unknown job {0}")]
    UnknownJob(Fingerprint),

    #[error("job not ready: eta {eta}, now {now}")]
    NotReady { eta: Timestamp, now: Timestamp },

    #[error("grace period elapsed")]
    GracePeriodElapsed,

    #[error("job still within grace period")]
    StillInGrace,

    #[error("job already executed")]
    AlreadyExecuted,

    #[error("job canceled")]
    Canceled,

    #[error("no callback target registered for {0}")]
    NoTarget(Address),

    #[error("scheduled call reverted: {0}")]
    CallReverted(String),

    #[error("scheduler unavailable: {0}")]
    Unavailable(String),
}

/// Risk tier the scheduler assigns to a job. Each tier maps to a delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskTier {
    Low,
    Medium,
    High,
}

impl RiskTier {
    pub fn delay_secs(&self) -> u64 {
        match self {
            RiskTier::Low => 86_400,
            RiskTier::Medium => 172_800,
            RiskTier::High => 604_800,
        }
    }
}

impl fmt::Display for RiskTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskTier::Low => write!(f, "low"),
            RiskTier::Medium => write!(f, "medium"),
            RiskTier::High => write!(f, "high"),
        }
    }
}

/// Scheduler view of a job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobDetails {
    pub target: Address,
    pub value: Amount,
    pub payload: Vec<u8>,
    pub eta: Timestamp,
    pub executed: bool,
}

/// Delayed-execution service.
#[async_trait]
pub trait SchedulerBridge: Send + Sync {
    /// Identity the scheduler uses when calling back into a target.
    fn address(&self) -> Address;

    /// Schedule a call; the scheduler picks the tier and delay.
    async fn schedule_with_risk_tier(
        &self,
        target: &Address,
        value: Amount,
        payload: &[u8],
    ) -> SchedulerResult<Fingerprint>;

    /// Run a job whose eta has passed and whose grace period has not.
    async fn execute(&self, fingerprint: &Fingerprint) -> SchedulerResult<()>;

    /// Run a job whose grace period has elapsed.
    async fn execute_after_grace(&self, fingerprint: &Fingerprint) -> SchedulerResult<()>;

    async fn cancel(&self, fingerprint: &Fingerprint) -> SchedulerResult<()>;

    /// True while the job exists and is neither executed nor canceled.
    async fn is_scheduled(&self, fingerprint: &Fingerprint) -> SchedulerResult<bool>;

    async fn job_details(&self, fingerprint: &Fingerprint) -> SchedulerResult<JobDetails>;

    async fn grace_period_secs(&self) -> SchedulerResult<u64>;
}

/// Receiver of scheduled calls.
///
/// `caller` is the scheduler's own address; `payload` is exactly what was
/// handed to [`SchedulerBridge::schedule_with_risk_tier`]. An `Err` reverts
/// the job on the scheduler side.
#[async_trait]
pub trait ScheduledTarget: Send + Sync {
    async fn on_scheduled_call(&self, caller: &Address, payload: &[u8]) -> Result<(), String>;
}
