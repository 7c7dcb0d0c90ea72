//! Mock scheduler for testing.
//!
//! Assigns risk tiers by call selector, tracks etas against a shared
//! [`MockClock`], and delivers payloads to attached [`ScheduledTarget`]s.

use super::traits::*;
use crate::clock::{Clock, MockClock};
use crate::types::{Address, Amount, Fingerprint, Selector, Timestamp};
use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, Weak};

/// Default grace period: 7 days.
pub const DEFAULT_GRACE_PERIOD_SECS: u64 = 604_800;

/// Mock delayed-execution scheduler.
#[derive(Clone)]
pub struct MockScheduler {
    address: Address,
    clock: Arc<MockClock>,
    state: Arc<Mutex<MockState>>,
}

struct MockState {
    jobs: BTreeMap<Fingerprint, MockJob>,
    targets: BTreeMap<Address, Weak<dyn ScheduledTarget>>,
    tier_overrides: BTreeMap<Selector, RiskTier>,
    default_tier: RiskTier,
    grace_period: u64,
    nonce: u64,
    unavailable: bool,
    execute_calls: u64,
}

#[derive(Debug, Clone)]
struct MockJob {
    details: JobDetails,
    tier: RiskTier,
    canceled: bool,
}

impl MockScheduler {
    pub fn new(address: Address, clock: Arc<MockClock>) -> Self {
        Self {
            address,
            clock,
            state: Arc::new(Mutex::new(MockState {
                jobs: BTreeMap::new(),
                targets: BTreeMap::new(),
                tier_overrides: BTreeMap::new(),
                default_tier: RiskTier::Medium,
                grace_period: DEFAULT_GRACE_PERIOD_SECS,
                nonce: 0,
                unavailable: false,
                execute_calls: 0,
            })),
        }
    }

    /// Register the receiver for jobs targeting `address`.
    pub fn attach(&self, address: Address, target: Weak<dyn ScheduledTarget>) {
        let mut s = self.state.lock().unwrap();
        s.targets.insert(address, target);
    }

    pub fn set_tier_for_selector(&self, selector: Selector, tier: RiskTier) {
        let mut s = self.state.lock().unwrap();
        s.tier_overrides.insert(selector, tier);
    }

    pub fn set_default_tier(&self, tier: RiskTier) {
        let mut s = self.state.lock().unwrap();
        s.default_tier = tier;
    }

    pub fn set_grace_period(&self, secs: u64) {
        let mut s = self.state.lock().unwrap();
        s.grace_period = secs;
    }

    /// Make every call fail with `SchedulerError::Unavailable`.
    pub fn set_unavailable(&self, unavailable: bool) {
        let mut s = self.state.lock().unwrap();
        s.unavailable = unavailable;
    }

    pub fn tier_of(&self, fingerprint: &Fingerprint) -> Option<RiskTier> {
        let s = self.state.lock().unwrap();
        s.jobs.get(fingerprint).map(|j| j.tier)
    }

    pub fn is_canceled(&self, fingerprint: &Fingerprint) -> bool {
        let s = self.state.lock().unwrap();
        s.jobs.get(fingerprint).map(|j| j.canceled).unwrap_or(false)
    }

    pub fn job_count(&self) -> usize {
        self.state.lock().unwrap().jobs.len()
    }

    /// Number of `execute`/`execute_after_grace` requests received.
    pub fn execute_calls(&self) -> u64 {
        self.state.lock().unwrap().execute_calls
    }

    fn check_available(s: &MockState) -> SchedulerResult<()> {
        if s.unavailable {
            return Err(SchedulerError::Unavailable("mock offline".to_string()));
        }
        Ok(())
    }

    /// Mark the job executed and hand back what must be delivered.
    fn claim_job(
        &self,
        fingerprint: &Fingerprint,
        after_grace: bool,
    ) -> SchedulerResult<(Arc<dyn ScheduledTarget>, Vec<u8>)> {
        let now = self.clock.now();
        let mut s = self.state.lock().unwrap();
        Self::check_available(&s)?;
        s.execute_calls += 1;
        let grace = s.grace_period;

        let job = s
            .jobs
            .get(fingerprint)
            .ok_or(SchedulerError::UnknownJob(*fingerprint))?;
        if job.canceled {
            return Err(SchedulerError::Canceled);
        }
        if job.details.executed {
            return Err(SchedulerError::AlreadyExecuted);
        }
        let eta = job.details.eta;
        if now < eta {
            return Err(SchedulerError::NotReady { eta, now });
        }
        let past_grace = now > eta.saturating_add(grace);
        if past_grace && !after_grace {
            return Err(SchedulerError::GracePeriodElapsed);
        }
        if !past_grace && after_grace {
            return Err(SchedulerError::StillInGrace);
        }

        let target_address = job.details.target;
        let payload = job.details.payload.clone();
        let target = s
            .targets
            .get(&target_address)
            .and_then(Weak::upgrade)
            .ok_or(SchedulerError::NoTarget(target_address))?;

        if let Some(job) = s.jobs.get_mut(fingerprint) {
            job.details.executed = true;
        }
        Ok((target, payload))
    }

    async fn run(&self, fingerprint: &Fingerprint, after_grace: bool) -> SchedulerResult<()> {
        let (target, payload) = self.claim_job(fingerprint, after_grace)?;

        if let Err(reason) = target.on_scheduled_call(&self.address, &payload).await {
            let mut s = self.state.lock().unwrap();
            if let Some(job) = s.jobs.get_mut(fingerprint) {
                job.details.executed = false;
            }
            return Err(SchedulerError::CallReverted(reason));
        }
        Ok(())
    }
}

#[async_trait]
impl SchedulerBridge for MockScheduler {
    fn address(&self) -> Address {
        self.address
    }

    async fn schedule_with_risk_tier(
        &self,
        target: &Address,
        value: Amount,
        payload: &[u8],
    ) -> SchedulerResult<Fingerprint> {
        let now = self.clock.now();
        let mut s = self.state.lock().unwrap();
        Self::check_available(&s)?;

        let tier = Selector::from_payload(payload)
            .and_then(|sel| s.tier_overrides.get(&sel).copied())
            .unwrap_or(s.default_tier);

        let mut hasher = Sha256::new();
        hasher.update(target.as_bytes());
        hasher.update(value.to_be_bytes());
        hasher.update(payload);
        hasher.update(s.nonce.to_be_bytes());
        let fingerprint = Fingerprint(hasher.finalize().into());
        s.nonce += 1;

        let eta: Timestamp = now + tier.delay_secs();
        s.jobs.insert(
            fingerprint,
            MockJob {
                details: JobDetails {
                    target: *target,
                    value,
                    payload: payload.to_vec(),
                    eta,
                    executed: false,
                },
                tier,
                canceled: false,
            },
        );
        Ok(fingerprint)
    }

    async fn execute(&self, fingerprint: &Fingerprint) -> SchedulerResult<()> {
        self.run(fingerprint, false).await
    }

    async fn execute_after_grace(&self, fingerprint: &Fingerprint) -> SchedulerResult<()> {
        self.run(fingerprint, true).await
    }

    async fn cancel(&self, fingerprint: &Fingerprint) -> SchedulerResult<()> {
        let mut s = self.state.lock().unwrap();
        Self::check_available(&s)?;
        let job = s
            .jobs
            .get_mut(fingerprint)
            .ok_or(SchedulerError::UnknownJob(*fingerprint))?;
        if job.details.executed {
            return Err(SchedulerError::AlreadyExecuted);
        }
        job.canceled = true;
        Ok(())
    }

    async fn is_scheduled(&self, fingerprint: &Fingerprint) -> SchedulerResult<bool> {
        let s = self.state.lock().unwrap();
        Self::check_available(&s)?;
        Ok(s.jobs
            .get(fingerprint)
            .map(|j| !j.canceled && !j.details.executed)
            .unwrap_or(false))
    }

    async fn job_details(&self, fingerprint: &Fingerprint) -> SchedulerResult<JobDetails> {
        let s = self.state.lock().unwrap();
        Self::check_available(&s)?;
        s.jobs
            .get(fingerprint)
            .map(|j| j.details.clone())
            .ok_or(SchedulerError::UnknownJob(*fingerprint))
    }

    async fn grace_period_secs(&self) -> SchedulerResult<u64> {
        let s = self.state.lock().unwrap();
        Self::check_available(&s)?;
        Ok(s.grace_period)
    }
}
