//! Operation-in-progress flag.
//!
//! Every proposal-mutating entry point takes the lock first. A nested call
//! that reaches the engine while an operation is running (for example from a
//! forwarded General call) fails with `Reentrant` instead of waiting.

use crate::error::{GovernanceError, GovernanceResult};
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug, Default)]
pub struct OperationLock {
    busy: AtomicBool,
}

impl OperationLock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enter(&self) -> GovernanceResult<OperationGuard<'_>> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| GovernanceError::Reentrant)?;
        Ok(OperationGuard { lock: self })
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

/// Clears the flag when dropped, including on early return and panic.
#[derive(Debug)]
pub struct OperationGuard<'a> {
    lock: &'a OperationLock,
}

impl Drop for OperationGuard<'_> {
    fn drop(&mut self) {
        self.lock.busy.store(false, Ordering::Release);
    }
}
