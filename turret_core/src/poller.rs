//! Bounded waiting for physical conditions.
//!
//! Every loop that waits on the turret (stall detection, the sweep, positioning)
//! goes through `Poller::wait_until`, which probes at a fixed interval, honours
//! the operator abort input and gives up with `StallTimeout` after a deadline.

use std::sync::Arc;
use std::time::Duration;

use turret_traits::Clock;

use crate::error::{AbortReason, Motion, Result, TurretError};

/// Debounced, latching view of the operator abort input.
pub struct AbortLatch {
    check: Option<Box<dyn Fn() -> bool>>,
    debounce_n: u8,
    count: u8,
    latched: bool,
}

impl core::fmt::Debug for AbortLatch {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AbortLatch")
            .field("wired", &self.check.is_some())
            .field("debounce_n", &self.debounce_n)
            .field("latched", &self.latched)
            .finish()
    }
}

impl AbortLatch {
    pub fn new(check: Option<Box<dyn Fn() -> bool>>, debounce_n: u8) -> Self {
        Self {
            check,
            debounce_n: debounce_n.max(1),
            count: 0,
            latched: false,
        }
    }

    /// Sample the input once; returns true while latched.
    pub fn poll(&mut self) -> bool {
        if let Some(check) = &self.check {
            if check() {
                self.count = self.count.saturating_add(1);
                if self.count >= self.debounce_n {
                    self.latched = true;
                }
            } else {
                self.count = 0;
            }
        }
        self.latched
    }

    pub fn is_latched(&self) -> bool {
        self.latched
    }

    pub fn clear(&mut self) {
        self.count = 0;
        self.latched = false;
    }
}

/// Clock plus abort latch shared by every blocking stage of a cycle.
pub struct Poller {
    clock: Arc<dyn Clock + Send + Sync>,
    abort: AbortLatch,
}

impl core::fmt::Debug for Poller {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Poller").field("abort", &self.abort).finish()
    }
}

impl Poller {
    pub fn new(clock: Arc<dyn Clock + Send + Sync>, abort: AbortLatch) -> Self {
        Self { clock, abort }
    }

    pub fn clock(&self) -> Arc<dyn Clock + Send + Sync> {
        self.clock.clone()
    }

    pub fn abort_latch(&mut self) -> &mut AbortLatch {
        &mut self.abort
    }

    fn check_abort(&mut self) -> Result<()> {
        if self.abort.poll() {
            return Err(eyre::Report::new(TurretError::Abort(AbortReason::Estop)));
        }
        Ok(())
    }

    /// Probe until it returns true, sleeping `poll` in between.
    ///
    /// Returns the number of probes made. Fails with `StallTimeout` once
    /// `timeout` has elapsed without success, or with `Abort` when the abort
    /// input latches. Probe errors are returned as they are.
    pub fn wait_until<F>(
        &mut self,
        motion: Motion,
        poll: Duration,
        timeout: Duration,
        mut probe: F,
    ) -> Result<u32>
    where
        F: FnMut() -> Result<bool>,
    {
        let start = self.clock.now();
        let mut probes: u32 = 0;
        loop {
            self.check_abort()?;
            probes = probes.saturating_add(1);
            if probe()? {
                return Ok(probes);
            }
            let waited = self.clock.now().saturating_duration_since(start);
            if waited >= timeout {
                let waited_ms = waited.as_millis() as u64;
                tracing::warn!(%motion, waited_ms, probes, "bounded wait expired");
                return Err(eyre::Report::new(TurretError::StallTimeout {
                    motion,
                    waited_ms,
                }));
            }
            self.clock.sleep(poll);
        }
    }

    /// Sleep for `d`, honouring the abort input before and after.
    pub fn hold(&mut self, d: Duration) -> Result<()> {
        self.check_abort()?;
        self.clock.sleep(d);
        self.check_abort()
    }
}
