//! Stall-detection homing of the turret against its lower mechanical stop.

use std::time::Duration;

use turret_traits::TurretDrive;

use crate::config::HomingCfg;
use crate::error::{Motion, Result};
use crate::hw_error::{hw, stop_quietly};
use crate::poller::Poller;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HomeReport {
    /// Encoder reading at the stall, before the origin was reset.
    pub stalled_at: i32,
    /// Encoder polls made, including the first one.
    pub polls: u32,
}

#[derive(Debug, Clone)]
pub struct TurretCalibrator {
    cfg: HomingCfg,
}

impl TurretCalibrator {
    pub fn new(cfg: HomingCfg) -> Self {
        Self { cfg }
    }

    /// Reverse into the stop until the encoder moves no more than the settle
    /// tolerance between two polls, then stop and zero the encoder.
    pub fn home<T>(&self, turret: &mut T, poller: &mut Poller) -> Result<HomeReport>
    where
        T: TurretDrive + ?Sized,
    {
        let tol = self.cfg.settle_tolerance;
        tracing::info!(power = -self.cfg.power, tol, "homing start");
        hw(turret.set_power(-self.cfg.power), "start homing")?;

        let mut last: Option<i32> = None;
        let res = poller.wait_until(
            Motion::Homing,
            Duration::from_millis(self.cfg.poll_ms),
            Duration::from_millis(self.cfg.timeout_ms),
            || {
                let pos = hw(turret.position(), "read turret encoder")?;
                let stalled = last.is_some_and(|prev| pos.abs_diff(prev) <= tol);
                tracing::debug!(pos, prev = ?last, stalled, "homing poll");
                last = Some(pos);
                Ok(stalled)
            },
        );
        stop_quietly(turret, "homing");
        let polls = res?;

        let stalled_at = last.unwrap_or_default();
        hw(turret.reset_position(), "reset turret encoder")?;
        tracing::info!(stalled_at, polls, "homing done");
        Ok(HomeReport { stalled_at, polls })
    }
}
