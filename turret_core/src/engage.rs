//! Visit each target angle and fire.
//!
//! Positioning is open loop: drive forward until the encoder reaches or passes
//! the angle, then stop. There is no overshoot correction, so targets must be
//! visited in ascending order from the home position.

use std::time::Duration;

use turret_traits::{Motor, TurretDrive};

use crate::config::EngageCfg;
use crate::error::{Motion, Result};
use crate::homing::TurretCalibrator;
use crate::hw_error::{hw, stop_quietly};
use crate::poller::Poller;

#[derive(Debug, Clone)]
pub struct Engager {
    cfg: EngageCfg,
}

impl Engager {
    pub fn new(cfg: EngageCfg) -> Self {
        Self { cfg }
    }

    pub fn cfg(&self) -> &EngageCfg {
        &self.cfg
    }

    /// Drive forward until the encoder reads at least `angle`; returns the
    /// position at which the turret was stopped.
    pub fn position_to<T>(&self, turret: &mut T, angle: usize, poller: &mut Poller) -> Result<i32>
    where
        T: TurretDrive + ?Sized,
    {
        let goal = i64::try_from(angle).unwrap_or(i64::MAX);
        let mut reached = 0;
        hw(
            turret.set_power(self.cfg.positioning_power),
            "start positioning",
        )?;
        let res = poller.wait_until(
            Motion::Positioning,
            Duration::from_millis(self.cfg.poll_ms),
            Duration::from_millis(self.cfg.positioning_timeout_ms),
            || {
                reached = hw(turret.position(), "read turret encoder")?;
                Ok(i64::from(reached) >= goal)
            },
        );
        stop_quietly(turret, "positioning");
        res?;
        Ok(reached)
    }

    /// Pull the firing mechanism back to its rest position.
    pub fn reload<F>(&self, firing: &mut F, poller: &mut Poller) -> Result<()>
    where
        F: Motor + ?Sized,
    {
        hw(firing.stop(), "stop firing motor")?;
        poller.hold(Duration::from_millis(self.cfg.reload_settle_ms))?;
        hw(firing.set_power(self.cfg.reload_power), "pull back")?;
        let held = poller.hold(Duration::from_millis(self.cfg.reload_ms));
        stop_quietly(firing, "reload");
        held
    }

    /// Run the firing motor at `power` for `duration`, then reload.
    pub fn fire<F>(
        &self,
        firing: &mut F,
        power: i8,
        duration: Duration,
        poller: &mut Poller,
    ) -> Result<()>
    where
        F: Motor + ?Sized,
    {
        hw(firing.set_power(power), "fire")?;
        if let Err(e) = poller.hold(duration) {
            stop_quietly(firing, "fire");
            return Err(e);
        }
        self.reload(firing, poller)
    }

    /// Position to and fire at every angle in `targets`, in order.
    ///
    /// Returns the number of shots fired. The turret is left at the last target.
    pub fn fire_at_targets<T, F>(
        &self,
        turret: &mut T,
        firing: &mut F,
        targets: &[usize],
        firing_power: i8,
        poller: &mut Poller,
    ) -> Result<usize>
    where
        T: TurretDrive + ?Sized,
        F: Motor + ?Sized,
    {
        let fire_for = Duration::from_millis(self.cfg.fire_ms);
        for (i, &angle) in targets.iter().enumerate() {
            let at = self.position_to(turret, angle, poller)?;
            tracing::debug!(target = angle, stopped_at = at, "on target");
            self.fire(firing, firing_power, fire_for, poller)?;
            tracing::info!(shot = i + 1, angle, power = firing_power, "fired");
        }
        Ok(targets.len())
    }

    /// Engage all targets and return the turret to its home position.
    pub fn engage<T, F>(
        &self,
        turret: &mut T,
        firing: &mut F,
        targets: &[usize],
        firing_power: i8,
        calibrator: &TurretCalibrator,
        poller: &mut Poller,
    ) -> Result<usize>
    where
        T: TurretDrive + ?Sized,
        F: Motor + ?Sized,
    {
        let shots = self.fire_at_targets(turret, firing, targets, firing_power, poller)?;
        calibrator.home(turret, poller)?;
        Ok(shots)
    }
}
