//! Manual teleoperation: map a mode and two push buttons onto motor commands.
//!
//! The mode comes from a colour sensor (codes 1-3 drive, 4-6 rotate). In drive
//! mode the buttons move the base and both together fire continuously; in
//! rotate mode they turn the turret and both together fire a charged shot whose
//! power grows with how long the buttons were held.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use turret_traits::{Clock, Motor};

use crate::config::{EngageCfg, ManualCfg};
use crate::engage::Engager;
use crate::error::{Result, TurretError};
use crate::hw_error::{hw, stop_quietly};
use crate::poller::{AbortLatch, Poller};

/// Holding longer than this always fires at full power.
pub const FULL_CHARGE_MS: u64 = 2500;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManualMode {
    Idle,
    Drive,
    Rotate,
}

impl ManualMode {
    pub fn from_colour(code: u8) -> Self {
        match code {
            1..=3 => Self::Drive,
            4..=6 => Self::Rotate,
            _ => Self::Idle,
        }
    }
}

impl FromStr for ManualMode {
    type Err = TurretError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "drive" => Ok(Self::Drive),
            "rotate" => Ok(Self::Rotate),
            "idle" => Ok(Self::Idle),
            other => other
                .parse::<u8>()
                .map(Self::from_colour)
                .map_err(|_| TurretError::Config(format!("unknown manual mode '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Buttons {
    pub left: bool,
    pub right: bool,
}

impl FromStr for Buttons {
    type Err = TurretError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let (left, right) = match s.to_ascii_lowercase().as_str() {
            "none" => (false, false),
            "left" => (true, false),
            "right" => (false, true),
            "both" => (true, true),
            other => {
                return Err(TurretError::Config(format!(
                    "unknown button state '{other}'"
                )));
            }
        };
        Ok(Self { left, right })
    }
}

/// What the controller did for one input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManualAction {
    Idle,
    Stopped,
    Drive(i8),
    /// Continuous fire at this (negative) power.
    Burst(i8),
    Rotate(i8),
    ChargedShot { power: u8 },
}

/// Charged-shot power for a button hold of `hold_ms`.
pub fn fire_power_for_hold(hold_ms: u64) -> u8 {
    if hold_ms > FULL_CHARGE_MS {
        return 100;
    }
    let p = (hold_ms / 500 + 7) * 10;
    p.min(100) as u8
}

/// Applies manual inputs to the turret, firing and drive motors.
pub struct ManualController<T: Motor, F: Motor, D: Motor> {
    turret: T,
    firing: F,
    drive: D,
    cfg: ManualCfg,
    engager: Engager,
    poller: Poller,
    last: Option<ManualAction>,
}

impl<T: Motor, F: Motor, D: Motor> core::fmt::Debug for ManualController<T, F, D> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ManualController")
            .field("cfg", &self.cfg)
            .field("last", &self.last)
            .finish()
    }
}

impl<T: Motor, F: Motor, D: Motor> ManualController<T, F, D> {
    pub fn new(
        turret: T,
        firing: F,
        drive: D,
        cfg: ManualCfg,
        engage: EngageCfg,
        clock: Arc<dyn Clock + Send + Sync>,
    ) -> Self {
        Self {
            turret,
            firing,
            drive,
            cfg,
            engager: Engager::new(engage),
            poller: Poller::new(clock, AbortLatch::new(None, 1)),
            last: None,
        }
    }

    /// Wire an abort input; a latched abort fails every later `apply`.
    pub fn with_estop_check<C>(mut self, check: C, debounce_n: u8) -> Self
    where
        C: Fn() -> bool + 'static,
    {
        let clock = self.poller.clock();
        self.poller = Poller::new(clock, AbortLatch::new(Some(Box::new(check)), debounce_n));
        self
    }

    pub fn last_action(&self) -> Option<ManualAction> {
        self.last
    }

    /// Apply one input sample. `hold_ms` is how long both buttons were held
    /// and only matters for a charged shot.
    pub fn apply(&mut self, mode: ManualMode, buttons: Buttons, hold_ms: u64) -> Result<ManualAction> {
        if self.poller.abort_latch().poll() {
            self.stop_all();
            return Err(eyre::Report::new(TurretError::Abort(
                crate::error::AbortReason::Estop,
            )));
        }
        let action = match mode {
            ManualMode::Idle => {
                self.stop_all();
                ManualAction::Idle
            }
            ManualMode::Drive => self.drive_input(buttons)?,
            ManualMode::Rotate => self.rotate_input(buttons, hold_ms)?,
        };
        if self.last != Some(action) {
            tracing::info!(?mode, ?buttons, ?action, "manual input");
        }
        self.last = Some(action);
        Ok(action)
    }

    fn drive_input(&mut self, b: Buttons) -> Result<ManualAction> {
        let p = self.cfg.drive_power;
        match (b.left, b.right) {
            (false, true) => {
                hw(self.drive.set_power(p), "drive forward")?;
                Ok(ManualAction::Drive(p))
            }
            (true, false) => {
                hw(self.drive.set_power(-p), "drive reverse")?;
                Ok(ManualAction::Drive(-p))
            }
            (true, true) => {
                hw(self.drive.stop(), "stop drive")?;
                let burst = -self.cfg.burst_power;
                hw(self.firing.set_power(burst), "burst fire")?;
                Ok(ManualAction::Burst(burst))
            }
            (false, false) => {
                hw(self.drive.stop(), "stop drive")?;
                hw(self.firing.stop(), "stop firing")?;
                Ok(ManualAction::Stopped)
            }
        }
    }

    fn rotate_input(&mut self, b: Buttons, hold_ms: u64) -> Result<ManualAction> {
        let p = self.cfg.rotate_power;
        match (b.left, b.right) {
            (false, true) => {
                hw(self.turret.set_power(p), "rotate right")?;
                Ok(ManualAction::Rotate(p))
            }
            (true, false) => {
                hw(self.turret.set_power(-p), "rotate left")?;
                Ok(ManualAction::Rotate(-p))
            }
            (true, true) => {
                hw(self.turret.stop(), "stop turret")?;
                let power = fire_power_for_hold(hold_ms);
                tracing::debug!(hold_ms, power, "charged shot");
                self.engager.fire(
                    &mut self.firing,
                    -(power as i8),
                    Duration::from_millis(u64::from(power)),
                    &mut self.poller,
                )?;
                Ok(ManualAction::ChargedShot { power })
            }
            (false, false) => {
                hw(self.turret.stop(), "stop turret")?;
                Ok(ManualAction::Stopped)
            }
        }
    }

    /// Stop every motor (best-effort).
    pub fn stop_all(&mut self) {
        stop_quietly(&mut self.turret, "turret");
        stop_quietly(&mut self.firing, "firing");
        stop_quietly(&mut self.drive, "drive");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn colour_codes_select_mode() {
        assert_eq!(ManualMode::from_colour(1), ManualMode::Drive);
        assert_eq!(ManualMode::from_colour(3), ManualMode::Drive);
        assert_eq!(ManualMode::from_colour(4), ManualMode::Rotate);
        assert_eq!(ManualMode::from_colour(6), ManualMode::Rotate);
        assert_eq!(ManualMode::from_colour(0), ManualMode::Idle);
        assert_eq!(ManualMode::from_colour(7), ManualMode::Idle);
    }

    #[test]
    fn charge_grows_with_hold_and_caps() {
        assert_eq!(fire_power_for_hold(0), 70);
        assert_eq!(fire_power_for_hold(499), 70);
        assert_eq!(fire_power_for_hold(500), 80);
        assert_eq!(fire_power_for_hold(1200), 90);
        assert_eq!(fire_power_for_hold(1500), 100);
        assert_eq!(fire_power_for_hold(2400), 100);
        assert_eq!(fire_power_for_hold(9000), 100);
    }

    #[test]
    fn parses_text_inputs() {
        assert_eq!("rotate".parse::<ManualMode>().unwrap(), ManualMode::Rotate);
        assert_eq!("2".parse::<ManualMode>().unwrap(), ManualMode::Drive);
        assert!("sideways".parse::<ManualMode>().is_err());
        assert_eq!(
            "both".parse::<Buttons>().unwrap(),
            Buttons {
                left: true,
                right: true
            }
        );
        assert!("middle".parse::<Buttons>().is_err());
    }
}
