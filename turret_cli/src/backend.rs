//! Device assembly: the simulated world or the GPIO backend, plus the abort input.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use turret_config::{Config, ScanProfile};
use turret_hardware::{SimConfig, SimTarget, SimWorld};
use turret_traits::{Clock, MonotonicClock, Motor, RangeFinder, TurretDrive, VirtualClock};

pub type BoxedRangeFinder = Box<dyn RangeFinder + Send>;
pub type BoxedTurret = Box<dyn TurretDrive + Send>;
pub type BoxedMotor = Box<dyn Motor + Send>;
pub type EstopCheck = Box<dyn Fn() -> bool + Send + Sync>;

/// Time source shared by the engine and, in simulation, the simulated world.
#[derive(Debug, Clone)]
pub enum BackendClock {
    Real,
    Virtual(VirtualClock),
}

impl BackendClock {
    pub fn boxed(&self) -> Box<dyn Clock + Send + Sync> {
        match self {
            Self::Real => Box::new(MonotonicClock::new()),
            Self::Virtual(c) => Box::new(c.clone()),
        }
    }

    pub fn shared(&self) -> Arc<dyn Clock + Send + Sync> {
        match self {
            Self::Real => Arc::new(MonotonicClock::new()),
            Self::Virtual(c) => Arc::new(c.clone()),
        }
    }
}

pub struct Backend {
    pub name: &'static str,
    pub sensor: BoxedRangeFinder,
    pub turret: BoxedTurret,
    pub firing: BoxedMotor,
    /// Drive train; only manual mode needs it and the GPIO wiring may omit it.
    pub drive: Option<BoxedMotor>,
    pub clock: BackendClock,
    pub estop_check: Option<EstopCheck>,
    pub sim: Option<SimWorld>,
}

impl core::fmt::Debug for Backend {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Backend")
            .field("name", &self.name)
            .field("clock", &self.clock)
            .field("has_drive", &self.drive.is_some())
            .field("has_estop", &self.estop_check.is_some())
            .finish()
    }
}

/// Build the devices for this binary: GPIO when compiled with the `hardware`
/// feature on Linux, the simulator otherwise.
///
/// `shutdown` is the Ctrl-C flag; it is OR-ed into the abort input.
pub fn build(
    cfg: &Config,
    profile: Option<&ScanProfile>,
    shutdown: Arc<AtomicBool>,
) -> eyre::Result<Backend> {
    #[cfg(all(feature = "hardware", target_os = "linux"))]
    {
        if profile.is_some() {
            tracing::warn!("--profile only applies to the simulator; ignoring");
        }
        build_hardware(cfg, shutdown)
    }
    #[cfg(not(all(feature = "hardware", target_os = "linux")))]
    {
        Ok(build_sim(cfg, profile, shutdown))
    }
}

pub fn sim_config(cfg: &turret_config::SimCfg, profile: Option<&ScanProfile>) -> SimConfig {
    SimConfig {
        start_deg: cfg.start_deg,
        deg_per_sec_per_power: cfg.deg_per_sec_per_power,
        upper_stop_deg: cfg.upper_stop_deg,
        background_cm: cfg.background_cm,
        dropout_every: cfg.dropout_every,
        targets: cfg
            .targets
            .iter()
            .map(|t| SimTarget {
                start_deg: t.start_deg,
                end_deg: t.end_deg,
                distance_cm: t.distance_cm,
            })
            .collect(),
        profile: profile.map(|p| p.to_dense(cfg.background_cm)),
        jammed: cfg.jammed,
        encoder_fault: cfg.encoder_fault,
    }
}

#[cfg_attr(all(feature = "hardware", target_os = "linux"), allow(dead_code))]
pub fn build_sim(cfg: &Config, profile: Option<&ScanProfile>, shutdown: Arc<AtomicBool>) -> Backend {
    let clock = if cfg.sim.virtual_clock {
        BackendClock::Virtual(VirtualClock::new())
    } else {
        BackendClock::Real
    };
    let world = SimWorld::new(sim_config(&cfg.sim, profile), clock.shared());
    tracing::info!(
        targets = cfg.sim.targets.len(),
        profile = profile.is_some(),
        virtual_clock = cfg.sim.virtual_clock,
        "simulated backend"
    );
    Backend {
        name: "sim",
        sensor: Box::new(world.range_finder()),
        turret: Box::new(world.turret()),
        firing: Box::new(world.firing_motor()),
        drive: Some(Box::new(world.drive_motor())),
        clock,
        estop_check: Some(shutdown_check(shutdown, None)),
        sim: Some(world),
    }
}

/// Abort input: Ctrl-C, optionally OR-ed with a GPIO checker.
fn shutdown_check(shutdown: Arc<AtomicBool>, gpio: Option<EstopCheck>) -> EstopCheck {
    match gpio {
        Some(pin) => Box::new(move || shutdown.load(Ordering::Relaxed) || pin()),
        None => Box::new(move || shutdown.load(Ordering::Relaxed)),
    }
}

#[cfg(all(feature = "hardware", target_os = "linux"))]
fn build_hardware(cfg: &Config, shutdown: Arc<AtomicBool>) -> eyre::Result<Backend> {
    use eyre::WrapErr;
    use turret_hardware::{HardwareMotor, HardwareRangeFinder, HardwareTurret};

    let pins = cfg
        .pins
        .as_ref()
        .ok_or_else(|| eyre::eyre!("invalid configuration: [pins] missing for hardware backend"))?;
    let sensor = HardwareRangeFinder::try_new(
        pins.sonar_trig,
        pins.sonar_echo,
        cfg.hardware.echo_timeout_ms,
    )
    .wrap_err("open range finder pins")?;
    let turret = HardwareTurret::try_new(
        pins.turret_pwm,
        pins.turret_dir,
        pins.turret_encoder,
        cfg.hardware.encoder_pulses_per_degree,
    )
    .wrap_err("open turret motor pins")?;
    let firing =
        HardwareMotor::try_new(pins.firing_pwm, pins.firing_dir).wrap_err("open firing motor pins")?;
    let drive: Option<BoxedMotor> = match (pins.drive_pwm, pins.drive_dir) {
        (Some(pwm), Some(dir)) => Some(Box::new(
            HardwareMotor::try_new(pwm, dir).wrap_err("open drive motor pins")?,
        )),
        _ => None,
    };
    let gpio_estop = match pins.estop_in {
        Some(pin) => {
            match turret_hardware::make_estop_checker(pin, cfg.estop.active_low, cfg.estop.poll_ms) {
                Ok(c) => {
                    tracing::info!(
                        pin,
                        active_low = cfg.estop.active_low,
                        poll_ms = cfg.estop.poll_ms,
                        "E-stop enabled"
                    );
                    Some(c)
                }
                Err(e) => {
                    tracing::warn!(error = %e, "failed to init E-stop; continuing without it");
                    None
                }
            }
        }
        None => None,
    };
    Ok(Backend {
        name: "gpio",
        sensor: Box::new(sensor),
        turret: Box::new(turret),
        firing: Box::new(firing),
        drive,
        clock: BackendClock::Real,
        estop_check: Some(shutdown_check(shutdown, gpio_estop)),
        sim: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use turret_config::{ProfileRow, SimTargetCfg};

    #[test]
    fn sim_config_carries_targets_and_profile() {
        let mut cfg = turret_config::SimCfg::default();
        cfg.targets = vec![SimTargetCfg {
            start_deg: 10.0,
            end_deg: 20.0,
            distance_cm: 30.0,
        }];
        let profile = ScanProfile::from_rows(vec![
            ProfileRow {
                angle: 2,
                distance_cm: 12.0,
            },
            ProfileRow {
                angle: 3,
                distance_cm: 14.0,
            },
        ])
        .unwrap();
        let sim = sim_config(&cfg, Some(&profile));
        assert_eq!(sim.targets.len(), 1);
        let dense = sim.profile.unwrap();
        assert_eq!(dense[2], 12.0);
        assert_eq!(dense[0], cfg.background_cm);
    }

    #[test]
    fn ctrl_c_flag_drives_abort_input() {
        let flag = Arc::new(AtomicBool::new(false));
        let check = shutdown_check(flag.clone(), None);
        assert!(!check());
        flag.store(true, Ordering::Relaxed);
        assert!(check());
    }
}
