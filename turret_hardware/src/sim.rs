//! Simulated turret world: one rotating axis, a range finder riding on it and
//! plain motors for the firing mechanism and the drive train.
//!
//! All handles share a single world state and a single clock, so motion is
//! integrated from elapsed (possibly virtual) time exactly like the physical
//! rig: the turret moves at `power * deg_per_sec_per_power` between two
//! mechanical stops at 0 and `upper_stop_deg`.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

use turret_traits::{Clock, Encoder, HwResult, Motor, RangeFinder};

/// Reading returned when nothing reflects the ultrasonic pulse.
pub const NO_ECHO_CM: f32 = 255.0;

/// A reflecting object spanning `[start_deg, end_deg]` at a fixed distance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimTarget {
    pub start_deg: f32,
    pub end_deg: f32,
    pub distance_cm: f32,
}

#[derive(Debug, Clone)]
pub struct SimConfig {
    /// Physical angle of the turret when the simulation starts.
    pub start_deg: f32,
    pub deg_per_sec_per_power: f32,
    pub upper_stop_deg: f32,
    /// Distance reported where no target is present.
    pub background_cm: f32,
    /// Every n-th range reading is lost (reported as `NO_ECHO_CM`); 0 disables.
    pub dropout_every: u32,
    pub targets: Vec<SimTarget>,
    /// Per-degree distances; replaces `targets` when set.
    pub profile: Option<Vec<f32>>,
    /// The turret does not move whatever power it is given.
    pub jammed: bool,
    /// The encoder reports alternating garbage instead of the real position.
    pub encoder_fault: bool,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            start_deg: 45.0,
            deg_per_sec_per_power: 10.0,
            upper_stop_deg: 200.0,
            background_cm: NO_ECHO_CM,
            dropout_every: 0,
            targets: Vec::new(),
            profile: None,
            jammed: false,
            encoder_fault: false,
        }
    }
}

#[derive(Debug)]
struct WorldState {
    angle_deg: f32,
    turret_power: i8,
    last_update: Instant,
    origin_ticks: i32,
    reads: u64,
    encoder_reads: u64,
    firing_power: i8,
    drive_power: i8,
    shots: Vec<f32>,
}

/// Shared simulation; hand out device handles with the accessor methods.
#[derive(Clone)]
pub struct SimWorld {
    state: Arc<Mutex<WorldState>>,
    clock: Arc<dyn Clock + Send + Sync>,
    cfg: Arc<SimConfig>,
}

impl core::fmt::Debug for SimWorld {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SimWorld")
            .field("turret_deg", &self.turret_angle())
            .field("shots", &self.shots().len())
            .finish()
    }
}

impl SimWorld {
    pub fn new(cfg: SimConfig, clock: Arc<dyn Clock + Send + Sync>) -> Self {
        let start = cfg.start_deg.clamp(0.0, cfg.upper_stop_deg);
        let state = WorldState {
            angle_deg: start,
            turret_power: 0,
            last_update: clock.now(),
            origin_ticks: 0,
            reads: 0,
            encoder_reads: 0,
            firing_power: 0,
            drive_power: 0,
            shots: Vec::new(),
        };
        Self {
            state: Arc::new(Mutex::new(state)),
            clock,
            cfg: Arc::new(cfg),
        }
    }

    pub fn range_finder(&self) -> SimulatedRangeFinder {
        SimulatedRangeFinder {
            world: self.clone(),
        }
    }

    pub fn turret(&self) -> SimulatedTurret {
        SimulatedTurret {
            world: self.clone(),
        }
    }

    pub fn firing_motor(&self) -> SimulatedMotor {
        SimulatedMotor {
            world: self.clone(),
            role: MotorRole::Firing,
        }
    }

    pub fn drive_motor(&self) -> SimulatedMotor {
        SimulatedMotor {
            world: self.clone(),
            role: MotorRole::Drive,
        }
    }

    /// Physical turret angle (0 is the lower mechanical stop).
    pub fn turret_angle(&self) -> f32 {
        let mut st = self.lock();
        self.integrate(&mut st);
        st.angle_deg
    }

    /// Physical turret angles at which the firing motor was driven forward.
    pub fn shots(&self) -> Vec<f32> {
        self.lock().shots.clone()
    }

    pub fn drive_power(&self) -> i8 {
        self.lock().drive_power
    }

    pub fn firing_power(&self) -> i8 {
        self.lock().firing_power
    }

    fn lock(&self) -> MutexGuard<'_, WorldState> {
        // A poisoned lock only means another handle panicked mid-update; the
        // state itself stays usable for a simulation.
        self.state.lock().unwrap_or_else(|p| p.into_inner())
    }

    fn integrate(&self, st: &mut WorldState) {
        let now = self.clock.now();
        let dt = now.saturating_duration_since(st.last_update).as_secs_f32();
        st.last_update = now;
        if self.cfg.jammed || st.turret_power == 0 {
            return;
        }
        let delta = f32::from(st.turret_power) * self.cfg.deg_per_sec_per_power * dt;
        st.angle_deg = (st.angle_deg + delta).clamp(0.0, self.cfg.upper_stop_deg);
    }

    fn distance_at(&self, angle_deg: f32) -> f32 {
        if let Some(profile) = &self.cfg.profile {
            let idx = angle_deg.floor() as usize;
            return profile
                .get(idx)
                .copied()
                .unwrap_or(self.cfg.background_cm);
        }
        self.cfg
            .targets
            .iter()
            .find(|t| angle_deg >= t.start_deg && angle_deg <= t.end_deg)
            .map_or(self.cfg.background_cm, |t| t.distance_cm)
    }
}

/// Ultrasonic range finder mounted on the simulated turret.
#[derive(Debug, Clone)]
pub struct SimulatedRangeFinder {
    world: SimWorld,
}

impl RangeFinder for SimulatedRangeFinder {
    fn read_cm(&mut self) -> HwResult<f32> {
        let w = &self.world;
        let mut st = w.lock();
        w.integrate(&mut st);
        st.reads = st.reads.saturating_add(1);
        let every = u64::from(w.cfg.dropout_every);
        let d = if every > 0 && st.reads % every == 0 {
            NO_ECHO_CM
        } else {
            w.distance_at(st.angle_deg.floor())
        };
        tracing::trace!(angle_deg = st.angle_deg, d, "sim range read");
        Ok(d)
    }
}

/// Turret rotation motor with its encoder.
#[derive(Debug, Clone)]
pub struct SimulatedTurret {
    world: SimWorld,
}

impl Motor for SimulatedTurret {
    fn set_power(&mut self, power: i8) -> HwResult<()> {
        let w = &self.world;
        let mut st = w.lock();
        w.integrate(&mut st);
        st.turret_power = power.clamp(-100, 100);
        Ok(())
    }
}

impl Encoder for SimulatedTurret {
    fn position(&mut self) -> HwResult<i32> {
        let w = &self.world;
        let mut st = w.lock();
        w.integrate(&mut st);
        st.encoder_reads = st.encoder_reads.saturating_add(1);
        if w.cfg.encoder_fault {
            let noise = if st.encoder_reads % 2 == 0 { 50 } else { -50 };
            return Ok(noise);
        }
        Ok(st.angle_deg.floor() as i32 - st.origin_ticks)
    }

    fn reset_position(&mut self) -> HwResult<()> {
        let w = &self.world;
        let mut st = w.lock();
        w.integrate(&mut st);
        st.origin_ticks = st.angle_deg.floor() as i32;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotorRole {
    Firing,
    Drive,
}

/// Plain motor: the firing mechanism or the drive train.
#[derive(Debug, Clone)]
pub struct SimulatedMotor {
    world: SimWorld,
    role: MotorRole,
}

impl SimulatedMotor {
    pub fn role(&self) -> MotorRole {
        self.role
    }
}

impl Motor for SimulatedMotor {
    fn set_power(&mut self, power: i8) -> HwResult<()> {
        let w = &self.world;
        let mut st = w.lock();
        w.integrate(&mut st);
        match self.role {
            MotorRole::Firing => {
                // The firing mechanism shoots on its negative (forward) stroke.
                if power < 0 && st.firing_power >= 0 {
                    let at = st.angle_deg;
                    st.shots.push(at);
                    tracing::debug!(angle_deg = at, power, "sim shot fired");
                }
                st.firing_power = power;
            }
            MotorRole::Drive => {
                st.drive_power = power;
                tracing::debug!(power, "sim drive power");
            }
        }
        Ok(())
    }
}
