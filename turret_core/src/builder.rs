//! Type-state builder for `Turret` and generic `build_turret` constructor.
//!
//! The builder enforces at compile time that the range finder, the turret
//! drive and the firing motor are provided before `build()` is available.
//! `try_build()` is always available for dynamic checks.

use std::marker::PhantomData;
use std::sync::Arc;

use turret_traits::clock::{Clock, MonotonicClock};
use turret_traits::{Motor, RangeFinder, TurretDrive};

use crate::buffer::AngularBuffer;
use crate::config::*;
use crate::cycle::TurretCore;
use crate::engage::Engager;
use crate::error::{BuildError, Result};
use crate::homing::TurretCalibrator;
use crate::poller::{AbortLatch, Poller};
use crate::scanner::{ScanSummary, Scanner};
use crate::status::{CycleReport, CycleState, CycleStatus};

type BoxedCore = TurretCore<Box<dyn RangeFinder>, Box<dyn TurretDrive>, Box<dyn Motor>>;

/// Public dynamic (boxed) turret engine.
pub struct Turret {
    pub(crate) inner: BoxedCore,
}

impl core::fmt::Debug for Turret {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Turret")
            .field("state", &self.inner.state)
            .field("targets", &self.inner.targets)
            .finish()
    }
}

impl Turret {
    /// Start building a Turret.
    pub fn builder() -> TurretBuilder<Missing, Missing, Missing> {
        TurretBuilder::default()
    }

    pub fn state(&self) -> CycleState {
        self.inner.state()
    }

    pub fn buffer(&self) -> &AngularBuffer {
        self.inner.buffer()
    }

    pub fn cfg(&self) -> &CycleCfg {
        self.inner.cfg()
    }

    /// Reset per-cycle state. Call before a new cycle.
    pub fn begin(&mut self) {
        self.inner.begin();
    }

    /// Run one stage of the cycle.
    pub fn step(&mut self) -> Result<CycleStatus> {
        self.inner.step()
    }

    pub fn set_params(&mut self, params: CycleParams) -> Result<()> {
        self.inner.set_params(params)
    }

    pub fn run_auto_cycle(&mut self, params: CycleParams) -> Result<CycleReport> {
        self.inner.run_auto_cycle(params)
    }

    /// Stop every motor (best-effort).
    pub fn stop_all(&mut self) {
        self.inner.stop_all();
    }
}

// ── Type-state markers ───────────────────────────────────────────────────────

pub struct Missing;
pub struct Set;

/// Builder for `Turret`. All fields are validated on `build()`.
pub struct TurretBuilder<R, T, F> {
    sensor: Option<Box<dyn RangeFinder>>,
    turret: Option<Box<dyn TurretDrive>>,
    firing: Option<Box<dyn Motor>>,
    cfg: CycleCfg,
    params: Option<CycleParams>,
    estop_check: Option<Box<dyn Fn() -> bool>>,
    estop_debounce_n: Option<u8>,
    clock: Option<Box<dyn Clock + Send + Sync>>,
    _r: PhantomData<R>,
    _t: PhantomData<T>,
    _f: PhantomData<F>,
}

impl Default for TurretBuilder<Missing, Missing, Missing> {
    fn default() -> Self {
        Self {
            sensor: None,
            turret: None,
            firing: None,
            cfg: CycleCfg::default(),
            params: None,
            estop_check: None,
            estop_debounce_n: None,
            clock: None,
            _r: PhantomData,
            _t: PhantomData,
            _f: PhantomData,
        }
    }
}

fn invalid(msg: &'static str) -> eyre::Report {
    eyre::Report::new(BuildError::InvalidConfig(msg))
}

fn check_power(p: i8, msg: &'static str) -> Result<()> {
    if (1..=100).contains(&p) {
        Ok(())
    } else {
        Err(invalid(msg))
    }
}

/// Validate configuration and construct a `TurretCore`.
///
/// Shared by `TurretBuilder::try_build()` and `build_turret()`.
#[allow(clippy::too_many_arguments)]
fn validate_and_build<R: RangeFinder, T: TurretDrive, F: Motor>(
    sensor: R,
    turret: T,
    firing: F,
    cfg: CycleCfg,
    params: Option<CycleParams>,
    estop_check: Option<Box<dyn Fn() -> bool>>,
    estop_debounce_n: u8,
    clock: Option<Box<dyn Clock + Send + Sync>>,
) -> Result<TurretCore<R, T, F>> {
    // ── Validation ───────────────────────────────────────────────────────────
    if cfg.scan.range_deg < 2 {
        return Err(invalid("range_deg must be >= 2"));
    }
    check_power(cfg.scan.sweep_power, "sweep_power must be in [1, 100]")?;
    if cfg.scan.sample_ms == 0 {
        return Err(invalid("sample_ms must be >= 1"));
    }
    if cfg.scan.timeout_ms == 0 {
        return Err(invalid("scan timeout_ms must be >= 1"));
    }
    check_power(
        cfg.engage.positioning_power,
        "positioning_power must be in [1, 100]",
    )?;
    if !(-100..=100).contains(&cfg.engage.reload_power) {
        return Err(invalid("reload_power must be in [-100, 100]"));
    }
    if cfg.engage.poll_ms == 0 {
        return Err(invalid("engage poll_ms must be >= 1"));
    }
    check_power(cfg.homing.power, "homing power must be in [1, 100]")?;
    if cfg.homing.poll_ms == 0 {
        return Err(invalid("homing poll_ms must be >= 1"));
    }

    let params = params.unwrap_or_else(|| CycleParams::from(&cfg));
    if !params.threshold_cm.is_finite() || params.threshold_cm <= 0.0 {
        return Err(invalid("threshold_cm must be > 0"));
    }
    if params.firing_power == 0 || !(-100..=100).contains(&params.firing_power) {
        return Err(invalid("firing_power must be in [-100, 100] and non-zero"));
    }

    // ── Construct ────────────────────────────────────────────────────────────
    let clock: Arc<dyn Clock + Send + Sync> = match clock {
        Some(b) => Arc::from(b),
        None => Arc::new(MonotonicClock::new()),
    };
    let poller = Poller::new(clock, AbortLatch::new(estop_check, estop_debounce_n));

    Ok(TurretCore {
        sensor,
        turret,
        firing,
        poller,
        scanner: Scanner::new(cfg.scan.clone()),
        calibrator: TurretCalibrator::new(cfg.homing.clone()),
        engager: Engager::new(cfg.engage.clone()),
        buffer: AngularBuffer::new(cfg.scan.range_deg),
        state: CycleState::Idle,
        scan: ScanSummary::default(),
        gaps_closed: 0,
        targets: Vec::new(),
        params,
        cfg,
    })
}

impl<R, T, F> TurretBuilder<R, T, F> {
    /// Fallible build available in any type-state; returns detailed error for missing pieces.
    pub fn try_build(self) -> Result<Turret> {
        let sensor = self
            .sensor
            .ok_or_else(|| eyre::Report::new(BuildError::MissingRangeFinder))?;
        let turret = self
            .turret
            .ok_or_else(|| eyre::Report::new(BuildError::MissingTurret))?;
        let firing = self
            .firing
            .ok_or_else(|| eyre::Report::new(BuildError::MissingFiring))?;

        let inner = validate_and_build(
            sensor,
            turret,
            firing,
            self.cfg,
            self.params,
            self.estop_check,
            self.estop_debounce_n.unwrap_or(2),
            self.clock,
        )?;
        Ok(Turret { inner })
    }

    fn retype<R2, T2, F2>(self) -> TurretBuilder<R2, T2, F2> {
        TurretBuilder {
            sensor: self.sensor,
            turret: self.turret,
            firing: self.firing,
            cfg: self.cfg,
            params: self.params,
            estop_check: self.estop_check,
            estop_debounce_n: self.estop_debounce_n,
            clock: self.clock,
            _r: PhantomData,
            _t: PhantomData,
            _f: PhantomData,
        }
    }
}

/// Chainable setters that do not affect type-state.
impl<R, T, F> TurretBuilder<R, T, F> {
    pub fn with_cycle_cfg(mut self, cfg: CycleCfg) -> Self {
        self.cfg = cfg;
        self
    }
    pub fn with_scan(mut self, scan: ScanCfg) -> Self {
        self.cfg.scan = scan;
        self
    }
    pub fn with_refine(mut self, refine: RefineCfg) -> Self {
        self.cfg.refine = refine;
        self
    }
    pub fn with_extract(mut self, extract: ExtractCfg) -> Self {
        self.cfg.extract = extract;
        self
    }
    pub fn with_engage(mut self, engage: EngageCfg) -> Self {
        self.cfg.engage = engage;
        self
    }
    pub fn with_homing(mut self, homing: HomingCfg) -> Self {
        self.cfg.homing = homing;
        self
    }
    /// Per-cycle parameters; derived from the config sections when not set.
    pub fn with_params(mut self, params: CycleParams) -> Self {
        self.params = Some(params);
        self
    }
    pub fn with_estop_check<C>(mut self, f: C) -> Self
    where
        C: Fn() -> bool + 'static,
    {
        self.estop_check = Some(Box::new(f));
        self
    }
    pub fn with_estop_debounce(mut self, n: u8) -> Self {
        self.estop_debounce_n = Some(n.max(1));
        self
    }
    /// Provide a custom clock implementation; defaults to `MonotonicClock` when not provided.
    pub fn with_clock(mut self, clock: Box<dyn Clock + Send + Sync>) -> Self {
        self.clock = Some(clock);
        self
    }
}

// Setters that advance type-state
impl<T, F> TurretBuilder<Missing, T, F> {
    pub fn with_range_finder(
        mut self,
        sensor: impl RangeFinder + 'static,
    ) -> TurretBuilder<Set, T, F> {
        self.sensor = Some(Box::new(sensor));
        self.retype()
    }
}

impl<R, F> TurretBuilder<R, Missing, F> {
    pub fn with_turret(mut self, turret: impl TurretDrive + 'static) -> TurretBuilder<R, Set, F> {
        self.turret = Some(Box::new(turret));
        self.retype()
    }
}

impl<R, T> TurretBuilder<R, T, Missing> {
    pub fn with_firing(mut self, firing: impl Motor + 'static) -> TurretBuilder<R, T, Set> {
        self.firing = Some(Box::new(firing));
        self.retype()
    }
}

impl TurretBuilder<Set, Set, Set> {
    /// Validate and build. Only available once all three devices are set.
    pub fn build(self) -> Result<Turret> {
        self.try_build()
    }
}

/// Generic, statically-dispatched alias using the unified core.
pub type TurretG<R, T, F> = TurretCore<R, T, F>;

/// Build a generic, statically-dispatched `TurretG` from concrete devices.
///
/// Delegates to the shared `validate_and_build`.
pub fn build_turret<R, T, F>(
    sensor: R,
    turret: T,
    firing: F,
    cfg: CycleCfg,
    estop_check: Option<Box<dyn Fn() -> bool>>,
    estop_debounce_n: Option<u8>,
    clock: Option<Box<dyn Clock + Send + Sync>>,
) -> Result<TurretG<R, T, F>>
where
    R: RangeFinder + 'static,
    T: TurretDrive + 'static,
    F: Motor + 'static,
{
    validate_and_build(
        sensor,
        turret,
        firing,
        cfg,
        None,
        estop_check,
        estop_debounce_n.unwrap_or(2).max(1),
        clock,
    )
}
