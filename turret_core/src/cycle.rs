//! The auto-cycle state machine (`TurretCore`).
//!
//! One call to `step()` runs exactly one stage: homing, sweep, rewind, refine,
//! extract, engage or park. Stages share one owned `AngularBuffer` and one
//! `Poller`, so the abort input and the stall timeouts cover the whole cycle.

use turret_traits::{Motor, RangeFinder, TurretDrive};

use crate::buffer::AngularBuffer;
use crate::config::{CycleCfg, CycleParams, ExtractCfg, RefineCfg};
use crate::engage::Engager;
use crate::error::{AbortReason, Result, TurretError};
use crate::extract::extract;
use crate::homing::TurretCalibrator;
use crate::hw_error::stop_quietly;
use crate::poller::Poller;
use crate::refine::refine;
use crate::scanner::{ScanSummary, Scanner};
use crate::status::{CycleReport, CycleState, CycleStatus};

/// Unified core for both dynamic (boxed) and generic (static dispatch) variants.
pub struct TurretCore<R: RangeFinder, T: TurretDrive, F: Motor> {
    pub(crate) sensor: R,
    pub(crate) turret: T,
    pub(crate) firing: F,
    pub(crate) cfg: CycleCfg,
    pub(crate) params: CycleParams,
    pub(crate) poller: Poller,
    pub(crate) scanner: Scanner,
    pub(crate) calibrator: TurretCalibrator,
    pub(crate) engager: Engager,

    pub(crate) buffer: AngularBuffer,
    pub(crate) state: CycleState,
    pub(crate) scan: ScanSummary,
    pub(crate) gaps_closed: usize,
    pub(crate) targets: Vec<usize>,
}

impl<R: RangeFinder, T: TurretDrive, F: Motor> core::fmt::Debug for TurretCore<R, T, F> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TurretCore")
            .field("state", &self.state)
            .field("range_deg", &self.buffer.len())
            .field("targets", &self.targets)
            .finish()
    }
}

impl<R: RangeFinder, T: TurretDrive, F: Motor> TurretCore<R, T, F> {
    pub fn state(&self) -> CycleState {
        self.state
    }

    /// Buffer contents of the current (or last) cycle.
    pub fn buffer(&self) -> &AngularBuffer {
        &self.buffer
    }

    pub fn cfg(&self) -> &CycleCfg {
        &self.cfg
    }

    pub fn params(&self) -> CycleParams {
        self.params
    }

    /// Replace the per-cycle parameters; takes effect at the next stage.
    pub fn set_params(&mut self, params: CycleParams) -> Result<()> {
        if !params.threshold_cm.is_finite() || params.threshold_cm <= 0.0 {
            return Err(eyre::Report::new(TurretError::Config(
                "threshold_cm must be > 0".into(),
            )));
        }
        if params.firing_power == 0 || params.firing_power == i8::MIN {
            return Err(eyre::Report::new(TurretError::Config(
                "firing_power must be in [-100, 100] and non-zero".into(),
            )));
        }
        self.params = params;
        Ok(())
    }

    /// Reset per-cycle state. Call before a new cycle.
    pub fn begin(&mut self) {
        self.buffer.reset();
        self.poller.abort_latch().clear();
        self.state = CycleState::Idle;
        self.scan = ScanSummary::default();
        self.gaps_closed = 0;
        self.targets.clear();
    }

    /// Stop every motor (best-effort).
    pub fn stop_all(&mut self) {
        stop_quietly(&mut self.turret, "turret");
        stop_quietly(&mut self.firing, "firing");
    }

    /// Run one stage of the cycle.
    ///
    /// Stall timeouts and the abort input end the cycle with
    /// `CycleStatus::Aborted`; other failures are returned as `Err`. Either
    /// way the motors are stopped and the cycle needs `begin()` again.
    pub fn step(&mut self) -> Result<CycleStatus> {
        if matches!(self.state, CycleState::Done | CycleState::Aborted) {
            return Err(eyre::Report::new(TurretError::State(
                "cycle finished; call begin() first".into(),
            )));
        }
        if self.poller.abort_latch().poll() {
            self.stop_all();
            self.state = CycleState::Aborted;
            return Ok(CycleStatus::Aborted(TurretError::Abort(AbortReason::Estop)));
        }

        match self.run_stage() {
            Ok(CycleState::Done) => {
                self.state = CycleState::Done;
                tracing::info!(targets = self.targets.len(), "cycle complete");
                Ok(CycleStatus::Complete(self.report()))
            }
            Ok(next) => {
                tracing::debug!(from = ?self.state, to = ?next, "cycle transition");
                self.state = next;
                Ok(CycleStatus::Running(next))
            }
            Err(e) => {
                let stage = self.state;
                self.stop_all();
                self.state = CycleState::Aborted;
                if let Some(te) = e.downcast_ref::<TurretError>()
                    && te.is_cycle_abort()
                {
                    tracing::warn!(?stage, error = %te, "cycle aborted");
                    return Ok(CycleStatus::Aborted(te.clone()));
                }
                Err(e)
            }
        }
    }

    /// Run a full cycle from `Idle` with the given parameters.
    pub fn run_auto_cycle(&mut self, params: CycleParams) -> Result<CycleReport> {
        self.set_params(params)?;
        self.begin();
        loop {
            match self.step()? {
                CycleStatus::Running(_) => {}
                CycleStatus::Complete(report) => return Ok(report),
                CycleStatus::Aborted(e) => return Err(eyre::Report::new(e)),
            }
        }
    }

    fn report(&self) -> CycleReport {
        CycleReport {
            target_count: self.targets.len(),
            targets: self.targets.clone(),
            gaps_closed: self.gaps_closed,
            scan: self.scan,
        }
    }

    /// Do the work of the current state and return the next one.
    fn run_stage(&mut self) -> Result<CycleState> {
        match self.state {
            CycleState::Idle => Ok(CycleState::Homing),
            CycleState::Homing => {
                self.calibrator.home(&mut self.turret, &mut self.poller)?;
                self.engager.reload(&mut self.firing, &mut self.poller)?;
                Ok(CycleState::Scanning)
            }
            CycleState::Scanning => {
                self.scan = self.scanner.scan(
                    &mut self.buffer,
                    &mut self.sensor,
                    &mut self.turret,
                    self.params.threshold_cm,
                    &mut self.poller,
                )?;
                Ok(CycleState::Rewinding)
            }
            CycleState::Rewinding => {
                self.calibrator.home(&mut self.turret, &mut self.poller)?;
                Ok(CycleState::Refining)
            }
            CycleState::Refining => {
                let cfg = RefineCfg {
                    gap_tolerance: self.params.gap_tolerance,
                    close_edge_gaps: self.cfg.refine.close_edge_gaps,
                };
                self.gaps_closed = refine(&mut self.buffer, &cfg);
                Ok(CycleState::Extracting)
            }
            CycleState::Extracting => {
                let cfg = ExtractCfg {
                    min_run_width: self.params.min_run_width,
                };
                self.targets = extract(&mut self.buffer, &cfg);
                if self.targets.is_empty() {
                    Ok(CycleState::Parking)
                } else {
                    Ok(CycleState::Engaging)
                }
            }
            CycleState::Engaging => {
                self.engager.fire_at_targets(
                    &mut self.turret,
                    &mut self.firing,
                    &self.targets,
                    self.params.firing_power,
                    &mut self.poller,
                )?;
                Ok(CycleState::Parking)
            }
            CycleState::Parking => {
                self.calibrator.home(&mut self.turret, &mut self.poller)?;
                Ok(CycleState::Done)
            }
            CycleState::Done | CycleState::Aborted => Err(eyre::Report::new(TurretError::State(
                "no stage to run".into(),
            ))),
        }
    }
}
