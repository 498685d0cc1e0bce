//! Cycle state and the status returned from each step.

use crate::error::TurretError;
use crate::scanner::ScanSummary;

/// Stages of one auto cycle, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleState {
    Idle,
    /// Initial homing plus firing-mechanism reload.
    Homing,
    Scanning,
    /// Return to zero after the sweep so positioning starts from home.
    Rewinding,
    Refining,
    Extracting,
    /// Skipped when no targets were extracted.
    Engaging,
    /// Final homing.
    Parking,
    Done,
    Aborted,
}

/// Outcome of a completed cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub target_count: usize,
    /// Engaged angles, ascending.
    pub targets: Vec<usize>,
    pub gaps_closed: usize,
    pub scan: ScanSummary,
}

/// Public status of a single step of the cycle.
#[derive(Debug)]
pub enum CycleStatus {
    /// The step finished; the cycle is now in this state.
    Running(CycleState),
    /// Final homing finished; motors are stopped.
    Complete(CycleReport),
    /// Stopped early; every motor has been asked to stop.
    Aborted(TurretError),
}
