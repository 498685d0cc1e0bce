#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Scanning-turret engine (hardware-agnostic).
//!
//! All hardware goes through `turret_traits::{RangeFinder, Motor, Encoder}`,
//! so the same code runs on GPIO, on the simulator and against test doubles.
//!
//! ## Pipeline
//!
//! - **AngularBuffer**: per-degree distance, detection and target tracks (`buffer`)
//! - **Scanner**: sweep and sample (`scanner`)
//! - **GapRefiner**: bridge short dropouts (`refine`)
//! - **TargetExtractor**: one target per wide-enough run (`extract`)
//! - **Engager**: position and fire (`engage`)
//! - **TurretCalibrator**: stall-detection homing (`homing`)
//!
//! `TurretCore` sequences them as an explicit state machine (`status`), with
//! every blocking wait bounded by `Poller` (`poller`). Manual teleoperation
//! lives in `teleop`.

pub mod buffer;
pub mod builder;
pub mod config;
pub mod conversions;
pub mod cycle;
pub mod engage;
pub mod error;
pub mod extract;
pub mod homing;
pub mod hw_error;
pub mod poller;
pub mod refine;
pub mod runner;
pub mod scanner;
pub mod status;
pub mod teleop;

pub use buffer::{AngleSample, AngularBuffer};
pub use builder::{Missing, Set, Turret, TurretBuilder, TurretG, build_turret};
pub use config::{
    CycleCfg, CycleParams, EngageCfg, ExtractCfg, HomingCfg, ManualCfg, RefineCfg, ScanCfg,
};
pub use cycle::TurretCore;
pub use engage::Engager;
pub use error::{AbortReason, BuildError, Motion, TurretError};
pub use extract::{detection_runs, extract, extract_track};
pub use homing::{HomeReport, TurretCalibrator};
pub use poller::{AbortLatch, Poller};
pub use refine::{refine, refine_track};
pub use runner::{CycleRun, run_cycle};
pub use scanner::{ScanSummary, Scanner};
pub use status::{CycleReport, CycleState, CycleStatus};
pub use teleop::{Buttons, ManualAction, ManualController, ManualMode, fire_power_for_hold};
