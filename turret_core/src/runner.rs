use turret_traits::clock::Clock;
use turret_traits::{Motor, RangeFinder, TurretDrive};

use crate::buffer::AngularBuffer;
use crate::error::Result as CoreResult;
use crate::{CycleCfg, CycleParams, CycleReport, CycleStatus};

/// A finished cycle together with the buffer it produced.
#[derive(Debug, Clone)]
pub struct CycleRun {
    pub report: CycleReport,
    pub buffer: AngularBuffer,
}

/// Build an engine over the given devices and run one auto cycle.
///
/// The abort checker is polled before every stage and every probe of a
/// bounded wait; `estop_debounce_n` consecutive hits abort the cycle.
#[allow(clippy::too_many_arguments)]
pub fn run_cycle<R, T, F>(
    sensor: R,
    turret: T,
    firing: F,
    cfg: CycleCfg,
    params: CycleParams,
    clock: Option<Box<dyn Clock + Send + Sync>>,
    estop_check: Option<Box<dyn Fn() -> bool + Send + Sync>>,
    estop_debounce_n: u8,
) -> CoreResult<CycleRun>
where
    R: RangeFinder + 'static,
    T: TurretDrive + 'static,
    F: Motor + 'static,
{
    let estop_check_core: Option<Box<dyn Fn() -> bool>> =
        estop_check.map(|f| -> Box<dyn Fn() -> bool> { Box::new(f) });
    let mut core = crate::build_turret(
        sensor,
        turret,
        firing,
        cfg,
        estop_check_core,
        Some(estop_debounce_n),
        clock,
    )?;
    core.set_params(params)?;
    core.begin();
    tracing::info!(
        threshold_cm = params.threshold_cm,
        gap_tolerance = params.gap_tolerance,
        min_run_width = params.min_run_width,
        firing_power = params.firing_power,
        "cycle start"
    );

    loop {
        match core.step()? {
            CycleStatus::Running(state) => tracing::trace!(?state, "stage done"),
            CycleStatus::Complete(report) => {
                tracing::info!(target_count = report.target_count, "cycle finished");
                return Ok(CycleRun {
                    report,
                    buffer: core.buffer().clone(),
                });
            }
            CycleStatus::Aborted(e) => {
                core.stop_all();
                tracing::error!(error = %e, "cycle aborted");
                return Err(crate::error::Report::new(e));
            }
        }
    }
}
