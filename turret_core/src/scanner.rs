//! Sweep the turret across its range and fill the angular buffer.

use std::time::Duration;

use turret_traits::{RangeFinder, TurretDrive};

use crate::buffer::AngularBuffer;
use crate::config::ScanCfg;
use crate::error::{Motion, Result};
use crate::hw_error::{hw, stop_quietly};
use crate::poller::Poller;

/// Counts from one sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanSummary {
    /// Readings taken inside the buffer range.
    pub samples: usize,
    /// Readings at or below the threshold.
    pub detections: usize,
}

#[derive(Debug, Clone)]
pub struct Scanner {
    cfg: ScanCfg,
}

impl Scanner {
    pub fn new(cfg: ScanCfg) -> Self {
        Self { cfg }
    }

    pub fn cfg(&self) -> &ScanCfg {
        &self.cfg
    }

    /// Drive the turret forward from zero until the encoder reaches the end
    /// of the buffer, recording one reading per poll at the current angle.
    ///
    /// The motor is stopped on every exit path.
    pub fn scan<R, T>(
        &self,
        buffer: &mut AngularBuffer,
        sensor: &mut R,
        turret: &mut T,
        threshold_cm: f32,
        poller: &mut Poller,
    ) -> Result<ScanSummary>
    where
        R: RangeFinder + ?Sized,
        T: TurretDrive + ?Sized,
    {
        let range = i64::try_from(buffer.len()).unwrap_or(i64::MAX);
        let clock = poller.clock();
        let dwell = Duration::from_millis(self.cfg.detect_dwell_ms);
        let mut summary = ScanSummary::default();

        tracing::info!(range, threshold_cm, power = self.cfg.sweep_power, "sweep start");
        hw(turret.set_power(self.cfg.sweep_power), "start sweep")?;

        let res = poller.wait_until(
            Motion::Sweep,
            Duration::from_millis(self.cfg.sample_ms),
            Duration::from_millis(self.cfg.timeout_ms),
            || {
                let pos = i64::from(hw(turret.position(), "read turret encoder")?);
                if pos >= range {
                    return Ok(true);
                }
                if pos < 0 {
                    return Ok(false);
                }
                let d = hw(sensor.read_cm(), "read range finder")?;
                let angle = pos as usize;
                let hit = buffer.record(angle, d, threshold_cm);
                summary.samples += 1;
                tracing::trace!(angle, d, hit, "sample");
                if hit {
                    summary.detections += 1;
                    clock.sleep(dwell);
                }
                Ok(false)
            },
        );
        stop_quietly(turret, "sweep");
        res?;

        tracing::info!(
            samples = summary.samples,
            detections = summary.detections,
            "sweep done"
        );
        Ok(summary)
    }
}
