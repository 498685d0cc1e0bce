//! `From` implementations bridging `turret_config` types to `turret_core` types.

use crate::config::{CycleCfg, EngageCfg, ExtractCfg, HomingCfg, ManualCfg, RefineCfg, ScanCfg};

impl From<&turret_config::ScanCfg> for ScanCfg {
    fn from(c: &turret_config::ScanCfg) -> Self {
        Self {
            range_deg: c.range_deg,
            threshold_cm: c.threshold_cm,
            sweep_power: c.sweep_power,
            sample_ms: c.sample_ms,
            detect_dwell_ms: c.detect_dwell_ms,
            timeout_ms: c.timeout_ms,
        }
    }
}

impl From<&turret_config::RefineCfg> for RefineCfg {
    fn from(c: &turret_config::RefineCfg) -> Self {
        Self {
            gap_tolerance: c.gap_tolerance,
            close_edge_gaps: c.close_edge_gaps,
        }
    }
}

impl From<&turret_config::ExtractCfg> for ExtractCfg {
    fn from(c: &turret_config::ExtractCfg) -> Self {
        Self {
            min_run_width: c.min_run_width,
        }
    }
}

impl From<&turret_config::EngageCfg> for EngageCfg {
    fn from(c: &turret_config::EngageCfg) -> Self {
        Self {
            firing_power: c.firing_power,
            positioning_power: c.positioning_power,
            poll_ms: c.poll_ms,
            fire_ms: c.fire_ms,
            reload_power: c.reload_power,
            reload_settle_ms: c.reload_settle_ms,
            reload_ms: c.reload_ms,
            positioning_timeout_ms: c.positioning_timeout_ms,
        }
    }
}

impl From<&turret_config::HomingCfg> for HomingCfg {
    fn from(c: &turret_config::HomingCfg) -> Self {
        Self {
            power: c.power,
            settle_tolerance: c.settle_tolerance,
            poll_ms: c.poll_ms,
            timeout_ms: c.timeout_ms,
        }
    }
}

impl From<&turret_config::ManualCfg> for ManualCfg {
    fn from(c: &turret_config::ManualCfg) -> Self {
        Self {
            drive_power: c.drive_power,
            rotate_power: c.rotate_power,
            burst_power: c.burst_power,
        }
    }
}

impl From<&turret_config::Config> for CycleCfg {
    fn from(c: &turret_config::Config) -> Self {
        Self {
            scan: (&c.scan).into(),
            refine: (&c.refine).into(),
            extract: (&c.extract).into(),
            engage: (&c.engage).into(),
            homing: (&c.homing).into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_agree_with_config_schema() {
        let file = turret_config::Config::default();
        let cycle = CycleCfg::from(&file);
        let stock = CycleCfg::default();
        assert_eq!(cycle.scan.range_deg, stock.scan.range_deg);
        assert_eq!(cycle.scan.detect_dwell_ms, stock.scan.detect_dwell_ms);
        assert_eq!(cycle.refine.gap_tolerance, stock.refine.gap_tolerance);
        assert_eq!(cycle.engage.reload_ms, stock.engage.reload_ms);
        assert_eq!(cycle.homing.poll_ms, stock.homing.poll_ms);
        let manual = ManualCfg::from(&file.manual);
        assert_eq!(manual.burst_power, ManualCfg::default().burst_power);
    }
}
