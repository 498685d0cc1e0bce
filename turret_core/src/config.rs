//! Runtime configuration for the turret engine.
//!
//! Kept separate from the TOML schema in `turret_config`; see `conversions`
//! for the bridge.

/// Sweep parameters for the Scanner.
#[derive(Debug, Clone)]
pub struct ScanCfg {
    /// Slots in the angular buffer; 181 covers 0..=180 degrees.
    pub range_deg: usize,
    /// A reading at or below this distance is a detection.
    pub threshold_cm: f32,
    pub sweep_power: i8,
    pub sample_ms: u64,
    /// Hold after each detection before the next sample.
    pub detect_dwell_ms: u64,
    /// Upper bound for the whole sweep.
    pub timeout_ms: u64,
}

impl Default for ScanCfg {
    fn default() -> Self {
        Self {
            range_deg: 181,
            threshold_cm: 50.0,
            sweep_power: 2,
            sample_ms: 10,
            detect_dwell_ms: 100,
            timeout_ms: 60_000,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RefineCfg {
    /// Gaps strictly shorter than this are closed.
    pub gap_tolerance: usize,
    /// Close a short gap that runs into the end of the buffer too.
    pub close_edge_gaps: bool,
}

impl Default for RefineCfg {
    fn default() -> Self {
        Self {
            gap_tolerance: 5,
            close_edge_gaps: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExtractCfg {
    /// Runs must be strictly wider than this to yield a target.
    pub min_run_width: usize,
}

impl Default for ExtractCfg {
    fn default() -> Self {
        Self { min_run_width: 1 }
    }
}

/// Positioning, firing and reload timings for the Engager.
#[derive(Debug, Clone)]
pub struct EngageCfg {
    pub firing_power: i8,
    pub positioning_power: i8,
    pub poll_ms: u64,
    pub fire_ms: u64,
    pub reload_power: i8,
    pub reload_settle_ms: u64,
    pub reload_ms: u64,
    pub positioning_timeout_ms: u64,
}

impl Default for EngageCfg {
    fn default() -> Self {
        Self {
            firing_power: -90,
            positioning_power: 5,
            poll_ms: 5,
            fire_ms: 110,
            reload_power: 10,
            reload_settle_ms: 100,
            reload_ms: 1000,
            positioning_timeout_ms: 10_000,
        }
    }
}

/// Stall-detection homing against the lower mechanical stop.
#[derive(Debug, Clone)]
pub struct HomingCfg {
    /// Magnitude of the reverse power.
    pub power: i8,
    /// Movement per poll (ticks) at or below which the turret is stalled.
    pub settle_tolerance: u32,
    pub poll_ms: u64,
    pub timeout_ms: u64,
}

impl Default for HomingCfg {
    fn default() -> Self {
        Self {
            power: 5,
            settle_tolerance: 5,
            poll_ms: 750,
            timeout_ms: 20_000,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ManualCfg {
    pub drive_power: i8,
    pub rotate_power: i8,
    /// Continuous-fire power in drive mode.
    pub burst_power: i8,
}

impl Default for ManualCfg {
    fn default() -> Self {
        Self {
            drive_power: 30,
            rotate_power: 5,
            burst_power: 90,
        }
    }
}

/// Everything one auto cycle needs besides the hardware.
#[derive(Debug, Clone, Default)]
pub struct CycleCfg {
    pub scan: ScanCfg,
    pub refine: RefineCfg,
    pub extract: ExtractCfg,
    pub engage: EngageCfg,
    pub homing: HomingCfg,
}

/// Per-cycle overrides accepted by `run_auto_cycle`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CycleParams {
    pub threshold_cm: f32,
    pub gap_tolerance: usize,
    pub min_run_width: usize,
    pub firing_power: i8,
}

impl Default for CycleParams {
    fn default() -> Self {
        Self::from(&CycleCfg::default())
    }
}

impl From<&CycleCfg> for CycleParams {
    fn from(c: &CycleCfg) -> Self {
        Self {
            threshold_cm: c.scan.threshold_cm,
            gap_tolerance: c.refine.gap_tolerance,
            min_run_width: c.extract.min_run_width,
            firing_power: c.engage.firing_power,
        }
    }
}
