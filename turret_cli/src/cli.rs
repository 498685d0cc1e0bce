//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();
/// Bounded-wait limits in force for the current run (for JSON details).
pub static LAST_LIMITS: OnceLock<CliLimits> = OnceLock::new();

#[derive(Copy, Clone, Debug)]
pub struct CliLimits {
    pub homing_timeout_ms: u64,
    pub scan_timeout_ms: u64,
    pub positioning_timeout_ms: u64,
    pub estop_debounce_n: u8,
}

impl From<&turret_config::Config> for CliLimits {
    fn from(c: &turret_config::Config) -> Self {
        Self {
            homing_timeout_ms: c.homing.timeout_ms,
            scan_timeout_ms: c.scan.timeout_ms,
            positioning_timeout_ms: c.engage.positioning_timeout_ms,
            estop_debounce_n: c.estop.debounce_n,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "turret", version, about = "Scanning turret CLI")]
pub struct Cli {
    /// Path to config TOML (typed)
    #[arg(long, value_name = "FILE", default_value = "etc/turret_config.toml")]
    pub config: PathBuf,

    /// Optional scan-profile CSV for the simulator (strict header)
    #[arg(long, value_name = "FILE")]
    pub profile: Option<PathBuf>,

    /// Print results and errors as JSON lines; console logs become JSON too
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace); defaults to logging.level, then info
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run one automatic cycle: home, sweep, pick targets, fire, park
    Auto {
        /// Detection threshold in cm (overrides scan.threshold_cm)
        #[arg(long, value_name = "CM")]
        threshold_cm: Option<f32>,
        /// Close gaps shorter than this many degrees (overrides refine.gap_tolerance)
        #[arg(long, value_name = "DEG")]
        gap_tolerance: Option<usize>,
        /// Keep only runs wider than this (overrides extract.min_run_width)
        #[arg(long, value_name = "DEG")]
        min_run_width: Option<usize>,
        /// Firing power, usually negative (overrides engage.firing_power)
        #[arg(long, value_name = "POWER", allow_negative_numbers = true)]
        firing_power: Option<i8>,
        /// Include the per-degree buffer in the output
        #[arg(long, action = ArgAction::SetTrue)]
        dump: bool,
    },
    /// Teleoperate from stdin lines: MODE BUTTONS [HOLD_MS]
    Manual,
    /// Quick health check: config, backend and one range reading
    SelfCheck,
}
