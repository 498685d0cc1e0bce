#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schema and scan-profile parsing for the scanning turret.
//!
//! - `Config` and its sections are deserialized from TOML and validated.
//!   Every section is optional and falls back to the rig's stock values.
//! - Scan-profile CSV loader enforces headers and ordering; the profile
//!   replays a recorded sweep through the simulated range finder.
use serde::Deserialize;
use serde::de::Deserializer;

/// Scan-profile CSV schema.
///
/// Expected headers:
/// angle,distance_cm
///
/// Example:
/// angle,distance_cm
/// 0,255.0
/// 1,42.5
#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
pub struct ProfileRow {
    pub angle: u32,
    pub distance_cm: f32,
}

/// GPIO wiring, only read by the hardware backend.
#[derive(Debug, Deserialize)]
pub struct Pins {
    pub sonar_trig: u8,
    pub sonar_echo: u8,
    pub turret_pwm: u8,
    pub turret_dir: u8,
    pub turret_encoder: u8,
    pub firing_pwm: u8,
    pub firing_dir: u8,
    pub drive_pwm: Option<u8>,
    pub drive_dir: Option<u8>,
    pub estop_in: Option<u8>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ScanCfg {
    /// Number of one-degree slots in the sweep (181 covers 0..=180).
    pub range_deg: usize,
    /// Readings at or below this distance count as a detection.
    pub threshold_cm: f32,
    pub sweep_power: i8,
    pub sample_ms: u64,
    /// Hold after each detection before sampling again.
    pub detect_dwell_ms: u64,
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

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct RefineCfg {
    pub gap_tolerance: usize,
    /// Also close a short gap that runs into the end of the sweep.
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

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ExtractCfg {
    pub min_run_width: usize,
}

impl Default for ExtractCfg {
    fn default() -> Self {
        Self { min_run_width: 1 }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
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

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct HomingCfg {
    /// Magnitude of the reverse power used to drive into the stop.
    pub power: i8,
    /// Movement (ticks) per poll at or below which the turret counts as stalled.
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

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ManualCfg {
    pub drive_power: i8,
    pub rotate_power: i8,
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

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct EstopCfg {
    /// Treat low level as pressed when true
    pub active_low: bool,
    /// Number of consecutive polls required to latch the abort
    pub debounce_n: u8,
    /// Polling interval in milliseconds for the GPIO abort checker
    pub poll_ms: u64,
}

impl Default for EstopCfg {
    fn default() -> Self {
        Self {
            active_low: true,
            debounce_n: 2,
            poll_ms: 5,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Hardware {
    /// Max time to wait for an ultrasonic echo before reporting "no echo".
    pub echo_timeout_ms: u64,
    pub encoder_pulses_per_degree: f32,
}

impl Default for Hardware {
    fn default() -> Self {
        Self {
            echo_timeout_ms: 30,
            encoder_pulses_per_degree: 1.0,
        }
    }
}

/// Simulated world used when the hardware backend is not compiled in.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SimCfg {
    pub start_deg: f32,
    pub deg_per_sec_per_power: f32,
    pub upper_stop_deg: f32,
    pub background_cm: f32,
    pub dropout_every: u32,
    /// Run on a virtual clock: waits complete instantly.
    pub virtual_clock: bool,
    pub jammed: bool,
    pub encoder_fault: bool,
    /// Accepts either
    /// - array of tables: [{ start_deg = 40, end_deg = 55, distance_cm = 30 }, ...]
    /// - array of tuples: [[40, 55, 30], ...]
    #[serde(deserialize_with = "de_sim_targets")]
    pub targets: Vec<SimTargetCfg>,
}

impl Default for SimCfg {
    fn default() -> Self {
        Self {
            start_deg: 45.0,
            deg_per_sec_per_power: 10.0,
            upper_stop_deg: 200.0,
            background_cm: 255.0,
            dropout_every: 0,
            virtual_clock: true,
            jammed: false,
            encoder_fault: false,
            targets: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimTargetCfg {
    pub start_deg: f32,
    pub end_deg: f32,
    pub distance_cm: f32,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TargetToml {
    Tuple((f32, f32, f32)),
    Table {
        start_deg: f32,
        end_deg: f32,
        distance_cm: f32,
    },
}

fn de_sim_targets<'de, D>(deserializer: D) -> Result<Vec<SimTargetCfg>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt: Option<Vec<TargetToml>> = Option::deserialize(deserializer)?;
    let mut out = Vec::new();
    if let Some(items) = opt {
        for t in items {
            match t {
                TargetToml::Tuple((start_deg, end_deg, distance_cm)) => out.push(SimTargetCfg {
                    start_deg,
                    end_deg,
                    distance_cm,
                }),
                TargetToml::Table {
                    start_deg,
                    end_deg,
                    distance_cm,
                } => out.push(SimTargetCfg {
                    start_deg,
                    end_deg,
                    distance_cm,
                }),
            }
        }
    }
    Ok(out)
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub pins: Option<Pins>,
    pub scan: ScanCfg,
    pub refine: RefineCfg,
    pub extract: ExtractCfg,
    pub engage: EngageCfg,
    pub homing: HomingCfg,
    pub manual: ManualCfg,
    pub logging: Logging,
    pub estop: EstopCfg,
    pub hardware: Hardware,
    pub sim: SimCfg,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

fn check_power(name: &str, p: i8) -> eyre::Result<()> {
    if !(-100..=100).contains(&p) {
        eyre::bail!("{name} must be in [-100, 100]");
    }
    Ok(())
}

fn check_positive_power(name: &str, p: i8) -> eyre::Result<()> {
    if !(1..=100).contains(&p) {
        eyre::bail!("{name} must be in [1, 100]");
    }
    Ok(())
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // Scan
        if self.scan.range_deg < 2 || self.scan.range_deg > 720 {
            eyre::bail!("scan.range_deg must be in [2, 720]");
        }
        if !self.scan.threshold_cm.is_finite() || self.scan.threshold_cm <= 0.0 {
            eyre::bail!("scan.threshold_cm must be > 0");
        }
        check_positive_power("scan.sweep_power", self.scan.sweep_power)?;
        if self.scan.sample_ms == 0 {
            eyre::bail!("scan.sample_ms must be >= 1");
        }
        if self.scan.timeout_ms == 0 {
            eyre::bail!("scan.timeout_ms must be >= 1");
        }

        // Refine / extract
        if self.refine.gap_tolerance >= self.scan.range_deg {
            eyre::bail!("refine.gap_tolerance must be smaller than scan.range_deg");
        }
        if self.extract.min_run_width >= self.scan.range_deg {
            eyre::bail!("extract.min_run_width must be smaller than scan.range_deg");
        }

        // Engage
        check_power("engage.firing_power", self.engage.firing_power)?;
        if self.engage.firing_power == 0 {
            eyre::bail!("engage.firing_power must be non-zero");
        }
        check_positive_power("engage.positioning_power", self.engage.positioning_power)?;
        check_power("engage.reload_power", self.engage.reload_power)?;
        if self.engage.poll_ms == 0 {
            eyre::bail!("engage.poll_ms must be >= 1");
        }
        if self.engage.fire_ms == 0 {
            eyre::bail!("engage.fire_ms must be >= 1");
        }
        if self.engage.positioning_timeout_ms == 0 {
            eyre::bail!("engage.positioning_timeout_ms must be >= 1");
        }

        // Homing
        check_positive_power("homing.power", self.homing.power)?;
        if self.homing.poll_ms == 0 {
            eyre::bail!("homing.poll_ms must be >= 1");
        }
        if self.homing.timeout_ms < self.homing.poll_ms {
            eyre::bail!("homing.timeout_ms must be >= homing.poll_ms");
        }

        // Manual
        check_positive_power("manual.drive_power", self.manual.drive_power)?;
        check_positive_power("manual.rotate_power", self.manual.rotate_power)?;
        check_positive_power("manual.burst_power", self.manual.burst_power)?;

        // E-stop
        if self.estop.debounce_n == 0 {
            eyre::bail!("estop.debounce_n must be >= 1");
        }
        if self.estop.poll_ms == 0 {
            eyre::bail!("estop.poll_ms must be >= 1");
        }

        // Hardware
        if self.hardware.echo_timeout_ms == 0 {
            eyre::bail!("hardware.echo_timeout_ms must be >= 1");
        }
        if !(self.hardware.encoder_pulses_per_degree > 0.0) {
            eyre::bail!("hardware.encoder_pulses_per_degree must be > 0");
        }

        // Sim
        if !(self.sim.deg_per_sec_per_power > 0.0) {
            eyre::bail!("sim.deg_per_sec_per_power must be > 0");
        }
        if !(self.sim.upper_stop_deg > 0.0) {
            eyre::bail!("sim.upper_stop_deg must be > 0");
        }
        for t in &self.sim.targets {
            if !(t.start_deg <= t.end_deg) {
                eyre::bail!("sim.targets start_deg must be <= end_deg");
            }
            if !(t.distance_cm >= 0.0) {
                eyre::bail!("sim.targets distance_cm must be >= 0");
            }
        }

        Ok(())
    }
}

/// A recorded sweep: one distance per angle, in increasing angle order.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanProfile {
    pub rows: Vec<ProfileRow>,
}

impl ScanProfile {
    pub fn from_rows(rows: Vec<ProfileRow>) -> eyre::Result<Self> {
        if rows.is_empty() {
            eyre::bail!("scan profile has no rows");
        }
        for (i, r) in rows.iter().enumerate() {
            if !r.distance_cm.is_finite() || r.distance_cm < 0.0 {
                eyre::bail!("scan profile row {} has invalid distance", i + 2);
            }
            if i > 0 && rows[i - 1].angle >= r.angle {
                eyre::bail!(
                    "scan profile angles must be strictly increasing (row {})",
                    i + 2
                );
            }
        }
        Ok(Self { rows })
    }

    /// Expand to one distance per degree; angles without a row read `fill_cm`.
    pub fn to_dense(&self, fill_cm: f32) -> Vec<f32> {
        let len = self.rows.last().map_or(0, |r| r.angle as usize + 1);
        let mut out = vec![fill_cm; len];
        for r in &self.rows {
            out[r.angle as usize] = r.distance_cm;
        }
        out
    }
}

impl TryFrom<Vec<ProfileRow>> for ScanProfile {
    type Error = eyre::Report;
    fn try_from(rows: Vec<ProfileRow>) -> Result<Self, Self::Error> {
        Self::from_rows(rows)
    }
}

pub fn load_scan_profile_csv(path: &std::path::Path) -> eyre::Result<ScanProfile> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| eyre::eyre!("open scan profile CSV {:?}: {}", path, e))?;

    // Enforce exact headers
    let headers = rdr
        .headers()
        .map_err(|e| eyre::eyre!("read CSV headers {:?}: {}", path, e))?
        .clone();
    let expected = ["angle", "distance_cm"];
    let actual: Vec<String> = headers.iter().map(|s| s.to_string()).collect();
    if actual != expected {
        eyre::bail!(
            "scan profile CSV must have headers 'angle,distance_cm', got: {}",
            actual.join(",")
        );
    }

    let mut rows = Vec::new();
    for (idx, rec) in rdr.deserialize::<ProfileRow>().enumerate() {
        match rec {
            Ok(row) => rows.push(row),
            Err(e) => {
                eyre::bail!("invalid CSV row {}: {}", idx + 2, e);
            }
        }
    }

    ScanProfile::try_from(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_stock_values() {
        let cfg = load_toml("").expect("empty config parses");
        assert_eq!(cfg.scan.range_deg, 181);
        assert_eq!(cfg.scan.threshold_cm, 50.0);
        assert_eq!(cfg.refine.gap_tolerance, 5);
        assert!(cfg.refine.close_edge_gaps);
        assert_eq!(cfg.extract.min_run_width, 1);
        assert_eq!(cfg.engage.firing_power, -90);
        assert_eq!(cfg.engage.fire_ms, 110);
        assert_eq!(cfg.homing.poll_ms, 750);
        assert!(cfg.pins.is_none());
        cfg.validate().expect("stock config is valid");
    }

    #[test]
    fn sim_targets_accept_tables_and_tuples() {
        let cfg = load_toml(
            r#"
[sim]
targets = [[10.0, 20.0, 30.0], { start_deg = 90.0, end_deg = 100.0, distance_cm = 25.0 }]
"#,
        )
        .expect("parse");
        assert_eq!(cfg.sim.targets.len(), 2);
        assert_eq!(cfg.sim.targets[1].start_deg, 90.0);
        assert_eq!(cfg.sim.targets[0].distance_cm, 30.0);
    }

    #[test]
    fn dense_profile_fills_missing_angles() {
        let p = ScanProfile::from_rows(vec![
            ProfileRow {
                angle: 0,
                distance_cm: 100.0,
            },
            ProfileRow {
                angle: 3,
                distance_cm: 20.0,
            },
        ])
        .unwrap();
        assert_eq!(p.to_dense(255.0), vec![100.0, 255.0, 255.0, 20.0]);
    }
}
