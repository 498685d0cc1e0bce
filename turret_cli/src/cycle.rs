//! `auto` and `self-check`: run one cycle over the assembled backend and report it.

use std::time::{Instant, SystemTime, UNIX_EPOCH};

use serde_json::json;
use turret_core::error::TurretError;
use turret_core::{AngularBuffer, CycleCfg, CycleParams, CycleRun};

use crate::backend::Backend;
use crate::error_fmt::abort_reason_name;

/// Command-line overrides for a single auto cycle.
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoOverrides {
    pub threshold_cm: Option<f32>,
    pub gap_tolerance: Option<usize>,
    pub min_run_width: Option<usize>,
    pub firing_power: Option<i8>,
}

pub fn effective_params(cfg: &CycleCfg, o: AutoOverrides) -> CycleParams {
    let mut p = CycleParams::from(cfg);
    if let Some(t) = o.threshold_cm {
        p.threshold_cm = t;
    }
    if let Some(g) = o.gap_tolerance {
        p.gap_tolerance = g;
    }
    if let Some(w) = o.min_run_width {
        p.min_run_width = w;
    }
    if let Some(f) = o.firing_power {
        p.firing_power = f;
    }
    p
}

fn unix_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_millis() as i64)
}

fn buffer_json(buffer: &AngularBuffer) -> serde_json::Value {
    buffer
        .samples()
        .map(|s| {
            json!({
                "angle": s.angle,
                "distance_cm": s.distance_cm,
                "detected": s.detected,
                "target": s.target,
            })
        })
        .collect()
}

pub fn run_auto(
    backend: Backend,
    cfg: CycleCfg,
    overrides: AutoOverrides,
    estop_debounce_n: u8,
    dump: bool,
    json_mode: bool,
) -> eyre::Result<()> {
    let params = effective_params(&cfg, overrides);
    let started = Instant::now();
    let result = turret_core::run_cycle(
        backend.sensor,
        backend.turret,
        backend.firing,
        cfg,
        params,
        Some(backend.clock.boxed()),
        backend.estop_check,
        estop_debounce_n,
    );
    let duration_ms = started.elapsed().as_millis() as u64;

    match result {
        Ok(CycleRun { report, buffer }) => {
            if json_mode {
                let mut line = json!({
                    "timestamp": unix_ms(),
                    "duration_ms": duration_ms,
                    "backend": backend.name,
                    "threshold_cm": params.threshold_cm,
                    "gap_tolerance": params.gap_tolerance,
                    "min_run_width": params.min_run_width,
                    "firing_power": params.firing_power,
                    "target_count": report.target_count,
                    "targets": report.targets,
                    "gaps_closed": report.gaps_closed,
                    "samples": report.scan.samples,
                    "detections": report.scan.detections,
                    "abort_reason": null,
                });
                if dump {
                    line["buffer"] = buffer_json(&buffer);
                }
                println!("{line}");
            } else {
                println!("cycle complete: {} target(s)", report.target_count);
                if !report.targets.is_empty() {
                    let angles: Vec<String> =
                        report.targets.iter().map(ToString::to_string).collect();
                    println!("targets (deg): {}", angles.join(" "));
                }
                if let Some(world) = &backend.sim {
                    println!("shots fired: {}", world.shots().len());
                }
                if dump {
                    println!("angle,distance_cm,detected,target");
                    for s in buffer.samples() {
                        println!(
                            "{},{:.1},{},{}",
                            s.angle,
                            s.distance_cm,
                            u8::from(s.detected),
                            u8::from(s.target)
                        );
                    }
                }
            }
            Ok(())
        }
        Err(e) => {
            if json_mode {
                let reason = e
                    .downcast_ref::<TurretError>()
                    .map_or("Error", abort_reason_name);
                let line = json!({
                    "timestamp": unix_ms(),
                    "duration_ms": duration_ms,
                    "backend": backend.name,
                    "target_count": null,
                    "targets": null,
                    "abort_reason": reason,
                });
                println!("{line}");
            }
            Err(e)
        }
    }
}

pub fn self_check(mut backend: Backend, json_mode: bool) -> eyre::Result<()> {
    use eyre::WrapErr;
    use turret_traits::RangeFinder;

    let cm = backend
        .sensor
        .read_cm()
        .map_err(|e| eyre::Report::new(turret_core::hw_error::map_hw_error(&*e)))
        .wrap_err("range finder read")?;
    tracing::info!(backend = backend.name, range_cm = cm, "self-check");
    if json_mode {
        println!(
            "{}",
            json!({ "ok": true, "backend": backend.name, "range_cm": cm })
        );
    } else {
        println!("OK ({} backend, range {cm:.1} cm)", backend.name);
    }
    Ok(())
}
