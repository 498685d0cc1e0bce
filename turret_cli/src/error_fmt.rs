//! Human-readable error descriptions and structured JSON error formatting.

use crate::cli::LAST_LIMITS;
use turret_core::error::{AbortReason, Motion, TurretError};

/// Stable name for cycle-ending errors, used in JSON output.
pub fn abort_reason_name(e: &TurretError) -> &'static str {
    match e {
        TurretError::Abort(AbortReason::Estop) => "Estop",
        TurretError::StallTimeout { motion, .. } => match motion {
            Motion::Homing => "HomingStall",
            Motion::Sweep => "SweepStall",
            Motion::Positioning => "PositioningStall",
        },
        _ => "Error",
    }
}

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    use turret_core::error::BuildError;

    // Typed matches first
    if let Some(be) = err.downcast_ref::<BuildError>() {
        return match be {
            BuildError::MissingRangeFinder => {
                "What happened: No range finder was provided to the turret engine.\nLikely causes: The ultrasonic sensor failed to initialize or was not wired into the builder.\nHow to fix: Ensure the range finder is created successfully and passed via with_range_finder(...).".to_string()
            }
            BuildError::MissingTurret => {
                "What happened: No turret drive was provided to the turret engine.\nLikely causes: The rotation motor or its encoder failed to initialize.\nHow to fix: Ensure the turret motor is created successfully and passed via with_turret(...).".to_string()
            }
            BuildError::MissingFiring => {
                "What happened: No firing motor was provided to the turret engine.\nLikely causes: The firing motor driver failed to initialize.\nHow to fix: Ensure the firing motor is created successfully and passed via with_firing(...).".to_string()
            }
            BuildError::InvalidConfig(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: Missing or out-of-range values in the TOML.\nHow to fix: Edit the config file, then rerun."
            ),
        };
    }

    if let Some(te) = err.downcast_ref::<TurretError>() {
        return match te {
            TurretError::Abort(AbortReason::Estop) => "What happened: Emergency stop was triggered.\nLikely causes: E-stop button pressed, input pin active, or Ctrl-C.\nHow to fix: Release E-stop, ensure wiring is correct, then start a new cycle.".to_string(),
            TurretError::StallTimeout { motion: Motion::Homing, waited_ms } => format!(
                "What happened: Homing did not reach the mechanical stop within {waited_ms} ms.\nLikely causes: Encoder not counting, or the turret keeps moving (no stop reached).\nHow to fix: Check the encoder wiring and the lower stop; raise homing.timeout_ms if the turret is slow."
            ),
            TurretError::StallTimeout { motion: Motion::Sweep, waited_ms } => format!(
                "What happened: The sweep did not cover the scan range within {waited_ms} ms.\nLikely causes: Jammed turret, sweep power too low to move, or encoder not counting.\nHow to fix: Check the mechanics, raise scan.sweep_power or scan.timeout_ms."
            ),
            TurretError::StallTimeout { motion: Motion::Positioning, waited_ms } => format!(
                "What happened: The turret did not reach a target angle within {waited_ms} ms.\nLikely causes: Jammed turret or positioning power too low.\nHow to fix: Check the mechanics, raise engage.positioning_power or engage.positioning_timeout_ms."
            ),
            TurretError::Config(msg) => format!(
                "What happened: Invalid cycle parameter ({msg}).\nLikely causes: An out-of-range command-line override.\nHow to fix: Check the auto options and rerun."
            ),
            other => format!(
                "What happened: {other}.\nLikely causes: See logs.\nHow to fix: Re-run with --log-level=debug or set RUST_LOG for more detail."
            ),
        };
    }

    if err.downcast_ref::<toml::de::Error>().is_some() {
        return format!(
            "What happened: The config file is not valid TOML for this program.\nLikely causes: Typo in a key or a value of the wrong type.\nHow to fix: Fix the file and rerun. Parser said: {err:#}"
        );
    }

    // String-based heuristics for errors coming from init or config
    let msg = err.to_string();
    let lower = msg.to_ascii_lowercase();

    // Scan profile CSV header special-case
    if lower.contains("scan profile csv must have headers") {
        return "Invalid headers in scan profile CSV. Expected 'angle,distance_cm'.".to_string();
    }

    if lower.contains("echo timeout") {
        return "What happened: The range finder echo line stayed high.\nLikely causes: Wrong trig/echo pins, wiring/power issues, or echo timeout too low.\nHow to fix: Check [pins] in the config, verify 5V/GND, and raise hardware.echo_timeout_ms.".to_string();
    }

    if lower.contains("pins") && lower.contains("open") {
        return "What happened: Failed to initialize hardware pins.\nLikely causes: Incorrect pin numbers or insufficient GPIO permissions.\nHow to fix: Fix the [pins] values in the config; ensure the process has permission to access GPIO.".to_string();
    }

    if lower.contains("invalid configuration") || lower.contains(" must ") {
        return format!(
            "What happened: Configuration is invalid or incomplete ({err:#}).\nLikely causes: Missing [pins] for the hardware backend, or out-of-range values.\nHow to fix: Edit the TOML config and try again."
        );
    }

    // Generic fallback
    let mut cause = String::new();
    if let Some(src) = err.source() {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

/// Map cycle aborts to stable exit codes; everything else returns 1.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    match err.downcast_ref::<TurretError>() {
        Some(TurretError::Abort(AbortReason::Estop)) => 2,
        Some(TurretError::StallTimeout { motion, .. }) => match motion {
            Motion::Homing => 3,
            Motion::Sweep => 4,
            Motion::Positioning => 5,
        },
        _ => 1,
    }
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    use serde_json::json;

    if let Some(te) = err.downcast_ref::<TurretError>()
        && te.is_cycle_abort()
    {
        let msg = humanize(err);
        let limits = LAST_LIMITS.get();
        let detail_obj = match te {
            TurretError::StallTimeout { motion, waited_ms } => {
                let limit_ms = limits.map(|l| match motion {
                    Motion::Homing => l.homing_timeout_ms,
                    Motion::Sweep => l.scan_timeout_ms,
                    Motion::Positioning => l.positioning_timeout_ms,
                });
                Some(json!({ "motion": motion.to_string(), "waited_ms": waited_ms, "timeout_ms": limit_ms }))
            }
            TurretError::Abort(_) => limits.map(|l| json!({ "debounce_n": l.estop_debounce_n })),
            _ => None,
        };

        let obj = if let Some(d) = detail_obj {
            json!({ "reason": abort_reason_name(te), "details": d, "message": msg })
        } else {
            json!({ "reason": abort_reason_name(te), "message": msg })
        };
        return obj.to_string();
    }

    // Generic error JSON
    json!({ "reason": "Error", "message": humanize(err) }).to_string()
}
