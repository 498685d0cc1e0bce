//! `manual`: feed `MODE BUTTONS [HOLD_MS]` lines from a reader into the controller.

use std::io::{BufRead, Write};

use serde_json::json;
use turret_core::{Buttons, EngageCfg, ManualAction, ManualCfg, ManualController, ManualMode};

use crate::backend::Backend;

/// One parsed input line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ManualInput {
    pub mode: ManualMode,
    pub buttons: Buttons,
    pub hold_ms: u64,
}

/// Parse `MODE BUTTONS [HOLD_MS]`; blank lines and `#` comments yield `None`.
pub fn parse_line(line: &str) -> eyre::Result<Option<ManualInput>> {
    let line = line.split('#').next().unwrap_or_default().trim();
    if line.is_empty() {
        return Ok(None);
    }
    let mut parts = line.split_whitespace();
    let mode: ManualMode = parts
        .next()
        .unwrap_or_default()
        .parse()
        .map_err(eyre::Report::new)?;
    let buttons: Buttons = parts
        .next()
        .ok_or_else(|| eyre::eyre!("missing button state (none|left|right|both)"))?
        .parse()
        .map_err(eyre::Report::new)?;
    let hold_ms = match parts.next() {
        Some(h) => h
            .parse::<u64>()
            .map_err(|e| eyre::eyre!("invalid hold time '{h}': {e}"))?,
        None => 0,
    };
    if let Some(extra) = parts.next() {
        eyre::bail!("unexpected trailing input '{extra}'");
    }
    Ok(Some(ManualInput {
        mode,
        buttons,
        hold_ms,
    }))
}

fn action_name(a: ManualAction) -> (&'static str, Option<i16>) {
    match a {
        ManualAction::Idle => ("idle", None),
        ManualAction::Stopped => ("stopped", None),
        ManualAction::Drive(p) => ("drive", Some(i16::from(p))),
        ManualAction::Burst(p) => ("burst", Some(i16::from(p))),
        ManualAction::Rotate(p) => ("rotate", Some(i16::from(p))),
        ManualAction::ChargedShot { power } => ("charged_shot", Some(i16::from(power))),
    }
}

/// Run the teleop loop until `input` is exhausted or a `quit` line.
///
/// Malformed lines are reported on stderr and skipped; hardware errors and
/// the abort input end the session.
pub fn run_manual<I: BufRead, O: Write>(
    backend: Backend,
    manual: ManualCfg,
    engage: EngageCfg,
    estop_debounce_n: u8,
    input: I,
    mut out: O,
    json_mode: bool,
) -> eyre::Result<()> {
    let drive = backend.drive.ok_or_else(|| {
        eyre::eyre!("invalid configuration: manual mode needs pins.drive_pwm and pins.drive_dir")
    })?;
    let mut ctl = ManualController::new(
        backend.turret,
        backend.firing,
        drive,
        manual,
        engage,
        backend.clock.shared(),
    );
    if let Some(check) = backend.estop_check {
        ctl = ctl.with_estop_check(check, estop_debounce_n);
    }
    tracing::info!(backend = backend.name, "manual session start");

    let result = drive_session(&mut ctl, input, &mut out, json_mode);
    ctl.stop_all();
    tracing::info!("manual session end");
    result
}

fn drive_session<T, F, D, I, O>(
    ctl: &mut ManualController<T, F, D>,
    input: I,
    out: &mut O,
    json_mode: bool,
) -> eyre::Result<()>
where
    T: turret_traits::Motor,
    F: turret_traits::Motor,
    D: turret_traits::Motor,
    I: BufRead,
    O: Write,
{
    for (idx, line) in input.lines().enumerate() {
        let line = line?;
        if matches!(line.trim(), "quit" | "exit") {
            break;
        }
        let parsed = match parse_line(&line) {
            Ok(Some(p)) => p,
            Ok(None) => continue,
            Err(e) => {
                eprintln!("line {}: {e}", idx + 1);
                continue;
            }
        };
        let action = ctl.apply(parsed.mode, parsed.buttons, parsed.hold_ms)?;
        let (name, power) = action_name(action);
        if json_mode {
            writeln!(out, "{}", json!({ "line": idx + 1, "action": name, "power": power }))?;
        } else if let Some(p) = power {
            writeln!(out, "{name} {p}")?;
        } else {
            writeln!(out, "{name}")?;
        }
    }
    Ok(())
}
