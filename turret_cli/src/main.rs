#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! `turret`: run an automatic scan-and-engage cycle, teleoperate, or health-check.

mod backend;
mod cli;
mod cycle;
mod error_fmt;
mod manual;

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use clap::Parser;
use eyre::WrapErr;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::cli::{CliLimits, Commands, FILE_GUARD, JSON_MODE, LAST_LIMITS};
use crate::cycle::AutoOverrides;

fn main() {
    if let Err(e) = color_eyre::install() {
        eprintln!("failed to install error reporter: {e}");
    }
    let cli = cli::Cli::parse();
    let _ = JSON_MODE.set(cli.json);

    if let Err(e) = run(cli) {
        let code = error_fmt::exit_code_for_error(&e);
        tracing::error!(error = ?e, code, "turret failed");
        if JSON_MODE.get().copied().unwrap_or(false) {
            println!("{}", error_fmt::format_error_json(&e));
        } else {
            eprintln!("{}", error_fmt::humanize(&e));
        }
        std::process::exit(code);
    }
}

fn load_config(path: &Path) -> eyre::Result<turret_config::Config> {
    let text = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("read config {}", path.display()))?;
    let cfg = turret_config::load_toml(&text)
        .map_err(eyre::Report::new)
        .wrap_err_with(|| format!("parse config {}", path.display()))?;
    cfg.validate()
        .wrap_err_with(|| format!("invalid configuration in {}", path.display()))?;
    Ok(cfg)
}

fn init_tracing(
    json: bool,
    level: Option<&str>,
    logging: &turret_config::Logging,
) -> eyre::Result<()> {
    // RUST_LOG wins over --log-level, which wins over logging.level.
    let fallback = level.or(logging.level.as_deref()).unwrap_or("info");
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    let console = if json {
        fmt::layer().json().with_writer(std::io::stderr).boxed()
    } else {
        fmt::layer()
            .with_target(false)
            .with_writer(std::io::stderr)
            .boxed()
    };

    let file = match &logging.file {
        Some(path) => {
            let path = Path::new(path);
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            let name = path
                .file_name()
                .ok_or_else(|| eyre::eyre!("logging.file must name a file"))?;
            let appender = match logging.rotation.as_deref().unwrap_or("never") {
                "daily" => tracing_appender::rolling::daily(dir, name),
                "hourly" => tracing_appender::rolling::hourly(dir, name),
                "never" => tracing_appender::rolling::never(dir, name),
                other => eyre::bail!("logging.rotation must be never|daily|hourly, got '{other}'"),
            };
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let _ = FILE_GUARD.set(guard);
            Some(fmt::layer().json().with_ansi(false).with_writer(writer))
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file)
        .try_init()
        .map_err(|e| eyre::eyre!("init logging: {e}"))
}

fn run(cli: cli::Cli) -> eyre::Result<()> {
    let cfg = load_config(&cli.config)?;
    init_tracing(cli.json, cli.log_level.as_deref(), &cfg.logging)?;
    let _ = LAST_LIMITS.set(CliLimits::from(&cfg));

    let profile = cli
        .profile
        .as_deref()
        .map(turret_config::load_scan_profile_csv)
        .transpose()?;

    // Ctrl-C latches the same abort input as the E-stop pin.
    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let flag = shutdown.clone();
        if let Err(e) = ctrlc::set_handler(move || flag.store(true, Ordering::Relaxed)) {
            tracing::warn!(error = %e, "failed to install Ctrl-C handler");
        }
    }

    let backend = backend::build(&cfg, profile.as_ref(), shutdown)?;
    match cli.cmd {
        Commands::Auto {
            threshold_cm,
            gap_tolerance,
            min_run_width,
            firing_power,
            dump,
        } => cycle::run_auto(
            backend,
            turret_core::CycleCfg::from(&cfg),
            AutoOverrides {
                threshold_cm,
                gap_tolerance,
                min_run_width,
                firing_power,
            },
            cfg.estop.debounce_n,
            dump,
            cli.json,
        )
        .wrap_err("auto cycle"),
        Commands::Manual => {
            let stdin = std::io::stdin();
            manual::run_manual(
                backend,
                (&cfg.manual).into(),
                (&cfg.engage).into(),
                cfg.estop.debounce_n,
                stdin.lock(),
                std::io::stdout(),
                cli.json,
            )
            .wrap_err("manual session")
        }
        Commands::SelfCheck => cycle::self_check(backend, cli.json),
    }
}
