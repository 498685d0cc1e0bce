use std::sync::Arc;

use rstest::rstest;
use turret_core::error::BuildError;
use turret_core::{CycleCfg, CycleParams, ScanCfg, Turret, build_turret};
use turret_hardware::{SimConfig, SimWorld};
use turret_traits::VirtualClock;

fn world() -> SimWorld {
    SimWorld::new(SimConfig::default(), Arc::new(VirtualClock::new()))
}

#[rstest]
fn missing_range_finder_yields_typed_build_error() {
    let w = world();
    let err = Turret::builder()
        .with_turret(w.turret())
        .with_firing(w.firing_motor())
        .try_build()
        .expect_err("should fail with MissingRangeFinder");
    match err.downcast_ref::<BuildError>() {
        Some(BuildError::MissingRangeFinder) => {}
        other => panic!("expected MissingRangeFinder, got: {other:?}"),
    }
}

#[rstest]
fn missing_turret_yields_typed_build_error() {
    let w = world();
    let err = Turret::builder()
        .with_range_finder(w.range_finder())
        .with_firing(w.firing_motor())
        .try_build()
        .expect_err("should fail with MissingTurret");
    assert!(matches!(
        err.downcast_ref::<BuildError>(),
        Some(BuildError::MissingTurret)
    ));
}

#[rstest]
fn missing_firing_yields_typed_build_error() {
    let w = world();
    let err = Turret::builder()
        .with_range_finder(w.range_finder())
        .with_turret(w.turret())
        .try_build()
        .expect_err("should fail with MissingFiring");
    assert!(matches!(
        err.downcast_ref::<BuildError>(),
        Some(BuildError::MissingFiring)
    ));
}

fn cfg_with(f: impl FnOnce(&mut CycleCfg)) -> CycleCfg {
    let mut c = CycleCfg::default();
    f(&mut c);
    c
}

#[rstest]
#[case(cfg_with(|c| c.scan.range_deg = 1), "range_deg")]
#[case(cfg_with(|c| c.scan.sweep_power = 0), "sweep_power")]
#[case(cfg_with(|c| c.scan.sample_ms = 0), "sample_ms")]
#[case(cfg_with(|c| c.engage.positioning_power = -5), "positioning_power")]
#[case(cfg_with(|c| c.homing.power = 0), "homing power")]
#[case(cfg_with(|c| c.homing.poll_ms = 0), "homing poll_ms")]
#[case(cfg_with(|c| c.engage.firing_power = 0), "firing_power")]
#[case(cfg_with(|c| c.scan.threshold_cm = f32::NAN), "threshold_cm")]
fn invalid_config_is_rejected(#[case] cfg: CycleCfg, #[case] needle: &str) {
    let w = world();
    let err = build_turret(
        w.range_finder(),
        w.turret(),
        w.firing_motor(),
        cfg,
        None,
        None,
        None,
    )
    .expect_err("invalid config");
    match err.downcast_ref::<BuildError>() {
        Some(BuildError::InvalidConfig(msg)) => assert!(msg.contains(needle), "{msg}"),
        other => panic!("expected InvalidConfig, got: {other:?}"),
    }
}

#[rstest]
fn explicit_params_override_config() {
    let w = world();
    let turret = build_turret(
        w.range_finder(),
        w.turret(),
        w.firing_motor(),
        CycleCfg {
            scan: ScanCfg {
                range_deg: 91,
                ..ScanCfg::default()
            },
            ..CycleCfg::default()
        },
        None,
        Some(0),
        None,
    )
    .expect("build");
    assert_eq!(turret.buffer().len(), 91);
    assert_eq!(turret.params(), CycleParams::default());
}
