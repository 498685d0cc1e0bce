use std::sync::Arc;

use rstest::rstest;
use turret_core::{CycleCfg, CycleParams, CycleState, CycleStatus, Turret};
use turret_hardware::{SimConfig, SimTarget, SimWorld};
use turret_traits::VirtualClock;

fn rig(targets: Vec<SimTarget>) -> (Turret, SimWorld) {
    let clock = VirtualClock::new();
    let world = SimWorld::new(
        SimConfig {
            targets,
            ..SimConfig::default()
        },
        Arc::new(clock.clone()),
    );
    let turret = Turret::builder()
        .with_range_finder(world.range_finder())
        .with_turret(world.turret())
        .with_firing(world.firing_motor())
        .with_cycle_cfg(CycleCfg::default())
        .with_clock(Box::new(clock))
        .build()
        .expect("build turret");
    (turret, world)
}

fn two_targets() -> Vec<SimTarget> {
    vec![
        SimTarget {
            start_deg: 40.0,
            end_deg: 55.0,
            distance_cm: 30.0,
        },
        SimTarget {
            start_deg: 120.0,
            end_deg: 130.0,
            distance_cm: 25.0,
        },
    ]
}

#[rstest]
fn full_cycle_engages_each_target_once() {
    let (mut turret, world) = rig(two_targets());
    let report = turret
        .run_auto_cycle(CycleParams::default())
        .expect("cycle");

    assert_eq!(report.target_count, 2);
    assert!((44..=51).contains(&report.targets[0]), "{report:?}");
    assert!((122..=128).contains(&report.targets[1]), "{report:?}");
    assert!(report.scan.detections > 0);

    let shots = world.shots();
    assert_eq!(shots.len(), 2);
    for (shot, target) in shots.iter().zip(&report.targets) {
        assert_eq!(shot.floor() as usize, *target);
    }
    assert_eq!(world.turret_angle(), 0.0);
    assert_eq!(world.firing_power(), 0);
    assert_eq!(turret.state(), CycleState::Done);
}

#[rstest]
fn buffer_stays_readable_after_cycle() {
    let (mut turret, _world) = rig(two_targets());
    let report = turret
        .run_auto_cycle(CycleParams::default())
        .expect("cycle");
    let buf = turret.buffer();
    assert_eq!(buf.len(), 181);
    assert_eq!(buf.targets(), report.targets);
    assert!(buf.is_detected(report.targets[0]));
    assert_eq!(buf.distance(report.targets[1]).map(|d| d <= 50.0), Some(true));
    assert!(!buf.is_detected(90));
    assert!(buf.samples().filter(|s| s.detected).count() >= 20);
}

#[rstest]
fn empty_field_skips_engaging() {
    let (mut turret, world) = rig(Vec::new());
    turret.begin();
    let mut seen = Vec::new();
    let report = loop {
        match turret.step().expect("step") {
            CycleStatus::Running(state) => seen.push(state),
            CycleStatus::Complete(report) => break report,
            CycleStatus::Aborted(e) => panic!("unexpected abort: {e}"),
        }
    };
    assert_eq!(report.target_count, 0);
    assert_eq!(
        seen,
        vec![
            CycleState::Homing,
            CycleState::Scanning,
            CycleState::Rewinding,
            CycleState::Refining,
            CycleState::Extracting,
            CycleState::Parking,
        ]
    );
    assert!(world.shots().is_empty());
}

#[rstest]
fn stepping_a_finished_cycle_is_an_error() {
    let (mut turret, _world) = rig(Vec::new());
    turret
        .run_auto_cycle(CycleParams::default())
        .expect("cycle");
    let err = turret.step().expect_err("done cycle must not step");
    assert!(err.to_string().contains("begin()"));
    turret.begin();
    assert_eq!(turret.state(), CycleState::Idle);
    assert!(turret.buffer().samples().all(|s| !s.detected));
}

#[rstest]
fn engaged_stage_appears_with_targets() {
    let (mut turret, _world) = rig(two_targets());
    turret.begin();
    let mut seen = Vec::new();
    loop {
        match turret.step().expect("step") {
            CycleStatus::Running(state) => seen.push(state),
            CycleStatus::Complete(_) => break,
            CycleStatus::Aborted(e) => panic!("unexpected abort: {e}"),
        }
    }
    assert!(seen.contains(&CycleState::Engaging));
}

#[rstest]
fn threshold_override_hides_far_targets() {
    let (mut turret, world) = rig(two_targets());
    let report = turret
        .run_auto_cycle(CycleParams {
            threshold_cm: 27.0,
            ..CycleParams::default()
        })
        .expect("cycle");
    assert_eq!(report.target_count, 1);
    assert!((122..=128).contains(&report.targets[0]));
    assert_eq!(world.shots().len(), 1);
}

#[rstest]
fn invalid_params_are_rejected_before_moving() {
    let (mut turret, world) = rig(two_targets());
    let err = turret
        .run_auto_cycle(CycleParams {
            firing_power: 0,
            ..CycleParams::default()
        })
        .expect_err("zero firing power");
    assert!(err.to_string().contains("firing_power"));
    assert_eq!(world.turret_angle(), 45.0);
}

#[rstest]
fn cycles_can_repeat() {
    let (mut turret, world) = rig(two_targets());
    let first = turret.run_auto_cycle(CycleParams::default()).expect("first");
    let second = turret.run_auto_cycle(CycleParams::default()).expect("second");
    assert_eq!(first.target_count, second.target_count);
    assert_eq!(world.shots().len(), 4);
}
