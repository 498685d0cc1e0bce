use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use rstest::rstest;
use turret_core::{
    Buttons, EngageCfg, ManualAction, ManualCfg, ManualController, ManualMode, TurretError,
};
use turret_hardware::{SimConfig, SimWorld, SimulatedMotor, SimulatedTurret};
use turret_traits::{Encoder, VirtualClock};

type Controller = ManualController<SimulatedTurret, SimulatedMotor, SimulatedMotor>;

fn rig() -> (Controller, SimWorld, VirtualClock) {
    let clock = VirtualClock::new();
    let world = SimWorld::new(
        SimConfig {
            start_deg: 90.0,
            ..SimConfig::default()
        },
        Arc::new(clock.clone()),
    );
    let ctl = ManualController::new(
        world.turret(),
        world.firing_motor(),
        world.drive_motor(),
        ManualCfg::default(),
        EngageCfg::default(),
        Arc::new(clock.clone()),
    );
    (ctl, world, clock)
}

const NONE: Buttons = Buttons {
    left: false,
    right: false,
};
const LEFT: Buttons = Buttons {
    left: true,
    right: false,
};
const RIGHT: Buttons = Buttons {
    left: false,
    right: true,
};
const BOTH: Buttons = Buttons {
    left: true,
    right: true,
};

#[rstest]
#[case(RIGHT, ManualAction::Drive(30), 30)]
#[case(LEFT, ManualAction::Drive(-30), -30)]
#[case(NONE, ManualAction::Stopped, 0)]
fn drive_mode_moves_the_base(
    #[case] buttons: Buttons,
    #[case] action: ManualAction,
    #[case] power: i8,
) {
    let (mut ctl, world, _clock) = rig();
    assert_eq!(ctl.apply(ManualMode::Drive, buttons, 0).unwrap(), action);
    assert_eq!(world.drive_power(), power);
}

#[rstest]
fn both_buttons_in_drive_mode_fire_continuously() {
    let (mut ctl, world, _clock) = rig();
    ctl.apply(ManualMode::Drive, RIGHT, 0).unwrap();
    let action = ctl.apply(ManualMode::Drive, BOTH, 0).unwrap();
    assert_eq!(action, ManualAction::Burst(-90));
    assert_eq!(world.drive_power(), 0);
    assert_eq!(world.firing_power(), -90);
    assert_eq!(world.shots().len(), 1);

    ctl.apply(ManualMode::Drive, NONE, 0).unwrap();
    assert_eq!(world.firing_power(), 0);
}

#[rstest]
fn rotate_mode_turns_the_turret() {
    let (mut ctl, world, clock) = rig();
    let mut enc = world.turret();
    enc.reset_position().unwrap();
    ctl.apply(ManualMode::Rotate, RIGHT, 0).unwrap();
    turret_traits::Clock::sleep(&clock, std::time::Duration::from_millis(400));
    assert_eq!(enc.position().unwrap(), 20);
    assert_eq!(
        ctl.apply(ManualMode::Rotate, NONE, 0).unwrap(),
        ManualAction::Stopped
    );
    let at = world.turret_angle();
    turret_traits::Clock::sleep(&clock, std::time::Duration::from_millis(400));
    assert_eq!(world.turret_angle(), at);
}

#[rstest]
#[case(0, 70)]
#[case(1000, 90)]
#[case(3000, 100)]
fn both_buttons_in_rotate_mode_fire_a_charged_shot(#[case] hold_ms: u64, #[case] power: u8) {
    let (mut ctl, world, clock) = rig();
    let before = clock.elapsed();
    let action = ctl.apply(ManualMode::Rotate, BOTH, hold_ms).unwrap();
    assert_eq!(action, ManualAction::ChargedShot { power });
    assert_eq!(world.shots().len(), 1);
    assert_eq!(world.firing_power(), 0);
    // power ms of firing plus the 1.1 s reload.
    let spent = (clock.elapsed() - before).as_millis() as u64;
    assert_eq!(spent, u64::from(power) + 1100);
}

#[rstest]
fn colour_outside_modes_stops_everything() {
    let (mut ctl, world, _clock) = rig();
    ctl.apply(ManualMode::Drive, LEFT, 0).unwrap();
    let action = ctl.apply(ManualMode::from_colour(0), RIGHT, 0).unwrap();
    assert_eq!(action, ManualAction::Idle);
    assert_eq!(world.drive_power(), 0);
    assert_eq!(ctl.last_action(), Some(ManualAction::Idle));
}

#[rstest]
fn abort_input_blocks_manual_commands() {
    let (ctl, world, _clock) = rig();
    let pressed = Arc::new(AtomicBool::new(false));
    let p = pressed.clone();
    let mut ctl = ctl.with_estop_check(move || p.load(Ordering::Relaxed), 1);
    ctl.apply(ManualMode::Drive, RIGHT, 0).unwrap();
    pressed.store(true, Ordering::Relaxed);
    let err = ctl.apply(ManualMode::Drive, RIGHT, 0).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<TurretError>(),
        Some(TurretError::Abort(_))
    ));
    assert_eq!(world.drive_power(), 0);
}
