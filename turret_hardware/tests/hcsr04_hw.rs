#![cfg(feature = "hardware")]

use turret_hardware::HardwareRangeFinder;
use turret_traits::RangeFinder;

// These only make sense on a Raspberry Pi with an HC-SR04 wired to the pins below.

#[test]
fn hcsr04_reads_non_negative_distance() {
    let trig_pin = 23u8; // adjust for your test rig
    let echo_pin = 24u8; // adjust for your test rig
    let mut rf = HardwareRangeFinder::try_new(trig_pin, echo_pin, 30).expect("open sensor");
    let cm = rf.read_cm().expect("ping");
    assert!(cm >= 0.0);
}
