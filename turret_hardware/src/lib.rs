pub mod error;
#[cfg(feature = "hardware")]
pub mod hcsr04;
#[cfg(feature = "hardware")]
pub mod motor;
pub mod sim;
pub mod util;

pub use sim::{
    MotorRole, NO_ECHO_CM, SimConfig, SimTarget, SimWorld, SimulatedMotor, SimulatedRangeFinder,
    SimulatedTurret,
};

#[cfg(feature = "hardware")]
pub use hardware::{HardwareMotor, HardwareRangeFinder, HardwareTurret, make_estop_checker};

#[cfg(feature = "hardware")]
pub mod hardware {
    use std::sync::Mutex;
    use std::time::{Duration, Instant};

    use turret_traits::{Encoder, HwResult, Motor, RangeFinder};

    use crate::error::{HwError, Result};
    use crate::hcsr04::HcSr04;
    use crate::motor::{PulseEncoder, PwmMotor};

    pub struct HardwareRangeFinder {
        sensor: HcSr04,
    }

    impl HardwareRangeFinder {
        pub fn try_new(trig_pin: u8, echo_pin: u8, echo_timeout_ms: u64) -> Result<Self> {
            let sensor = HcSr04::new(trig_pin, echo_pin, Duration::from_millis(echo_timeout_ms))?;
            Ok(Self { sensor })
        }
    }

    impl RangeFinder for HardwareRangeFinder {
        fn read_cm(&mut self) -> HwResult<f32> {
            let mut attempts = 0;
            let max_attempts = 3;
            loop {
                match self.sensor.ping_cm() {
                    Ok(cm) => return Ok(cm),
                    Err(HwError::EchoTimeout) if attempts < max_attempts => {
                        attempts += 1;
                        tracing::warn!(retries = attempts, "echo stuck high, retrying");
                    }
                    Err(e) => {
                        tracing::error!("Range finder error: {}", e);
                        return Err(Box::new(e));
                    }
                }
            }
        }
    }

    pub struct HardwareMotor {
        motor: PwmMotor,
    }

    impl HardwareMotor {
        pub fn try_new(pwm_pin: u8, dir_pin: u8) -> Result<Self> {
            Ok(Self {
                motor: PwmMotor::new(pwm_pin, dir_pin)?,
            })
        }
    }

    impl Motor for HardwareMotor {
        fn set_power(&mut self, power: i8) -> HwResult<()> {
            self.motor.drive(power)?;
            Ok(())
        }
    }

    pub struct HardwareTurret {
        motor: PwmMotor,
        encoder: PulseEncoder,
    }

    impl HardwareTurret {
        pub fn try_new(
            pwm_pin: u8,
            dir_pin: u8,
            encoder_pin: u8,
            pulses_per_degree: f32,
        ) -> Result<Self> {
            let motor = PwmMotor::new(pwm_pin, dir_pin)?;
            let encoder = PulseEncoder::attach(encoder_pin, &motor, pulses_per_degree)?;
            Ok(Self { motor, encoder })
        }
    }

    impl Motor for HardwareTurret {
        fn set_power(&mut self, power: i8) -> HwResult<()> {
            self.motor.drive(power)?;
            Ok(())
        }
    }

    impl Encoder for HardwareTurret {
        fn position(&mut self) -> HwResult<i32> {
            Ok(self.encoder.degrees())
        }

        fn reset_position(&mut self) -> HwResult<()> {
            self.encoder.zero();
            Ok(())
        }
    }

    /// Build an abort-input checker polling `pin` at most every `poll_ms`.
    pub fn make_estop_checker(
        pin: u8,
        active_low: bool,
        poll_ms: u64,
    ) -> Result<Box<dyn Fn() -> bool + Send + Sync>> {
        let gpio = rppal::gpio::Gpio::new().map_err(|e| HwError::Gpio(e.to_string()))?;
        let input = gpio
            .get(pin)
            .map_err(|e| HwError::Gpio(format!("open estop pin: {e}")))?
            .into_input_pullup();
        let poll = Duration::from_millis(poll_ms.max(1));
        let state = Mutex::new((input, None::<(Instant, bool)>));
        Ok(Box::new(move || {
            let Ok(mut guard) = state.lock() else {
                return true;
            };
            let (input, cached) = &mut *guard;
            if let Some((at, pressed)) = *cached
                && at.elapsed() < poll
            {
                return pressed;
            }
            let pressed = input.is_low() == active_low;
            *cached = Some((Instant::now(), pressed));
            pressed
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use turret_traits::{Encoder, Motor, RangeFinder, VirtualClock};

    #[test]
    fn test_simulated_devices_share_one_world() {
        let world = SimWorld::new(SimConfig::default(), Arc::new(VirtualClock::new()));
        let mut turret = world.turret();
        let mut rf = world.range_finder();
        turret.reset_position().unwrap();
        assert_eq!(turret.position().unwrap(), 0);
        assert_eq!(rf.read_cm().unwrap(), NO_ECHO_CM);
    }

    #[test]
    fn test_simulated_drive_motor() {
        let world = SimWorld::new(SimConfig::default(), Arc::new(VirtualClock::new()));
        let mut drive = world.drive_motor();
        assert_eq!(drive.role(), MotorRole::Drive);
        drive.set_power(30).unwrap();
        assert_eq!(world.drive_power(), 30);
        drive.stop().unwrap();
        assert_eq!(world.drive_power(), 0);
    }
}
