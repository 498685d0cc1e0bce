use std::time::Duration;
use tracing::trace;

use crate::error::{HwError, Result};
use crate::sim::NO_ECHO_CM;
use crate::util::wait_while_with_timeout;

/// Round-trip microseconds per centimetre at ~20 °C.
const US_PER_CM: f32 = 58.0;

pub struct HcSr04 {
    trig: rppal::gpio::OutputPin,
    echo: rppal::gpio::InputPin,
    echo_timeout: Duration,
}

impl HcSr04 {
    pub fn new(trig_pin: u8, echo_pin: u8, echo_timeout: Duration) -> Result<Self> {
        let gpio = rppal::gpio::Gpio::new().map_err(|e| HwError::Gpio(e.to_string()))?;
        let mut trig = gpio
            .get(trig_pin)
            .map_err(|e| HwError::Gpio(format!("open hcsr04 trig: {e}")))?
            .into_output();
        let echo = gpio
            .get(echo_pin)
            .map_err(|e| HwError::Gpio(format!("open hcsr04 echo: {e}")))?
            .into_input();
        trig.set_low();
        Ok(Self {
            trig,
            echo,
            echo_timeout,
        })
    }

    /// Fire one ping and time the echo pulse.
    ///
    /// No echo start within the timeout reads as `NO_ECHO_CM`; an echo line
    /// stuck high is a hardware fault.
    pub fn ping_cm(&mut self) -> Result<f32> {
        self.trig.set_high();
        std::thread::sleep(Duration::from_micros(10));
        self.trig.set_low();

        let echo = &self.echo;
        if wait_while_with_timeout(|| echo.is_low(), self.echo_timeout, Duration::ZERO).is_err() {
            trace!("hcsr04 no echo");
            return Ok(NO_ECHO_CM);
        }
        let width = wait_while_with_timeout(|| echo.is_high(), self.echo_timeout, Duration::ZERO)?;
        let cm = width.as_micros() as f32 / US_PER_CM;
        trace!(cm, "hcsr04 ping");
        Ok(cm)
    }
}
