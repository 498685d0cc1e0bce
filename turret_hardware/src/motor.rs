use std::sync::Arc;
use std::sync::atomic::{AtomicI8, AtomicI32, Ordering};

use rppal::gpio::{Gpio, InputPin, Level, OutputPin, Trigger};
use tracing::trace;

use crate::error::{HwError, Result};

const PWM_FREQ_HZ: f64 = 1_000.0;

fn gpio_err(what: &str) -> impl FnOnce(rppal::gpio::Error) -> HwError + '_ {
    move |e| HwError::Gpio(format!("{what}: {e}"))
}

/// DC motor behind an H-bridge: software PWM on one pin, direction on another.
pub struct PwmMotor {
    pwm: OutputPin,
    dir: OutputPin,
    /// Sign of the last command (-1, 0, 1), shared with an attached encoder.
    direction: Arc<AtomicI8>,
}

impl PwmMotor {
    pub fn new(pwm_pin: u8, dir_pin: u8) -> Result<Self> {
        let gpio = Gpio::new().map_err(gpio_err("open gpio"))?;
        let mut pwm = gpio.get(pwm_pin).map_err(gpio_err("open motor pwm"))?.into_output();
        let dir = gpio.get(dir_pin).map_err(gpio_err("open motor dir"))?.into_output();
        pwm.set_low();
        Ok(Self {
            pwm,
            dir,
            direction: Arc::new(AtomicI8::new(0)),
        })
    }

    pub fn drive(&mut self, power: i8) -> Result<()> {
        let power = power.clamp(-100, 100);
        if power == 0 {
            self.pwm.clear_pwm().map_err(gpio_err("clear pwm"))?;
            self.pwm.set_low();
            self.direction.store(0, Ordering::Relaxed);
            return Ok(());
        }
        if power > 0 {
            self.dir.set_high();
        } else {
            self.dir.set_low();
        }
        self.direction.store(power.signum(), Ordering::Relaxed);
        let duty = f64::from(power.unsigned_abs()) / 100.0;
        self.pwm
            .set_pwm_frequency(PWM_FREQ_HZ, duty)
            .map_err(gpio_err("set pwm"))?;
        trace!(power, duty, "motor drive");
        Ok(())
    }
}

/// Single-channel pulse encoder; the count direction follows the motor command.
pub struct PulseEncoder {
    _pin: InputPin,
    ticks: Arc<AtomicI32>,
    origin: i32,
    pulses_per_degree: f32,
}

impl PulseEncoder {
    pub fn attach(pin: u8, motor: &PwmMotor, pulses_per_degree: f32) -> Result<Self> {
        let gpio = Gpio::new().map_err(gpio_err("open gpio"))?;
        let mut input = gpio
            .get(pin)
            .map_err(gpio_err("open encoder"))?
            .into_input_pullup();
        let ticks = Arc::new(AtomicI32::new(0));
        let ticks_cb = ticks.clone();
        let direction = motor.direction.clone();
        input
            .set_async_interrupt(Trigger::RisingEdge, move |_level: Level| {
                let dir = i32::from(direction.load(Ordering::Relaxed));
                ticks_cb.fetch_add(dir, Ordering::Relaxed);
            })
            .map_err(gpio_err("encoder interrupt"))?;
        Ok(Self {
            _pin: input,
            ticks,
            origin: 0,
            pulses_per_degree: pulses_per_degree.max(f32::EPSILON),
        })
    }

    pub fn degrees(&self) -> i32 {
        let raw = self.ticks.load(Ordering::Relaxed) - self.origin;
        (raw as f32 / self.pulses_per_degree).floor() as i32
    }

    pub fn zero(&mut self) {
        self.origin = self.ticks.load(Ordering::Relaxed);
    }
}
