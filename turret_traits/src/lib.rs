//! Hardware capability traits for the scanning turret.
//!
//! The engine in `turret_core` only ever talks to these traits, so the same
//! control code drives real GPIO backends, the simulator and test doubles.

pub mod clock;

pub use clock::{Clock, MonotonicClock, VirtualClock};

pub type HwResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// On-demand distance sensor (ultrasonic range finder).
pub trait RangeFinder {
    /// Current distance in centimetres. A missing echo is reported as a large
    /// reading rather than an error.
    fn read_cm(&mut self) -> HwResult<f32>;
}

/// Signed-power actuator. Power is in `-100..=100`.
pub trait Motor {
    fn set_power(&mut self, power: i8) -> HwResult<()>;

    fn stop(&mut self) -> HwResult<()> {
        self.set_power(0)
    }
}

/// Rotation feedback in ticks (1 tick ~ 1 degree) relative to a resettable origin.
pub trait Encoder {
    fn position(&mut self) -> HwResult<i32>;
    fn reset_position(&mut self) -> HwResult<()>;
}

/// A motor with position feedback: the turret rotation axis.
pub trait TurretDrive: Motor + Encoder {}

impl<T: Motor + Encoder + ?Sized> TurretDrive for T {}

impl<R: RangeFinder + ?Sized> RangeFinder for Box<R> {
    fn read_cm(&mut self) -> HwResult<f32> {
        (**self).read_cm()
    }
}

impl<M: Motor + ?Sized> Motor for Box<M> {
    fn set_power(&mut self, power: i8) -> HwResult<()> {
        (**self).set_power(power)
    }

    fn stop(&mut self) -> HwResult<()> {
        (**self).stop()
    }
}

impl<E: Encoder + ?Sized> Encoder for Box<E> {
    fn position(&mut self) -> HwResult<i32> {
        (**self).position()
    }

    fn reset_position(&mut self) -> HwResult<()> {
        (**self).reset_position()
    }
}
