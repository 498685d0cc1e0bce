//! Maps `Box<dyn Error>` from trait boundaries to typed `TurretError`.
//!
//! `turret_traits` keeps its error type open; this module narrows it, with a
//! feature-gated path for `turret_hardware::HwError` downcasting.

use eyre::WrapErr;
use turret_traits::HwResult;

use crate::error::{Result, TurretError};

/// Map a trait-boundary error to a typed `TurretError`.
///
/// Known hardware error types are downcast first; anything else falls back
/// to string heuristics.
pub fn map_hw_error(e: &(dyn std::error::Error + 'static)) -> TurretError {
    #[cfg(feature = "hardware-errors")]
    {
        if let Some(hw) = e.downcast_ref::<turret_hardware::error::HwError>() {
            return match hw {
                turret_hardware::error::HwError::Io(io) => TurretError::Hardware(io.to_string()),
                other => TurretError::HardwareFault(other.to_string()),
            };
        }
    }

    let s = e.to_string();
    if s.to_lowercase().contains("fault") {
        TurretError::HardwareFault(s)
    } else {
        TurretError::Hardware(s)
    }
}

/// Lift a device call into the core's error type with `what` as context.
pub(crate) fn hw<T>(r: HwResult<T>, what: &'static str) -> Result<T> {
    r.map_err(|e| eyre::Report::new(map_hw_error(&*e)))
        .wrap_err(what)
}

/// Best-effort stop used on every exit path; failures are only logged.
pub(crate) fn stop_quietly<M: turret_traits::Motor + ?Sized>(motor: &mut M, what: &'static str) {
    if let Err(e) = motor.stop() {
        tracing::warn!(error = %map_hw_error(&*e), "{what} stop failed");
    }
}
