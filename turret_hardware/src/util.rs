use std::time::{Duration, Instant};

use crate::error::{HwError, Result};

/// Wait while `busy` keeps returning true, or until `timeout` expires.
///
/// Returns how long the condition held. A zero `poll_interval` spins instead
/// of sleeping, which the echo timing of ultrasonic sensors needs.
pub fn wait_while_with_timeout(
    mut busy: impl FnMut() -> bool,
    timeout: Duration,
    poll_interval: Duration,
) -> Result<Duration> {
    let start = Instant::now();
    let deadline = start + timeout;
    while busy() {
        if Instant::now() >= deadline {
            return Err(HwError::EchoTimeout);
        }
        if poll_interval.is_zero() {
            std::hint::spin_loop();
        } else {
            std::thread::sleep(poll_interval);
        }
    }
    Ok(start.elapsed())
}
