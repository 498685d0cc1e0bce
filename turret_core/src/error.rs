use thiserror::Error;

/// The blocking motion a bounded wait was guarding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Motion {
    Homing,
    Sweep,
    Positioning,
}

impl core::fmt::Display for Motion {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let s = match self {
            Motion::Homing => "homing",
            Motion::Sweep => "sweep",
            Motion::Positioning => "positioning",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum AbortReason {
    #[error("operator abort input")]
    Estop,
}

#[derive(Debug, Error, Clone)]
pub enum TurretError {
    #[error("hardware error: {0}")]
    Hardware(String),
    #[error("hardware fault: {0}")]
    HardwareFault(String),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("{motion} did not finish within {waited_ms} ms")]
    StallTimeout { motion: Motion, waited_ms: u64 },
    #[error("invalid state: {0}")]
    State(String),
    #[error("aborted: {0}")]
    Abort(AbortReason),
}

#[derive(Debug, Error, Clone)]
pub enum BuildError {
    #[error("missing range finder")]
    MissingRangeFinder,
    #[error("missing turret drive")]
    MissingTurret,
    #[error("missing firing motor")]
    MissingFiring,
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;

impl TurretError {
    /// True for errors that end a cycle through the abort path rather than `Err`.
    pub fn is_cycle_abort(&self) -> bool {
        matches!(self, Self::StallTimeout { .. } | Self::Abort(_))
    }
}
