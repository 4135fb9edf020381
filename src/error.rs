//! Unified error types for the blind controller firmware.
//!
//! A single `Error` enum that every subsystem converts into, keeping the
//! control loop's error handling uniform. All variants are `Copy` so they
//! pass through the service and event sink without allocation.
//!
//! Boundary rejections of the stepper (a move that would leave the travel
//! envelope) are *not* errors; they are reported as
//! [`StepOutcome::Rejected`](crate::drivers::stepper::StepOutcome).

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The light sensor could not be read.
    Sensor(SensorError),
    /// A motor or indicator output failed.
    Actuator(ActuatorError),
    /// The settings upload service failed.
    Comms(CommsError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sensor(e) => write!(f, "sensor: {e}"),
            Self::Actuator(e) => write!(f, "actuator: {e}"),
            Self::Comms(e) => write!(f, "comms: {e}"),
        }
    }
}

impl core::error::Error for Error {}

// ---------------------------------------------------------------------------
// Sensor errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// GPIO read returned an error.
    GpioReadFailed,
    /// Driving the discharge level failed.
    GpioWriteFailed,
    /// The sensing pin never went high within the poll budget
    /// (disconnected or dead sensor).
    PollTimeout { polls: u32 },
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GpioReadFailed => write!(f, "GPIO read failed"),
            Self::GpioWriteFailed => write!(f, "GPIO write failed"),
            Self::PollTimeout { polls } => write!(f, "no charge edge after {polls} polls"),
        }
    }
}

impl From<SensorError> for Error {
    fn from(e: SensorError) -> Self {
        Self::Sensor(e)
    }
}

// ---------------------------------------------------------------------------
// Actuator errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorError {
    /// GPIO set failed on a coil or indicator line.
    GpioWriteFailed,
    /// A seek hit the travel envelope before reaching its target.
    /// Cannot happen for targets produced by `seek_percent`; reported
    /// instead of retrying.
    SeekMismatch { target: u32, position: u32 },
}

impl fmt::Display for ActuatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GpioWriteFailed => write!(f, "GPIO write failed"),
            Self::SeekMismatch { target, position } => {
                write!(f, "seek stopped at step {position}, target {target}")
            }
        }
    }
}

impl From<ActuatorError> for Error {
    fn from(e: ActuatorError) -> Self {
        Self::Actuator(e)
    }
}

// ---------------------------------------------------------------------------
// Communications errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommsError {
    /// The upload listener could not bind its port.
    UploadBindFailed,
    /// The upload worker thread could not be spawned.
    UploadSpawnFailed,
    /// The upload worker panicked before it could be joined.
    UploadWorkerPanicked,
}

impl fmt::Display for CommsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UploadBindFailed => write!(f, "settings upload bind failed"),
            Self::UploadSpawnFailed => write!(f, "settings upload thread spawn failed"),
            Self::UploadWorkerPanicked => write!(f, "settings upload worker panicked"),
        }
    }
}

impl From<CommsError> for Error {
    fn from(e: CommsError) -> Self {
        Self::Comms(e)
    }
}
