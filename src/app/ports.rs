//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ AppService (domain)
//! ```
//!
//! Driven adapters (light sensor, stepper, indicator, settings file, upload
//! server, clock, event sinks) implement these traits. The
//! [`AppService`](super::service::AppService) consumes them via generics, so
//! the domain core never touches hardware directly.

use crate::config::SystemConfig;
use crate::drivers::button::ManualButtons;
use crate::drivers::indicator::IndicatorPattern;
use crate::drivers::stepper::{Direction, StepOutcome};
use crate::error::{ActuatorError, CommsError, SensorError};

// ───────────────────────────────────────────────────────────────
// Sensor port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

pub trait SensorPort {
    /// One clamped light sample (poll count; smaller is brighter).
    fn sample_brightness(&mut self) -> Result<u32, SensorError>;

    /// Map a sample onto 0..=100.
    fn brightness_percent(&self, count: u32) -> u8;

    /// Current level of the manual jog buttons.
    fn manual_buttons(&mut self) -> ManualButtons;
}

// ───────────────────────────────────────────────────────────────
// Actuator port (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Motion and indication. Position is only ever addressed in percent
/// outside the driver, so an encoder-backed implementation can replace
/// the open-loop stepper without touching callers.
pub trait ActuatorPort {
    /// One pass of the phase table; rejected at the travel limits.
    fn step_once(&mut self, direction: Direction) -> Result<StepOutcome, ActuatorError>;

    /// Drive to an open-percentage. Returns the number of step calls made.
    fn seek_percent(&mut self, percent: u8) -> Result<u32, ActuatorError>;

    fn open_percent(&self) -> u8;

    fn set_indicator(&mut self, pattern: IndicatorPattern) -> Result<(), ActuatorError>;

    /// De-energize the motor coils and indicator lines.
    fn release(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging)
// ───────────────────────────────────────────────────────────────

pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Configuration port (driven adapter: domain ↔ persistent settings)
// ───────────────────────────────────────────────────────────────

/// Loads and persists the user settings.
///
/// Implementations MUST validate before persisting. Invalid ranges are
/// rejected with [`ConfigError::ValidationFailed`], not clamped.
pub trait ConfigPort {
    fn load(&self) -> Result<SystemConfig, ConfigError>;

    fn save(&self, config: &SystemConfig) -> Result<(), ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Settings upload port (configuration-mode collaborator)
// ───────────────────────────────────────────────────────────────

/// Background service that accepts new settings while configuration mode
/// is active.
pub trait SettingsUploadPort {
    /// Start serving. Must not block the caller.
    fn start(&mut self) -> Result<(), CommsError>;

    /// Stop serving, then invoke `on_stopped` (the settings reload).
    fn stop(&mut self, on_stopped: &mut dyn FnMut()) -> Result<(), CommsError>;

    fn is_running(&self) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Clock port
// ───────────────────────────────────────────────────────────────

pub trait ClockPort {
    /// Seconds since the unix epoch, UTC.
    fn now_unix_secs(&self) -> i64;
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`ConfigPort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// No settings file yet (first boot).
    NotFound,
    /// Stored settings failed to deserialize.
    Corrupted,
    /// A field failed range validation; names the field and the range.
    ValidationFailed(&'static str),
    /// Generic I/O error from the storage backend.
    IoError,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "settings not found"),
            Self::Corrupted => write!(f, "settings corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl core::error::Error for ConfigError {}
