//! Shared mutable context threaded through every mode handler.
//!
//! The application service fills in the sensor snapshot before each tick,
//! the handlers write actuator commands, and the service applies them to
//! the hardware afterwards.

use crate::config::Settings;
use crate::control::clock::LocalTime;
use crate::drivers::button::ManualButtons;
use crate::drivers::indicator::IndicatorPattern;
use crate::drivers::stepper::Direction;

// ---------------------------------------------------------------------------
// Sensor snapshot
// ---------------------------------------------------------------------------

/// A clamped light sample and its percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Brightness {
    pub count: u32,
    pub percent: u8,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SensorSnapshot {
    /// Local calendar position for the strategies.
    pub local: LocalTime,
    /// `None` when not sampled this tick or when sampling failed.
    pub brightness: Option<Brightness>,
    pub buttons: ManualButtons,
}

// ---------------------------------------------------------------------------
// Actuator commands
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MotionCommand {
    #[default]
    Hold,
    /// One `step_once` call in the given direction.
    Jog(Direction),
    /// Seek to an open-percentage.
    Seek(u8),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActuatorCommands {
    pub motion: MotionCommand,
    pub indicator: IndicatorPattern,
}

// ---------------------------------------------------------------------------
// ControlContext
// ---------------------------------------------------------------------------

pub struct ControlContext {
    /// Ticks since the current mode was entered.
    pub ticks_in_mode: u64,
    pub total_ticks: u64,

    /// Latest readings; updated before each tick.
    pub sensors: SensorSnapshot,

    /// Applied to the hardware after each tick.
    pub commands: ActuatorCommands,

    pub settings: Settings,
}

impl ControlContext {
    pub fn new(settings: Settings) -> Self {
        Self {
            ticks_in_mode: 0,
            total_ticks: 0,
            sensors: SensorSnapshot::default(),
            commands: ActuatorCommands::default(),
            settings,
        }
    }

    /// Whether the current local time is inside the user's close window.
    pub fn in_close_window(&self) -> bool {
        self.settings
            .close_window
            .contains(self.sensors.local.minute_of_day)
    }
}
