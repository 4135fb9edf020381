//! Outbound application events.
//!
//! The [`AppService`](super::service::AppService) emits these through the
//! [`EventSink`](super::ports::EventSink) port. Adapters on the other side
//! decide what to do with them.

use crate::config::SettingsSource;
use crate::error::{ActuatorError, SensorError};
use crate::fsm::OperationMode;

#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// The service has started (carries the initial mode).
    Started(OperationMode),

    ModeChanged { from: OperationMode, to: OperationMode },

    ConfigEntered,

    ConfigExited,

    /// Settings were re-read after configuration mode.
    SettingsReloaded(SettingsSource),

    /// A seek finished; `steps` is the number of step calls it took.
    TargetReached { percent: u8, steps: u32 },

    SeekFailed(ActuatorError),

    SensorFault(SensorError),

    /// Outputs released; the service will not actuate again.
    Shutdown,
}
