//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing application events to the logger
//! (UART / USB-CDC on the device, stderr in simulation).

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] as one tagged line.
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started(mode) => {
                info!("START | initial_mode={:?}", mode);
            }
            AppEvent::ModeChanged { from, to } => {
                info!("MODE | {:?} -> {:?}", from, to);
            }
            AppEvent::ConfigEntered => {
                info!("SETUP | configuration mode on, upload server listening");
            }
            AppEvent::ConfigExited => {
                info!("SETUP | configuration mode off");
            }
            AppEvent::SettingsReloaded(source) => {
                info!("SETUP | settings reloaded from {}", source);
            }
            AppEvent::TargetReached { percent, steps } => {
                info!("MOTOR | at {}% open ({} step calls)", percent, steps);
            }
            AppEvent::SeekFailed(e) => {
                warn!("MOTOR | {}", e);
            }
            AppEvent::SensorFault(e) => {
                warn!("SENSOR | {}", e);
            }
            AppEvent::Shutdown => {
                info!("STOP | outputs released");
            }
        }
    }
}
