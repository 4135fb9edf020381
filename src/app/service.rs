//! Application service: the hexagonal core.
//!
//! [`AppService`] owns the mode machine and the shared control context.
//! All I/O flows through port traits injected at call sites, making the
//! entire service testable with mock adapters.
//!
//! ```text
//!   SensorPort ──▶ ┌─────────────────────────┐ ──▶ EventSink
//!                  │       AppService        │
//! ActuatorPort ◀── │  ModeMachine · Context  │ ◀── ClockPort
//!                  └─────────────────────────┘
//!                     ▲                 ▲
//!          SettingsUploadPort       ConfigPort
//! ```

use log::{debug, info, warn};

use crate::config::{Settings, load_settings};
use crate::control::clock::LocalTime;
use crate::drivers::button::ManualButtons;
use crate::drivers::stepper::StepOutcome;
use crate::error::Error;
use crate::events::{Event, EventQueue};
use crate::fsm::context::{Brightness, ControlContext, MotionCommand, SensorSnapshot};
use crate::fsm::states::build_state_table;
use crate::fsm::{ModeMachine, OperationMode};

use super::events::AppEvent;
use super::ports::{ActuatorPort, ClockPort, ConfigPort, EventSink, SensorPort, SettingsUploadPort};

pub struct AppService {
    machine: ModeMachine,
    ctx: ControlContext,
    tick_count: u64,
    /// Bumped every time settings are replaced.
    settings_generation: u32,
    shut_down: bool,
}

impl AppService {
    /// Does **not** start the machine; call [`start`](Self::start) next.
    pub fn new(settings: Settings) -> Self {
        Self {
            machine: ModeMachine::new(build_state_table(), OperationMode::Manual),
            ctx: ControlContext::new(settings),
            tick_count: 0,
            settings_generation: 0,
            shut_down: false,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    pub fn start(&mut self, hw: &mut impl ActuatorPort, sink: &mut impl EventSink) {
        self.machine.start(&mut self.ctx);
        self.apply_indicator(hw);
        sink.emit(&AppEvent::Started(self.machine.current_mode()));
        info!("AppService started in {:?}", self.machine.current_mode());
    }

    /// Stop an active upload server and release every output. Idempotent.
    pub fn shutdown(
        &mut self,
        hw: &mut impl ActuatorPort,
        upload: &mut impl SettingsUploadPort,
        sink: &mut impl EventSink,
    ) {
        if self.shut_down {
            return;
        }
        if upload.is_running() {
            if let Err(e) = upload.stop(&mut || {}) {
                warn!("Shutdown: {}", Error::from(e));
            }
        }
        hw.release();
        self.shut_down = true;
        sink.emit(&AppEvent::Shutdown);
        info!("AppService shut down, outputs released");
    }

    // ── Event handling ────────────────────────────────────────

    /// Handle one queued input event. Call for every event drained at the
    /// start of a tick, before [`tick`](Self::tick).
    pub fn handle_event(
        &mut self,
        event: Event,
        hw: &mut impl ActuatorPort,
        upload: &mut impl SettingsUploadPort,
        config: &impl ConfigPort,
        sink: &mut impl EventSink,
    ) {
        if self.shut_down {
            return;
        }
        match event {
            Event::ModeToggle => {
                let from = self.machine.current_mode();
                if let Some(to) = self.machine.toggle_mode(&mut self.ctx) {
                    self.apply_indicator(hw);
                    sink.emit(&AppEvent::ModeChanged { from, to });
                }
            }
            Event::SetupToggle => {
                if self.machine.toggle_config(&mut self.ctx) {
                    self.enter_config(upload, sink);
                } else {
                    self.exit_config(upload, config, sink);
                }
                self.apply_indicator(hw);
            }
            Event::Shutdown => self.shutdown(hw, upload, sink),
        }
    }

    /// Drain `queue` in FIFO order through [`handle_event`](Self::handle_event).
    /// Returns `false` once the service has shut down.
    pub fn process_events(
        &mut self,
        queue: &EventQueue,
        hw: &mut impl ActuatorPort,
        upload: &mut impl SettingsUploadPort,
        config: &impl ConfigPort,
        sink: &mut impl EventSink,
    ) -> bool {
        queue.drain(|event| self.handle_event(event, hw, upload, config, sink));
        !self.shut_down
    }

    fn enter_config(&mut self, upload: &mut impl SettingsUploadPort, sink: &mut impl EventSink) {
        if let Err(e) = upload.start() {
            warn!("Settings upload unavailable: {}", Error::from(e));
        }
        sink.emit(&AppEvent::ConfigEntered);
    }

    fn exit_config(
        &mut self,
        upload: &mut impl SettingsUploadPort,
        config: &impl ConfigPort,
        sink: &mut impl EventSink,
    ) {
        let mut reloaded = None;
        if let Err(e) = upload.stop(&mut || reloaded = Some(load_settings(config))) {
            warn!("Settings upload stop: {}", Error::from(e));
        }
        sink.emit(&AppEvent::ConfigExited);

        if let Some((settings, source)) = reloaded {
            self.ctx.settings = settings;
            self.settings_generation = self.settings_generation.wrapping_add(1);
            sink.emit(&AppEvent::SettingsReloaded(source));
        }
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// Run one control cycle: sense → decide → actuate.
    ///
    /// The `hw` parameter satisfies **both** [`SensorPort`] and
    /// [`ActuatorPort`] so one adapter owns all the pins.
    pub fn tick(
        &mut self,
        clock: &impl ClockPort,
        hw: &mut (impl SensorPort + ActuatorPort),
        sink: &mut impl EventSink,
    ) {
        if self.shut_down {
            return;
        }
        self.tick_count += 1;

        // 1. No sensing or actuation while configuring.
        if self.machine.config_active() {
            self.machine.tick(&mut self.ctx);
            return;
        }

        // 2. Snapshot, reading only what the current mode consumes.
        let mode = self.machine.current_mode();
        let local = LocalTime::from_unix(
            clock.now_unix_secs(),
            self.ctx.settings.config.utc_offset_minutes,
        );
        let buttons = if mode == OperationMode::Manual {
            hw.manual_buttons()
        } else {
            ManualButtons::default()
        };
        let brightness = if mode == OperationMode::Automatic {
            Self::sample(hw, sink)
        } else {
            None
        };
        self.ctx.sensors = SensorSnapshot {
            local,
            brightness,
            buttons,
        };

        // 3. Strategy
        self.machine.tick(&mut self.ctx);

        // 4. Actuate
        self.apply_motion(hw, sink);
    }

    fn sample(hw: &mut impl SensorPort, sink: &mut impl EventSink) -> Option<Brightness> {
        match hw.sample_brightness() {
            Ok(count) => Some(Brightness {
                count,
                percent: hw.brightness_percent(count),
            }),
            Err(e) => {
                warn!("Tick: {}", Error::from(e));
                sink.emit(&AppEvent::SensorFault(e));
                None
            }
        }
    }

    fn apply_motion(&mut self, hw: &mut impl ActuatorPort, sink: &mut impl EventSink) {
        match self.ctx.commands.motion {
            MotionCommand::Hold => {}
            MotionCommand::Jog(direction) => match hw.step_once(direction) {
                Ok(StepOutcome::Moved) => {}
                Ok(StepOutcome::Rejected) => debug!("Jog {:?} at travel limit", direction),
                Err(e) => {
                    warn!("Jog {:?}: {}", direction, Error::from(e));
                    sink.emit(&AppEvent::SeekFailed(e));
                }
            },
            MotionCommand::Seek(percent) => match hw.seek_percent(percent) {
                Ok(0) => {}
                Ok(steps) => {
                    info!("Reached {}% open in {} step calls", percent, steps);
                    sink.emit(&AppEvent::TargetReached { percent, steps });
                }
                Err(e) => {
                    warn!("Seek to {}%: {}", percent, Error::from(e));
                    sink.emit(&AppEvent::SeekFailed(e));
                }
            },
        }
    }

    fn apply_indicator(&mut self, hw: &mut impl ActuatorPort) {
        if let Err(e) = hw.set_indicator(self.ctx.commands.indicator) {
            warn!("Indicator: {}", Error::from(e));
        }
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn mode(&self) -> OperationMode {
        self.machine.current_mode()
    }

    pub fn config_active(&self) -> bool {
        self.machine.config_active()
    }

    pub fn settings(&self) -> &Settings {
        &self.ctx.settings
    }

    pub fn settings_generation(&self) -> u32 {
        self.settings_generation
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn last_motion(&self) -> MotionCommand {
        self.ctx.commands.motion
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down
    }
}
