//! Mock hardware for integration tests.
//!
//! Two layers:
//! - pin-level mocks (`MockPin`, `MockSensorPin`, `MockButton`, `MockDelay`)
//!   that plug into the real drivers through embedded-hal, recording every
//!   write and every millisecond of delay;
//! - port-level mocks (`MockHardware`, `MockUpload`, `MockStore`,
//!   `RecordingSink`) that record calls made by `AppService`.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use blindctl::adapters::hardware::HardwareAdapter;
use blindctl::app::events::AppEvent;
use blindctl::app::ports::{
    ActuatorPort, ConfigError, ConfigPort, EventSink, SensorPort, SettingsUploadPort,
};
use blindctl::config::{SystemConfig, validate_config};
use blindctl::drivers::button::{ManualButtonPair, ManualButtons};
use blindctl::drivers::indicator::{IndicatorPattern, ModeIndicator};
use blindctl::drivers::stepper::{Direction, MAX_STEPS, StepOutcome, StepperDriver, target_steps};
use blindctl::error::{ActuatorError, CommsError, SensorError};
use blindctl::sensors::light::{Calibration, LightSensor};
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{ErrorKind, ErrorType, InputPin, OutputPin};

// ── Pin-level mocks ───────────────────────────────────────────

pub type PinLog = Rc<RefCell<Vec<(u8, bool)>>>;

/// Output line that appends `(id, level)` to a shared log.
pub struct MockPin {
    id: u8,
    log: PinLog,
}

impl MockPin {
    pub fn new(id: u8, log: &PinLog) -> Self {
        Self {
            id,
            log: Rc::clone(log),
        }
    }
}

impl ErrorType for MockPin {
    type Error = ErrorKind;
}

impl OutputPin for MockPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.log.borrow_mut().push((self.id, false));
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.log.borrow_mut().push((self.id, true));
        Ok(())
    }
}

/// Open-drain RC line: reads low for `charge_polls` polls after release.
pub struct MockSensorPin {
    charge_polls: Rc<Cell<u32>>,
    remaining: u32,
}

impl ErrorType for MockSensorPin {
    type Error = ErrorKind;
}

impl OutputPin for MockSensorPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.remaining = 0;
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.remaining = self.charge_polls.get();
        Ok(())
    }
}

impl InputPin for MockSensorPin {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        if self.remaining == 0 {
            return Ok(true);
        }
        self.remaining -= 1;
        Ok(false)
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        self.is_high().map(|h| !h)
    }
}

/// Level input shared with the test body.
pub struct MockButton(Rc<Cell<bool>>);

impl ErrorType for MockButton {
    type Error = ErrorKind;
}

impl InputPin for MockButton {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.0.get())
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.0.get())
    }
}

/// Accumulates requested delay instead of sleeping.
#[derive(Clone, Default)]
pub struct MockDelay {
    total_ns: Rc<Cell<u64>>,
}

impl MockDelay {
    pub fn total_ms(&self) -> u64 {
        self.total_ns.get() / 1_000_000
    }
}

impl DelayNs for MockDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.total_ns.set(self.total_ns.get() + u64::from(ns));
    }

    fn delay_ms(&mut self, ms: u32) {
        self.total_ns
            .set(self.total_ns.get() + u64::from(ms) * 1_000_000);
    }
}

pub type MockAdapter = HardwareAdapter<MockPin, MockSensorPin, MockButton, MockDelay>;

/// Handles into a [`MockAdapter`] built by [`mock_board`].
pub struct Board {
    pub motor: PinLog,
    pub leds: PinLog,
    pub motor_delay: MockDelay,
    pub charge_polls: Rc<Cell<u32>>,
    pub open_button: Rc<Cell<bool>>,
    pub close_button: Rc<Cell<bool>>,
}

/// A real `HardwareAdapter` wired to mock pins with the default timings.
pub fn mock_board() -> (MockAdapter, Board) {
    let cfg = SystemConfig::default();
    let board = Board {
        motor: PinLog::default(),
        leds: PinLog::default(),
        motor_delay: MockDelay::default(),
        charge_polls: Rc::new(Cell::new(Calibration::default().max_count)),
        open_button: Rc::new(Cell::new(false)),
        close_button: Rc::new(Cell::new(false)),
    };
    let motor_pins = [0, 1, 2, 3].map(|i| MockPin::new(i, &board.motor));
    let hw = HardwareAdapter::new(
        StepperDriver::new(motor_pins, board.motor_delay.clone(), cfg.step_delay_ms),
        ModeIndicator::new(
            MockPin::new(0, &board.leds),
            MockPin::new(1, &board.leds),
            MockPin::new(2, &board.leds),
        ),
        LightSensor::new(
            MockSensorPin {
                charge_polls: Rc::clone(&board.charge_polls),
                remaining: 0,
            },
            MockDelay::default(),
            cfg.sensor_discharge_ms,
            cfg.sensor_poll_limit,
        ),
        ManualButtonPair::new(
            MockButton(Rc::clone(&board.open_button)),
            MockButton(Rc::clone(&board.close_button)),
        ),
    );
    (hw, board)
}

impl Board {
    /// Current levels of the three indicator lines, manual/timed/automatic.
    pub fn led_levels(&self) -> [bool; 3] {
        let mut levels = [false; 3];
        for &(id, level) in self.leds.borrow().iter() {
            levels[usize::from(id)] = level;
        }
        levels
    }

    pub fn motor_energized(&self) -> bool {
        let mut levels = [false; 4];
        for &(id, level) in self.motor.borrow().iter() {
            levels[usize::from(id)] = level;
        }
        levels.iter().any(|&l| l)
    }
}

// ── Port-level mocks ──────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorCall {
    Step(Direction),
    Seek(u8),
    Indicator(IndicatorPattern),
    Release,
}

/// Records actuator calls and simulates the travel envelope in steps.
pub struct MockHardware {
    pub calls: Vec<ActuatorCall>,
    pub position: u32,
    pub brightness: Result<u32, SensorError>,
    pub buttons: ManualButtons,
    pub samples_taken: u32,
    pub button_reads: u32,
    pub fail_seeks: bool,
}

impl MockHardware {
    pub fn new() -> Self {
        Self {
            calls: Vec::new(),
            position: 0,
            brightness: Ok(Calibration::default().max_count),
            buttons: ManualButtons::default(),
            samples_taken: 0,
            button_reads: 0,
            fail_seeks: false,
        }
    }

    pub fn motion_calls(&self) -> Vec<ActuatorCall> {
        self.calls
            .iter()
            .copied()
            .filter(|c| matches!(c, ActuatorCall::Step(_) | ActuatorCall::Seek(_)))
            .collect()
    }

    pub fn last_indicator(&self) -> Option<IndicatorPattern> {
        self.calls.iter().rev().find_map(|c| match c {
            ActuatorCall::Indicator(p) => Some(*p),
            _ => None,
        })
    }
}

impl Default for MockHardware {
    fn default() -> Self {
        Self::new()
    }
}

impl SensorPort for MockHardware {
    fn sample_brightness(&mut self) -> Result<u32, SensorError> {
        self.samples_taken += 1;
        self.brightness
    }

    fn brightness_percent(&self, count: u32) -> u8 {
        Calibration::default().to_percentage(count)
    }

    fn manual_buttons(&mut self) -> ManualButtons {
        self.button_reads += 1;
        self.buttons
    }
}

impl ActuatorPort for MockHardware {
    fn step_once(&mut self, direction: Direction) -> Result<StepOutcome, ActuatorError> {
        self.calls.push(ActuatorCall::Step(direction));
        let next = match direction {
            Direction::Open => self.position.checked_add(8).filter(|&p| p <= MAX_STEPS),
            Direction::Close => self.position.checked_sub(8),
        };
        Ok(match next {
            Some(p) => {
                self.position = p;
                StepOutcome::Moved
            }
            None => StepOutcome::Rejected,
        })
    }

    fn seek_percent(&mut self, percent: u8) -> Result<u32, ActuatorError> {
        self.calls.push(ActuatorCall::Seek(percent));
        let target = target_steps(percent);
        if self.fail_seeks {
            return Err(ActuatorError::SeekMismatch {
                target,
                position: self.position,
            });
        }
        let calls = self.position.abs_diff(target) / 8;
        self.position = target;
        Ok(calls)
    }

    fn open_percent(&self) -> u8 {
        (self.position * 100 / MAX_STEPS) as u8
    }

    fn set_indicator(&mut self, pattern: IndicatorPattern) -> Result<(), ActuatorError> {
        self.calls.push(ActuatorCall::Indicator(pattern));
        Ok(())
    }

    fn release(&mut self) {
        self.calls.push(ActuatorCall::Release);
    }
}

/// Settings upload collaborator that only counts lifecycle calls.
#[derive(Default)]
pub struct MockUpload {
    pub running: bool,
    pub starts: u32,
    pub stops: u32,
    pub fail_start: bool,
}

impl SettingsUploadPort for MockUpload {
    fn start(&mut self) -> Result<(), CommsError> {
        self.starts += 1;
        if self.fail_start {
            return Err(CommsError::UploadBindFailed);
        }
        self.running = true;
        Ok(())
    }

    fn stop(&mut self, on_stopped: &mut dyn FnMut()) -> Result<(), CommsError> {
        self.stops += 1;
        self.running = false;
        on_stopped();
        Ok(())
    }

    fn is_running(&self) -> bool {
        self.running
    }
}

/// In-memory settings document.
#[derive(Default)]
pub struct MockStore {
    pub stored: RefCell<Option<SystemConfig>>,
    pub loads: Cell<u32>,
}

impl MockStore {
    pub fn with(config: SystemConfig) -> Self {
        Self {
            stored: RefCell::new(Some(config)),
            loads: Cell::new(0),
        }
    }
}

impl ConfigPort for MockStore {
    fn load(&self) -> Result<SystemConfig, ConfigError> {
        self.loads.set(self.loads.get() + 1);
        self.stored.borrow().clone().ok_or(ConfigError::NotFound)
    }

    fn save(&self, config: &SystemConfig) -> Result<(), ConfigError> {
        validate_config(config)?;
        *self.stored.borrow_mut() = Some(config.clone());
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

impl RecordingSink {
    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}
