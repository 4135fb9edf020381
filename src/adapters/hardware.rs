//! Hardware adapter: bridges the pin-level drivers to domain port traits.
//!
//! Owns the stepper, the mode indicator, the light sensor and the jog
//! buttons, exposing them through [`SensorPort`] and [`ActuatorPort`].
//! Generic over embedded-hal pins so the same adapter runs on ESP-IDF
//! (`hw_init` pin newtypes) and against test mocks.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};
use log::warn;

use crate::app::ports::{ActuatorPort, SensorPort};
use crate::config::SystemConfig;
use crate::drivers::button::{ManualButtonPair, ManualButtons};
use crate::drivers::indicator::{IndicatorPattern, ModeIndicator};
use crate::drivers::stepper::{Direction, StepOutcome, StepperDriver};
use crate::error::{ActuatorError, SensorError};
use crate::sensors::light::LightSensor;

pub struct HardwareAdapter<O, S, B, D>
where
    O: OutputPin,
    S: InputPin + OutputPin,
    B: InputPin,
    D: DelayNs,
{
    stepper: StepperDriver<O, D>,
    indicator: ModeIndicator<O>,
    light: LightSensor<S, D>,
    buttons: ManualButtonPair<B>,
}

impl<O, S, B, D> HardwareAdapter<O, S, B, D>
where
    O: OutputPin,
    S: InputPin + OutputPin,
    B: InputPin,
    D: DelayNs,
{
    pub fn new(
        stepper: StepperDriver<O, D>,
        indicator: ModeIndicator<O>,
        light: LightSensor<S, D>,
        buttons: ManualButtonPair<B>,
    ) -> Self {
        Self {
            stepper,
            indicator,
            light,
            buttons,
        }
    }

    /// Push the timing fields of a (re)loaded configuration to the drivers.
    pub fn apply_config(&mut self, cfg: &SystemConfig) {
        self.stepper.set_step_delay(cfg.step_delay_ms);
        self.light
            .set_timing(cfg.sensor_discharge_ms, cfg.sensor_poll_limit);
    }

    pub fn position(&self) -> u32 {
        self.stepper.position()
    }
}

// ── SensorPort implementation ─────────────────────────────────

impl<O, S, B, D> SensorPort for HardwareAdapter<O, S, B, D>
where
    O: OutputPin,
    S: InputPin + OutputPin,
    B: InputPin,
    D: DelayNs,
{
    fn sample_brightness(&mut self) -> Result<u32, SensorError> {
        self.light.sample()
    }

    fn brightness_percent(&self, count: u32) -> u8 {
        self.light.to_percentage(count)
    }

    fn manual_buttons(&mut self) -> ManualButtons {
        self.buttons.read()
    }
}

// ── ActuatorPort implementation ───────────────────────────────

impl<O, S, B, D> ActuatorPort for HardwareAdapter<O, S, B, D>
where
    O: OutputPin,
    S: InputPin + OutputPin,
    B: InputPin,
    D: DelayNs,
{
    fn step_once(&mut self, direction: Direction) -> Result<StepOutcome, ActuatorError> {
        self.stepper.step_once(direction)
    }

    fn seek_percent(&mut self, percent: u8) -> Result<u32, ActuatorError> {
        self.stepper.seek_percent(percent)
    }

    fn open_percent(&self) -> u8 {
        self.stepper.open_percent()
    }

    fn set_indicator(&mut self, pattern: IndicatorPattern) -> Result<(), ActuatorError> {
        self.indicator.show(pattern)
    }

    fn release(&mut self) {
        if let Err(e) = self.stepper.release() {
            warn!("Motor release failed: {}", e);
        }
        if let Err(e) = self.indicator.off() {
            warn!("Indicator release failed: {}", e);
        }
    }
}
