//! Four-phase unipolar stepper driver (28BYJ-48 + ULN2003).
//!
//! ## Position model
//!
//! Open-loop: position is dead-reckoned from committed steps since boot and
//! starts at 0 (fully closed). Every call moves exactly one full pass
//! through the half-step sequence, i.e. [`STEPS_PER_CALL`] steps, so the
//! position is always a multiple of 8 inside `0..=MAX_STEPS`.
//!
//! ## Phase sequence
//!
//! ```text
//!  entry   IN1 IN2 IN3 IN4
//!    0      0   0   0   1
//!    1      0   0   1   1
//!    2      0   0   1   0
//!    3      0   1   1   0
//!    4      0   1   0   0
//!    5      1   1   0   0
//!    6      1   0   0   0
//!    7      1   0   0   1
//! ```
//!
//! Forward order opens the covering, reverse order closes it.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{OutputPin, PinState};
use log::{debug, warn};

use crate::error::ActuatorError;

/// Half-step coil pattern, forward (opening) order.
pub const PHASE_SEQUENCE: [[bool; 4]; 8] = [
    [false, false, false, true],
    [false, false, true, true],
    [false, false, true, false],
    [false, true, true, false],
    [false, true, false, false],
    [true, true, false, false],
    [true, false, false, false],
    [true, false, false, true],
];

/// Steps committed by one [`StepperDriver::step_once`] call.
pub const STEPS_PER_CALL: u32 = PHASE_SEQUENCE.len() as u32;

/// Half-steps per output-shaft revolution (64:1 gearbox).
pub const STEPS_PER_REVOLUTION: u32 = 4096;

/// Travel envelope: a quarter turn of the output shaft.
pub const MAX_STEPS: u32 = STEPS_PER_REVOLUTION / 4;

/// Default delay between phase-table entries.
pub const DEFAULT_STEP_DELAY_MS: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Open,
    Close,
}

/// Result of a single step request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Moved,
    /// The step would leave the travel envelope; nothing was driven.
    Rejected,
}

pub struct StepperDriver<P: OutputPin, D: DelayNs> {
    pins: [P; 4],
    delay: D,
    position: u32,
    step_delay_ms: u32,
}

impl<P: OutputPin, D: DelayNs> StepperDriver<P, D> {
    /// `pins` are IN1..IN4 in that order.
    pub fn new(pins: [P; 4], delay: D, step_delay_ms: u32) -> Self {
        Self {
            pins,
            delay,
            position: 0,
            step_delay_ms,
        }
    }

    /// Absolute position in steps, `0..=MAX_STEPS`.
    pub fn position(&self) -> u32 {
        self.position
    }

    pub fn set_step_delay(&mut self, step_delay_ms: u32) {
        self.step_delay_ms = step_delay_ms;
    }

    pub const fn max_steps(&self) -> u32 {
        MAX_STEPS
    }

    /// Current position as an open-percentage (0 = closed).
    pub fn open_percent(&self) -> u8 {
        (self.position * 100 / MAX_STEPS) as u8
    }

    /// Move one pass of the phase table in `direction`.
    ///
    /// The travel bound is checked before any coil is driven. On success
    /// the position is committed first, then the sequence is played and
    /// all coils are released.
    pub fn step_once(&mut self, direction: Direction) -> Result<StepOutcome, ActuatorError> {
        let Some(next) = self.prospective(direction) else {
            debug!(
                "stepper: {:?} rejected at {}/{}",
                direction, self.position, MAX_STEPS
            );
            return Ok(StepOutcome::Rejected);
        };
        self.position = next;

        let played = self.play_sequence(direction);
        let released = self.release();
        played.and(released)?;
        Ok(StepOutcome::Moved)
    }

    /// Drive to `percent` open (clamped to 100). Returns the number of
    /// `step_once` calls made; zero when already there.
    pub fn seek_percent(&mut self, percent: u8) -> Result<u32, ActuatorError> {
        let target = target_steps(percent);
        let (direction, distance) = if target >= self.position {
            (Direction::Open, target - self.position)
        } else {
            (Direction::Close, self.position - target)
        };

        let calls = distance / STEPS_PER_CALL;
        for _ in 0..calls {
            if self.step_once(direction)? == StepOutcome::Rejected {
                warn!(
                    "stepper: seek to {} stopped at {}",
                    target, self.position
                );
                return Err(ActuatorError::SeekMismatch {
                    target,
                    position: self.position,
                });
            }
        }
        Ok(calls)
    }

    /// De-energize all four coils. Every pin is attempted; the first
    /// failure is reported.
    pub fn release(&mut self) -> Result<(), ActuatorError> {
        let mut result = Ok(());
        for pin in &mut self.pins {
            if pin.set_low().is_err() && result.is_ok() {
                result = Err(ActuatorError::GpioWriteFailed);
            }
        }
        result
    }

    fn prospective(&self, direction: Direction) -> Option<u32> {
        match direction {
            Direction::Open => self
                .position
                .checked_add(STEPS_PER_CALL)
                .filter(|&p| p <= MAX_STEPS),
            Direction::Close => self.position.checked_sub(STEPS_PER_CALL),
        }
    }

    fn play_sequence(&mut self, direction: Direction) -> Result<(), ActuatorError> {
        for i in 0..PHASE_SEQUENCE.len() {
            let entry = match direction {
                Direction::Open => &PHASE_SEQUENCE[i],
                Direction::Close => &PHASE_SEQUENCE[PHASE_SEQUENCE.len() - 1 - i],
            };
            for (pin, &level) in self.pins.iter_mut().zip(entry) {
                pin.set_state(PinState::from(level))
                    .map_err(|_| ActuatorError::GpioWriteFailed)?;
            }
            self.delay.delay_ms(self.step_delay_ms);
        }
        Ok(())
    }
}

impl<P: OutputPin, D: DelayNs> Drop for StepperDriver<P, D> {
    fn drop(&mut self) {
        let _ = self.release();
    }
}

/// Step position for an open-percentage: `floor(MAX_STEPS * p / 100)`
/// rounded down to a whole pass of the phase table.
pub const fn target_steps(percent: u8) -> u32 {
    let p = if percent > 100 { 100 } else { percent as u32 };
    let raw = MAX_STEPS * p / 100;
    raw - raw % STEPS_PER_CALL
}
