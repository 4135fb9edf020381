//! RC-timed light sensor (LDR + capacitor on a single GPIO).
//!
//! The pin is driven low to empty the capacitor, then released; the LDR
//! recharges it and the number of polls until the pin reads high is the
//! brightness sample. Brighter light means a smaller count.
//!
//! ## Dual-target design
//!
//! The sampler is generic over an embedded-hal pin that can both drive and
//! read (open-drain). On ESP-IDF this is `hw_init::GpioOpenDrain`; tests use
//! a mock pin that reports low for a scripted number of polls.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};

use crate::error::SensorError;

/// Calibrated poll-count range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Calibration {
    /// Count under full brightness (phone flashlight on the sensor).
    pub min_count: u32,
    /// Count with the sensor fully covered.
    pub max_count: u32,
    /// Reported for anything brighter than the calibrated floor.
    pub brightest: u32,
}

impl Default for Calibration {
    fn default() -> Self {
        Self {
            min_count: 10,
            max_count: 51_900,
            brightest: 14,
        }
    }
}

impl Calibration {
    /// Clamp a raw poll count into `[brightest, max_count]`.
    pub fn clamp(&self, count: u32) -> u32 {
        if count < self.brightest {
            self.brightest
        } else if count > self.max_count {
            self.max_count
        } else {
            count
        }
    }

    /// Linear map of a count onto 0..=100, input clamped to the range first.
    pub fn to_percentage(&self, count: u32) -> u8 {
        let span = u64::from(self.max_count.saturating_sub(self.min_count));
        if span == 0 {
            return 0;
        }
        let c = count.clamp(self.min_count, self.max_count);
        (u64::from(c - self.min_count) * 100 / span) as u8
    }
}

pub struct LightSensor<P, D> {
    pin: P,
    delay: D,
    cal: Calibration,
    discharge_ms: u32,
    poll_limit: u32,
}

impl<P, D> LightSensor<P, D>
where
    P: InputPin + OutputPin,
    D: DelayNs,
{
    pub fn new(pin: P, delay: D, discharge_ms: u32, poll_limit: u32) -> Self {
        Self {
            pin,
            delay,
            cal: Calibration::default(),
            discharge_ms,
            poll_limit,
        }
    }

    pub fn set_calibration(&mut self, cal: Calibration) {
        self.cal = cal;
    }

    pub fn calibration(&self) -> Calibration {
        self.cal
    }

    pub fn set_timing(&mut self, discharge_ms: u32, poll_limit: u32) {
        self.discharge_ms = discharge_ms;
        self.poll_limit = poll_limit;
    }

    /// Take one clamped brightness sample.
    ///
    /// Blocks for the discharge period plus the charge time. Gives up with
    /// [`SensorError::PollTimeout`] once more than `poll_limit` polls have
    /// read low.
    pub fn sample(&mut self) -> Result<u32, SensorError> {
        self.pin.set_low().map_err(|_| SensorError::GpioWriteFailed)?;
        self.delay.delay_ms(self.discharge_ms);
        self.pin.set_high().map_err(|_| SensorError::GpioWriteFailed)?;

        let mut count: u32 = 0;
        while self.pin.is_low().map_err(|_| SensorError::GpioReadFailed)? {
            count += 1;
            if count > self.poll_limit {
                return Err(SensorError::PollTimeout {
                    polls: self.poll_limit,
                });
            }
        }
        Ok(self.cal.clamp(count))
    }

    /// Percentage for a count under this sensor's calibration.
    pub fn to_percentage(&self, count: u32) -> u8 {
        self.cal.to_percentage(count)
    }
}
