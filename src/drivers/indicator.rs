//! Mode indicator LEDs.
//!
//! Three discrete LEDs, one per operation mode:
//!
//! | Pattern       | Manual (red) | Timed (blue) | Automatic (green) |
//! |---------------|--------------|--------------|-------------------|
//! | Manual        | on           | off          | off               |
//! | Timed         | off          | on           | off               |
//! | Automatic     | off          | off          | on                |
//! | Configuration | on           | off          | on                |
//! | Off           | off          | off          | off               |

use embedded_hal::digital::{OutputPin, PinState};

use crate::error::ActuatorError;
use crate::fsm::OperationMode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IndicatorPattern {
    Mode(OperationMode),
    Config,
    #[default]
    Off,
}

impl IndicatorPattern {
    /// Line levels as `[manual, timed, automatic]`.
    pub const fn levels(self) -> [bool; 3] {
        match self {
            Self::Mode(OperationMode::Manual) => [true, false, false],
            Self::Mode(OperationMode::Timed) => [false, true, false],
            Self::Mode(OperationMode::Automatic) => [false, false, true],
            Self::Config => [true, false, true],
            Self::Off => [false, false, false],
        }
    }
}

pub struct ModeIndicator<P: OutputPin> {
    /// `[manual, timed, automatic]`
    lines: [P; 3],
    current: IndicatorPattern,
}

impl<P: OutputPin> ModeIndicator<P> {
    pub fn new(manual: P, timed: P, automatic: P) -> Self {
        Self {
            lines: [manual, timed, automatic],
            current: IndicatorPattern::Off,
        }
    }

    pub fn show(&mut self, pattern: IndicatorPattern) -> Result<(), ActuatorError> {
        for (line, level) in self.lines.iter_mut().zip(pattern.levels()) {
            line.set_state(PinState::from(level))
                .map_err(|_| ActuatorError::GpioWriteFailed)?;
        }
        self.current = pattern;
        Ok(())
    }

    pub fn off(&mut self) -> Result<(), ActuatorError> {
        self.show(IndicatorPattern::Off)
    }

    pub fn current(&self) -> IndicatorPattern {
        self.current
    }
}

impl<P: OutputPin> Drop for ModeIndicator<P> {
    fn drop(&mut self) {
        for line in &mut self.lines {
            let _ = line.set_low();
        }
    }
}
