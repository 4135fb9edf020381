//! Timed strategy: a daily closed window set by the user.
//!
//! The window starts at `close_start` local time and lasts
//! `close_duration` minutes, so a 22:00 start with 540 minutes keeps the
//! covering closed until 07:00 the next morning.

use super::clock::{ClockTime, MINUTES_PER_DAY};

/// Daily closed window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CloseWindow {
    pub start: ClockTime,
    pub duration_mins: u16,
}

impl CloseWindow {
    pub const fn new(start: ClockTime, duration_mins: u16) -> Self {
        Self {
            start,
            duration_mins,
        }
    }

    /// Whether `minute_of_day` (local) falls inside the window.
    /// Windows that cross midnight wrap around; a full-day window
    /// contains every minute and an empty one contains none.
    pub fn contains(&self, minute_of_day: u16) -> bool {
        if self.duration_mins == 0 {
            return false;
        }
        if self.duration_mins >= MINUTES_PER_DAY {
            return true;
        }
        let start = self.start.minute_of_day();
        let since_start = (minute_of_day % MINUTES_PER_DAY + MINUTES_PER_DAY - start) % MINUTES_PER_DAY;
        since_start < self.duration_mins
    }

    /// Local minute of day at which the window ends.
    pub fn end_minute(&self) -> u16 {
        (self.start.minute_of_day() + self.duration_mins % MINUTES_PER_DAY) % MINUTES_PER_DAY
    }
}

/// Timed strategy target: fully closed inside the window, fully open outside.
pub fn timed_target(window: &CloseWindow, minute_of_day: u16) -> u8 {
    if window.contains(minute_of_day) { 0 } else { 100 }
}
