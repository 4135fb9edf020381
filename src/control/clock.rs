//! Wall-clock helpers: `"HH:MM"` parsing and local calendar position.
//!
//! The firmware keeps time as a unix timestamp (seconds, UTC) and a fixed
//! UTC offset from the settings. Strategies only need two things from it:
//! the day of the year (for the sun) and the minute of the day (for the
//! windows), both in local time.

use core::fmt;
use core::str::FromStr;

pub const MINUTES_PER_DAY: u16 = 24 * 60;
const SECS_PER_DAY: i64 = 86_400;

/// A time of day with minute resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ClockTime {
    pub hour: u8,
    pub minute: u8,
}

impl ClockTime {
    pub const fn new(hour: u8, minute: u8) -> Option<Self> {
        if hour < 24 && minute < 60 {
            Some(Self { hour, minute })
        } else {
            None
        }
    }

    /// Minutes since local midnight.
    pub const fn minute_of_day(self) -> u16 {
        self.hour as u16 * 60 + self.minute as u16
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

/// Failure to parse an `"HH:MM"` string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseClockTimeError;

impl fmt::Display for ParseClockTimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "expected HH:MM with hour 0-23 and minute 0-59")
    }
}

impl FromStr for ClockTime {
    type Err = ParseClockTimeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (h, m) = s.trim().split_once(':').ok_or(ParseClockTimeError)?;
        if h.is_empty() || m.len() != 2 {
            return Err(ParseClockTimeError);
        }
        let hour: u8 = h.parse().map_err(|_| ParseClockTimeError)?;
        let minute: u8 = m.parse().map_err(|_| ParseClockTimeError)?;
        Self::new(hour, minute).ok_or(ParseClockTimeError)
    }
}

/// Local calendar position derived from a unix timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LocalTime {
    /// 1-based day of the year (1..=366).
    pub day_of_year: u16,
    /// Minutes since local midnight (0..1440).
    pub minute_of_day: u16,
}

impl LocalTime {
    pub fn from_unix(unix_secs: i64, utc_offset_minutes: i16) -> Self {
        let local = unix_secs + i64::from(utc_offset_minutes) * 60;
        let days = local.div_euclid(SECS_PER_DAY);
        let secs_of_day = local.rem_euclid(SECS_PER_DAY);

        let (year, month, day) = civil_from_days(days);
        Self {
            day_of_year: day_of_year(year, month, day),
            minute_of_day: (secs_of_day / 60) as u16,
        }
    }
}

/// Days since 1970-01-01 → (year, month 1..=12, day 1..=31).
/// Howard Hinnant's `civil_from_days`.
fn civil_from_days(days: i64) -> (i64, u32, u32) {
    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z.rem_euclid(146_097);
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = (doy - (153 * mp + 2) / 5 + 1) as u32;
    let month = (if mp < 10 { mp + 3 } else { mp - 9 }) as u32;
    let year = yoe + era * 400 + i64::from(month <= 2);
    (year, month, day)
}

fn is_leap(year: i64) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

fn day_of_year(year: i64, month: u32, day: u32) -> u16 {
    const CUMULATIVE: [u16; 12] = [0, 31, 59, 90, 120, 151, 181, 212, 243, 273, 304, 334];
    let leap = u16::from(month > 2 && is_leap(year));
    CUMULATIVE[(month - 1) as usize] + day as u16 + leap
}
