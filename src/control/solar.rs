//! Sun-position strategy.
//!
//! Sunrise and sunset come from the NOAA general solar position
//! approximation (fractional-year series for the equation of time and the
//! declination, 90.833° zenith for refraction and the solar disc). Accuracy
//! is a few minutes.
//!
//! The automatic strategy keeps the covering closed at night and inside
//! the user's close window; in daylight it follows the light sensor.

use core::f64::consts::PI;

use super::clock::MINUTES_PER_DAY;

const ZENITH_DEG: f64 = 90.833;

/// Daylight bounds for one local day.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SolarDay {
    /// Sun rises and sets; minutes are local minute-of-day.
    Normal { sunrise: u16, sunset: u16 },
    /// Midnight sun: above the horizon all day.
    PolarDay,
    /// Below the horizon all day.
    PolarNight,
}

impl SolarDay {
    /// Compute sunrise/sunset for `day_of_year` at the given position.
    pub fn compute(day_of_year: u16, latitude: f64, longitude: f64, utc_offset_minutes: i16) -> Self {
        let gamma = 2.0 * PI / 365.0 * (f64::from(day_of_year) - 1.0);

        let eq_time = 229.18
            * (0.000_075 + 0.001_868 * gamma.cos()
                - 0.032_077 * gamma.sin()
                - 0.014_615 * (2.0 * gamma).cos()
                - 0.040_849 * (2.0 * gamma).sin());

        let decl = 0.006_918 - 0.399_912 * gamma.cos() + 0.070_257 * gamma.sin()
            - 0.006_758 * (2.0 * gamma).cos()
            + 0.000_907 * (2.0 * gamma).sin()
            - 0.002_697 * (3.0 * gamma).cos()
            + 0.001_48 * (3.0 * gamma).sin();

        let lat = latitude.to_radians();
        let cos_ha = ZENITH_DEG.to_radians().cos() / (lat.cos() * decl.cos()) - lat.tan() * decl.tan();

        if cos_ha > 1.0 {
            return Self::PolarNight;
        }
        if cos_ha < -1.0 {
            return Self::PolarDay;
        }

        let ha_deg = cos_ha.acos().to_degrees();
        let offset = f64::from(utc_offset_minutes);
        let sunrise = 720.0 - 4.0 * (longitude + ha_deg) - eq_time + offset;
        let sunset = 720.0 - 4.0 * (longitude - ha_deg) - eq_time + offset;

        Self::Normal {
            sunrise: wrap_minutes(sunrise),
            sunset: wrap_minutes(sunset),
        }
    }

    /// Whether the sun is up at `minute_of_day` (local).
    pub fn is_daylight(&self, minute_of_day: u16) -> bool {
        match *self {
            Self::PolarDay => true,
            Self::PolarNight => false,
            Self::Normal { sunrise, sunset } if sunrise <= sunset => {
                (sunrise..sunset).contains(&minute_of_day)
            }
            // Offset pushed sunset past local midnight.
            Self::Normal { sunrise, sunset } => minute_of_day >= sunrise || minute_of_day < sunset,
        }
    }
}

fn wrap_minutes(minutes: f64) -> u16 {
    let day = f64::from(MINUTES_PER_DAY);
    (minutes.round().rem_euclid(day) as u16) % MINUTES_PER_DAY
}

/// Automatic strategy target.
///
/// * closed (0 %) while `in_close_window` or at night,
/// * `brightness_percent` in daylight,
/// * `None` (hold) in daylight without a brightness reading.
pub fn automatic_target(
    solar: &SolarDay,
    minute_of_day: u16,
    in_close_window: bool,
    brightness_percent: Option<u8>,
) -> Option<u8> {
    if in_close_window || !solar.is_daylight(minute_of_day) {
        return Some(0);
    }
    brightness_percent
}
