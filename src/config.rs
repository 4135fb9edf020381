//! System configuration parameters
//!
//! All tunable parameters for the blind controller. Loaded from the user
//! settings file (written by the settings upload server) with a fallback to
//! the built-in defaults below.

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::app::ports::{ConfigError, ConfigPort};
use crate::control::clock::{ClockTime, MINUTES_PER_DAY};
use crate::control::timed::CloseWindow;
use crate::sensors::light::Calibration;

/// Core system configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    // --- Location ---
    /// Degrees north (negative = south)
    pub latitude: f64,
    /// Degrees east (negative = west)
    pub longitude: f64,
    /// Local time offset from UTC in minutes
    pub utc_offset_minutes: i16,

    // --- Close window ---
    /// Local start of the daily closed window, "HH:MM"
    pub close_start: String,
    /// Length of the closed window in minutes
    pub close_duration: u16,

    // --- Timing ---
    /// Control loop interval (milliseconds)
    pub control_loop_interval_ms: u32,
    /// Minimum re-trigger interval for the mode/setup buttons (milliseconds)
    pub button_debounce_ms: u32,
    /// Delay between phase-table entries while stepping (milliseconds)
    pub step_delay_ms: u32,

    // --- Light sensor ---
    /// Capacitor discharge time before each sample (milliseconds)
    pub sensor_discharge_ms: u32,
    /// Poll budget before a sample is reported as a sensor fault
    pub sensor_poll_limit: u32,

    // --- Settings upload ---
    /// TCP port of the settings upload server
    pub upload_port: u16,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            // Oulu, Finland
            latitude: 65.01,
            longitude: 25.47,
            utc_offset_minutes: 120,

            close_start: String::from("22:00"),
            close_duration: 540, // until 07:00

            control_loop_interval_ms: 200,
            button_debounce_ms: 2000,
            step_delay_ms: 5,

            sensor_discharge_ms: 100,
            sensor_poll_limit: 200_000,

            upload_port: 8080,
        }
    }
}

/// Range-check every field. Invalid values are rejected, never clamped.
pub fn validate_config(cfg: &SystemConfig) -> Result<(), ConfigError> {
    if !(-90.0..=90.0).contains(&cfg.latitude) {
        return Err(ConfigError::ValidationFailed("latitude must be -90..90"));
    }
    if !(-180.0..=180.0).contains(&cfg.longitude) {
        return Err(ConfigError::ValidationFailed("longitude must be -180..180"));
    }
    if !(-720..=840).contains(&cfg.utc_offset_minutes) {
        return Err(ConfigError::ValidationFailed(
            "utc_offset_minutes must be -720..840",
        ));
    }
    if cfg.close_start.parse::<ClockTime>().is_err() {
        return Err(ConfigError::ValidationFailed("close_start must be HH:MM"));
    }
    if cfg.close_duration > MINUTES_PER_DAY {
        return Err(ConfigError::ValidationFailed(
            "close_duration must be 0..1440 minutes",
        ));
    }
    if !(20..=5000).contains(&cfg.control_loop_interval_ms) {
        return Err(ConfigError::ValidationFailed(
            "control_loop_interval_ms must be 20..5000",
        ));
    }
    if !(50..=10_000).contains(&cfg.button_debounce_ms) {
        return Err(ConfigError::ValidationFailed(
            "button_debounce_ms must be 50..10000",
        ));
    }
    if !(1..=100).contains(&cfg.step_delay_ms) {
        return Err(ConfigError::ValidationFailed("step_delay_ms must be 1..100"));
    }
    if !(1..=1000).contains(&cfg.sensor_discharge_ms) {
        return Err(ConfigError::ValidationFailed(
            "sensor_discharge_ms must be 1..1000",
        ));
    }
    if cfg.sensor_poll_limit < Calibration::default().max_count {
        return Err(ConfigError::ValidationFailed(
            "sensor_poll_limit must cover the calibrated range",
        ));
    }
    if cfg.upload_port == 0 {
        return Err(ConfigError::ValidationFailed("upload_port must be non-zero"));
    }
    Ok(())
}

/// A validated configuration with its derived values parsed once.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub config: SystemConfig,
    pub close_window: CloseWindow,
}

impl Settings {
    pub fn from_config(config: SystemConfig) -> Result<Self, ConfigError> {
        validate_config(&config)?;
        let start = config
            .close_start
            .parse::<ClockTime>()
            .map_err(|_| ConfigError::ValidationFailed("close_start must be HH:MM"))?;
        let close_window = CloseWindow::new(start, config.close_duration);
        Ok(Self {
            config,
            close_window,
        })
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            close_window: CloseWindow::new(ClockTime { hour: 22, minute: 0 }, 540),
            config: SystemConfig::default(),
        }
    }
}

/// Where the active settings came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsSource {
    User,
    Defaults,
}

impl core::fmt::Display for SettingsSource {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::User => write!(f, "user settings"),
            Self::Defaults => write!(f, "built-in defaults"),
        }
    }
}

/// Load the user settings, falling back to the built-in defaults when they
/// are missing, unreadable or fail validation.
pub fn load_settings<C: ConfigPort + ?Sized>(port: &C) -> (Settings, SettingsSource) {
    match port.load().and_then(Settings::from_config) {
        Ok(settings) => {
            info!("Settings: using user settings");
            (settings, SettingsSource::User)
        }
        Err(e) => {
            warn!("Settings: user settings unavailable ({}), using built-in defaults", e);
            (Settings::default(), SettingsSource::Defaults)
        }
    }
}
