//! Time adapter.
//!
//! - Wall clock (`ClockPort`) comes from `std::time::SystemTime`, which
//!   ESP-IDF backs with `gettimeofday()`.
//! - Monotonic uptime wraps `esp_timer_get_time()` on the device and
//!   `std::time::Instant` on the host.

use std::time::{SystemTime, UNIX_EPOCH};

use crate::app::ports::ClockPort;

/// Anything earlier than 2020-01-01 means the wall clock was never set.
const EPOCH_2020: i64 = 1_577_836_800;

pub struct SystemClock {
    #[cfg(not(target_os = "espidf"))]
    start: std::time::Instant,
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            #[cfg(not(target_os = "espidf"))]
            start: std::time::Instant::now(),
        }
    }

    /// Milliseconds since boot (monotonic, truncated to `u32`).
    #[cfg(target_os = "espidf")]
    pub fn uptime_ms(&self) -> u32 {
        // SAFETY: esp_timer_get_time is a plain counter read.
        ((unsafe { esp_idf_sys::esp_timer_get_time() }) / 1_000) as u32
    }

    /// Milliseconds since start (monotonic, truncated to `u32`).
    #[cfg(not(target_os = "espidf"))]
    pub fn uptime_ms(&self) -> u32 {
        self.start.elapsed().as_millis() as u32
    }

    /// Whether the wall clock looks set (SNTP or RTC).
    pub fn is_synced(&self) -> bool {
        self.now_unix_secs() >= EPOCH_2020
    }
}

impl ClockPort for SystemClock {
    fn now_unix_secs(&self) -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| d.as_secs() as i64)
    }
}

/// A clock pinned to a fixed instant (simulation and tests).
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub i64);

impl ClockPort for FixedClock {
    fn now_unix_secs(&self) -> i64 {
        self.0
    }
}
