//! Control strategies: pure functions from time, settings and sensor data
//! to a target open-percentage.

pub mod clock;
pub mod solar;
pub mod timed;
