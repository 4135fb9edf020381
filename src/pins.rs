//! GPIO pin assignments for the blind controller board (ESP32-S3).
//!
//! Single source of truth: every driver references this module rather than
//! hard-coding pin numbers.

// ---------------------------------------------------------------------------
// Stepper motor (28BYJ-48 via ULN2003, four coil lines IN1..IN4)
// ---------------------------------------------------------------------------

pub const MOTOR_IN1_GPIO: i32 = 4;
pub const MOTOR_IN2_GPIO: i32 = 5;
pub const MOTOR_IN3_GPIO: i32 = 6;
pub const MOTOR_IN4_GPIO: i32 = 7;

/// Coil lines in phase-table column order.
pub const MOTOR_GPIOS: [i32; 4] = [MOTOR_IN1_GPIO, MOTOR_IN2_GPIO, MOTOR_IN3_GPIO, MOTOR_IN4_GPIO];

// ---------------------------------------------------------------------------
// Mode indicator LEDs (one line per operation mode)
// ---------------------------------------------------------------------------

/// Red: manual mode.
pub const LED_MANUAL_GPIO: i32 = 11;
/// Blue: timed mode.
pub const LED_TIMED_GPIO: i32 = 12;
/// Green: automatic mode.
pub const LED_AUTOMATIC_GPIO: i32 = 13;

// ---------------------------------------------------------------------------
// Light sensor (LDR + timing capacitor on one open-drain line)
// ---------------------------------------------------------------------------

/// Driven low to discharge, released to let the LDR charge the capacitor.
pub const LIGHT_SENSOR_GPIO: i32 = 9;

// ---------------------------------------------------------------------------
// Buttons
// ---------------------------------------------------------------------------

/// Manual jog buttons, level-sampled each tick. HIGH = pressed.
pub const BUTTON_OPEN_GPIO: i32 = 1;
pub const BUTTON_CLOSE_GPIO: i32 = 2;

/// Mode-cycle button, active-low with pull-up, falling-edge interrupt.
pub const BUTTON_MODE_GPIO: i32 = 15;
/// Setup (configuration mode) button, active-low with pull-up, falling-edge interrupt.
pub const BUTTON_SETUP_GPIO: i32 = 16;
