//! Actuator and input drivers, hardware initialisation, and task helpers.

pub mod button;
pub mod hw_init;
pub mod indicator;
pub mod stepper;
pub mod task_pin;
