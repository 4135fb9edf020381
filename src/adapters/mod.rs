//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter         | Implements          | Connects to                 |
//! |-----------------|---------------------|-----------------------------|
//! | `hardware`      | SensorPort          | RC light sensor, jog buttons|
//! |                 | ActuatorPort        | Stepper coils, mode LEDs    |
//! | `log_sink`      | EventSink           | Serial log output           |
//! | `settings_store`| ConfigPort          | JSON file (SPIFFS / host fs)|
//! | `time`          | ClockPort           | System wall clock           |
//! | `upload_server` | SettingsUploadPort  | TCP listener thread         |

pub mod hardware;
pub mod log_sink;
pub mod settings_store;
pub mod time;
pub mod upload_server;
