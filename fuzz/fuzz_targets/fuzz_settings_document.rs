//! Fuzz target: uploaded settings documents
//!
//! Feeds arbitrary bytes through the same path the upload server uses
//! (JSON parse, then range validation) and checks:
//! - No panics under any byte sequence
//! - Every document that validates also builds `Settings`
//! - Validated close windows never exceed one day
//!
//! cargo fuzz run fuzz_settings_document

#![no_main]

use blindctl::config::{Settings, SystemConfig, validate_config};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(cfg) = serde_json::from_slice::<SystemConfig>(data) else {
        return;
    };
    if validate_config(&cfg).is_err() {
        return;
    }
    let settings = Settings::from_config(cfg).expect("validated config must build settings");
    assert!(settings.close_window.duration_mins <= 1440);
    assert!(settings.close_window.start.hour < 24);
});
