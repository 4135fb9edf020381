//! Fuzz target: `"HH:MM"` parsing
//!
//! Invariants checked:
//! - No panics on arbitrary UTF-8
//! - Anything that parses is a real time of day
//! - Parsed times print back to a string that parses to the same value
//!
//! cargo fuzz run fuzz_clock_time

#![no_main]

use blindctl::control::clock::ClockTime;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|text: &str| {
    let Ok(t) = text.parse::<ClockTime>() else {
        return;
    };
    assert!(t.hour < 24 && t.minute < 60);
    assert!(t.minute_of_day() < 1440);
    let again: ClockTime = t.to_string().parse().expect("display output must parse");
    assert_eq!(again, t);
});
