//! Integration test driver for the `tests/integration/` submodules.
//!
//! Each `mod` below maps to a file that exercises a subsystem against mock
//! adapters. All tests run on the host with no real hardware required.

mod app_service_tests;
mod mock_hw;
mod settings_flow_tests;
