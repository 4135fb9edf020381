//! Application core: pure domain logic, zero I/O.
//!
//! Mode arbitration, strategy dispatch and the configuration-mode
//! lifecycle. All interaction with hardware, storage and the network
//! happens through **port traits** defined in [`ports`], keeping this layer
//! fully testable without real peripherals.

pub mod events;
pub mod ports;
pub mod service;
