//! Blinds controller firmware: main entry point.
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │                     Adapters (outer ring)                     │
//! │                                                               │
//! │  HardwareAdapter    LogEventSink   FileSettingsStore          │
//! │  (Sensor+Actuator)  (EventSink)    (ConfigPort)               │
//! │  UploadServer       SystemClock                               │
//! │  (SettingsUpload)   (ClockPort)                               │
//! │                                                               │
//! │  ──────────────── Port Trait Boundary ───────────────────     │
//! │                                                               │
//! │  ┌───────────────────────────────────────────────────────┐    │
//! │  │              AppService (pure logic)                  │    │
//! │  │  ModeMachine · timed / solar / manual strategies      │    │
//! │  └───────────────────────────────────────────────────────┘    │
//! │                                                               │
//! │  Button ISRs ──▶ EVENTS queue ──▶ event loop                  │
//! │  Setup long press, panic hook ──▶ Event::Shutdown             │
//! └───────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use embedded_hal::digital::InputPin;
use log::{error, info, warn};

use blindctl::adapters::hardware::HardwareAdapter;
use blindctl::adapters::log_sink::LogEventSink;
use blindctl::adapters::settings_store::{self, DEFAULT_SETTINGS_PATH, FileSettingsStore};
use blindctl::adapters::time::SystemClock;
use blindctl::adapters::upload_server::UploadServer;
use blindctl::app::service::AppService;
use blindctl::config::load_settings;
use blindctl::drivers::button::{self, HoldDetector, ManualButtonPair, SHUTDOWN_HOLD_MS};
use blindctl::drivers::hw_init::{
    self, GpioIn, GpioOpenDrain, GpioOut, motor_pins, release_outputs, sys_delay,
};
use blindctl::drivers::indicator::ModeIndicator;
use blindctl::drivers::stepper::StepperDriver;
use blindctl::events::{EVENTS, Event};
use blindctl::pins;
use blindctl::sensors::light::LightSensor;

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;
    info!("blindctl v{}", env!("CARGO_PKG_VERSION"));
    install_panic_handler();

    // ── 2. Peripherals and ISRs ───────────────────────────────
    hw_init::init_peripherals()?;
    if let Err(e) = hw_init::init_isr_service() {
        error!("ISR service init failed: {}; mode and setup buttons disabled", e);
    }

    // ── 3. Settings ───────────────────────────────────────────
    if let Err(e) = settings_store::mount_storage() {
        warn!("Settings storage unavailable ({}), running on defaults", e);
    }
    let store = Arc::new(FileSettingsStore::new(DEFAULT_SETTINGS_PATH));
    let (settings, source) = load_settings(store.as_ref());
    info!("Settings loaded from {}", source);
    let config = settings.config.clone();

    // ── 4. Adapters ───────────────────────────────────────────
    let mut hw = HardwareAdapter::new(
        StepperDriver::new(motor_pins(), sys_delay(), config.step_delay_ms),
        ModeIndicator::new(
            GpioOut(pins::LED_MANUAL_GPIO),
            GpioOut(pins::LED_TIMED_GPIO),
            GpioOut(pins::LED_AUTOMATIC_GPIO),
        ),
        LightSensor::new(
            GpioOpenDrain(pins::LIGHT_SENSOR_GPIO),
            sys_delay(),
            config.sensor_discharge_ms,
            config.sensor_poll_limit,
        ),
        ManualButtonPair::new(
            GpioIn(pins::BUTTON_OPEN_GPIO),
            GpioIn(pins::BUTTON_CLOSE_GPIO),
        ),
    );
    button::set_debounce_interval(config.button_debounce_ms);

    let mut upload = UploadServer::on_port(config.upload_port, Arc::clone(&store));
    let mut log_sink = LogEventSink::new();
    let clock = SystemClock::new();
    if !clock.is_synced() {
        warn!("Wall clock not set; timed and automatic modes use the epoch until it is");
    }

    // ── 5. App service ────────────────────────────────────────
    let mut app = AppService::new(settings);
    app.start(&mut hw, &mut log_sink);
    let mut generation = app.settings_generation();

    info!("System ready. Entering event loop.");

    // ── 6. Event loop ─────────────────────────────────────────
    let mut setup_line = GpioIn(pins::BUTTON_SETUP_GPIO);
    let mut shutdown_hold = HoldDetector::new(SHUTDOWN_HOLD_MS);
    loop {
        // Active-low; a failed read counts as released.
        let held = setup_line.is_low().unwrap_or(false);
        if shutdown_hold.update(clock.uptime_ms(), held) {
            info!("Setup button held {} ms, shutting down", SHUTDOWN_HOLD_MS);
            if !EVENTS.push(Event::Shutdown) {
                app.shutdown(&mut hw, &mut upload, &mut log_sink);
            }
        }

        if !app.process_events(&EVENTS, &mut hw, &mut upload, store.as_ref(), &mut log_sink) {
            break;
        }

        if app.settings_generation() != generation {
            generation = app.settings_generation();
            let cfg = &app.settings().config;
            hw.apply_config(cfg);
            button::set_debounce_interval(cfg.button_debounce_ms);
        }

        app.tick(&clock, &mut hw, &mut log_sink);

        std::thread::sleep(Duration::from_millis(u64::from(
            app.settings().config.control_loop_interval_ms,
        )));
    }

    drop(hw);
    release_outputs();
    info!("Event loop exited");
    Ok(())
}

/// Log the panic, drop every output line and ask the event loop to shut
/// down. The request only takes effect when a worker thread panicked.
fn install_panic_handler() {
    std::panic::set_hook(Box::new(|info| {
        let reason = if let Some(msg) = info.payload().downcast_ref::<&str>() {
            *msg
        } else if let Some(msg) = info.payload().downcast_ref::<String>() {
            msg.as_str()
        } else {
            "unknown panic"
        };
        error!("PANIC: {} ({:?})", reason, info.location());
        release_outputs();
        EVENTS.push(Event::Shutdown);
    }));
}
