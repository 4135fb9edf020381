//! Integration tests for the AppService → ModeMachine → ports pipeline.
//!
//! Port-level tests use `MockHardware`; the `board_*` tests drive the real
//! stepper, indicator and light-sensor drivers through mock pins.

use crate::mock_hw::{
    ActuatorCall, MockHardware, MockStore, MockUpload, RecordingSink, mock_board,
};

use blindctl::adapters::time::FixedClock;
use blindctl::app::events::AppEvent;
use blindctl::app::service::AppService;
use blindctl::config::{Settings, SettingsSource, SystemConfig};
use blindctl::drivers::button::ManualButtons;
use blindctl::drivers::indicator::IndicatorPattern;
use blindctl::drivers::stepper::{Direction, MAX_STEPS};
use blindctl::error::{ActuatorError, SensorError};
use blindctl::events::Event;
use blindctl::fsm::OperationMode;
use blindctl::fsm::context::MotionCommand;

/// 2024-06-21 12:00 local (UTC+2): outside the close window, daylight.
const NOON: FixedClock = FixedClock(1_718_964_000);
/// 2024-06-21 23:00 local: inside the 22:00 + 540 min close window.
const NIGHT: FixedClock = FixedClock(1_719_003_600);

/// Brightness count that maps to exactly 50 %.
const HALF_LIGHT: u32 = 25_955;

struct Rig {
    app: AppService,
    hw: MockHardware,
    upload: MockUpload,
    store: MockStore,
    sink: RecordingSink,
}

impl Rig {
    fn new() -> Self {
        let mut rig = Self {
            app: AppService::new(Settings::default()),
            hw: MockHardware::new(),
            upload: MockUpload::default(),
            store: MockStore::default(),
            sink: RecordingSink::default(),
        };
        rig.app.start(&mut rig.hw, &mut rig.sink);
        rig
    }

    fn event(&mut self, event: Event) {
        self.app.handle_event(
            event,
            &mut self.hw,
            &mut self.upload,
            &self.store,
            &mut self.sink,
        );
    }

    fn tick(&mut self, clock: FixedClock) {
        self.app.tick(&clock, &mut self.hw, &mut self.sink);
    }

    fn enter_mode(&mut self, mode: OperationMode) {
        while self.app.mode() != mode {
            self.event(Event::ModeToggle);
        }
    }
}

// ── Mode cycling ──────────────────────────────────────────────

#[test]
fn starts_in_manual_with_manual_indicator() {
    let rig = Rig::new();
    assert_eq!(rig.app.mode(), OperationMode::Manual);
    assert!(!rig.app.config_active());
    assert_eq!(rig.sink.events, vec![AppEvent::Started(OperationMode::Manual)]);
    assert_eq!(
        rig.hw.last_indicator(),
        Some(IndicatorPattern::Mode(OperationMode::Manual))
    );
}

#[test]
fn three_mode_toggles_return_to_manual() {
    let mut rig = Rig::new();
    let mut seen = Vec::new();
    for _ in 0..3 {
        rig.event(Event::ModeToggle);
        seen.push(rig.hw.last_indicator());
    }
    assert_eq!(rig.app.mode(), OperationMode::Manual);
    assert_eq!(
        seen,
        vec![
            Some(IndicatorPattern::Mode(OperationMode::Timed)),
            Some(IndicatorPattern::Mode(OperationMode::Automatic)),
            Some(IndicatorPattern::Mode(OperationMode::Manual)),
        ]
    );
    assert_eq!(
        rig.sink.count(|e| matches!(e, AppEvent::ModeChanged { .. })),
        3
    );
}

// ── Configuration mode ────────────────────────────────────────

#[test]
fn mode_toggle_ignored_while_configuring() {
    let mut rig = Rig::new();
    rig.event(Event::SetupToggle);
    rig.event(Event::ModeToggle);
    rig.event(Event::ModeToggle);

    assert!(rig.app.config_active());
    assert_eq!(rig.app.mode(), OperationMode::Manual);
    assert_eq!(rig.sink.count(|e| matches!(e, AppEvent::ModeChanged { .. })), 0);
    assert_eq!(rig.hw.last_indicator(), Some(IndicatorPattern::Config));
}

#[test]
fn setup_cycle_runs_upload_and_reloads_settings() {
    let mut rig = Rig::new();
    let mut uploaded = SystemConfig::default();
    uploaded.latitude = 48.2;
    uploaded.close_start = "21:00".into();
    uploaded.close_duration = 60;
    rig.store = MockStore::with(uploaded);

    rig.event(Event::SetupToggle);
    assert!(rig.upload.running);
    assert_eq!(rig.upload.starts, 1);
    assert_eq!(rig.store.loads.get(), 0);

    rig.event(Event::SetupToggle);
    assert!(!rig.app.config_active());
    assert!(!rig.upload.running);
    assert_eq!(rig.upload.stops, 1);
    assert_eq!(rig.store.loads.get(), 1);

    assert_eq!(rig.app.settings().config.latitude, 48.2);
    assert_eq!(rig.app.settings().close_window.duration_mins, 60);
    assert_eq!(rig.app.settings_generation(), 1);
    assert_eq!(
        rig.hw.last_indicator(),
        Some(IndicatorPattern::Mode(OperationMode::Manual))
    );

    let tail: Vec<_> = rig.sink.events.iter().skip(1).cloned().collect();
    assert_eq!(
        tail,
        vec![
            AppEvent::ConfigEntered,
            AppEvent::ConfigExited,
            AppEvent::SettingsReloaded(SettingsSource::User),
        ]
    );
}

#[test]
fn reload_falls_back_to_defaults() {
    let mut rig = Rig::new();
    let mut bad = SystemConfig::default();
    bad.close_start = "25:99".into();
    *rig.store.stored.borrow_mut() = Some(bad);

    rig.event(Event::SetupToggle);
    rig.event(Event::SetupToggle);

    assert_eq!(rig.app.settings(), &Settings::default());
    assert!(rig
        .sink
        .events
        .contains(&AppEvent::SettingsReloaded(SettingsSource::Defaults)));
}

#[test]
fn upload_start_failure_still_enters_configuration() {
    let mut rig = Rig::new();
    rig.upload.fail_start = true;
    rig.event(Event::SetupToggle);
    assert!(rig.app.config_active());
    assert_eq!(rig.hw.last_indicator(), Some(IndicatorPattern::Config));
}

#[test]
fn no_actuation_while_configuring() {
    let mut rig = Rig::new();
    rig.enter_mode(OperationMode::Automatic);
    rig.hw.brightness = Ok(HALF_LIGHT);
    rig.event(Event::SetupToggle);

    for _ in 0..5 {
        rig.tick(NOON);
    }
    assert!(rig.hw.motion_calls().is_empty());
    assert_eq!(rig.hw.samples_taken, 0);
    assert_eq!(rig.app.last_motion(), MotionCommand::Hold);
    assert_eq!(rig.app.tick_count(), 5);
}

// ── Strategies ────────────────────────────────────────────────

#[test]
fn manual_jogs_while_one_button_held() {
    let mut rig = Rig::new();
    rig.hw.buttons = ManualButtons { open: true, close: false };
    rig.tick(NOON);
    rig.tick(NOON);
    assert_eq!(rig.hw.position, 16);

    rig.hw.buttons = ManualButtons { open: true, close: true };
    rig.tick(NOON);
    assert_eq!(rig.app.last_motion(), MotionCommand::Hold);

    rig.hw.buttons = ManualButtons { open: false, close: true };
    rig.tick(NOON);
    assert_eq!(rig.hw.position, 8);
    assert_eq!(
        rig.hw.motion_calls(),
        vec![
            ActuatorCall::Step(Direction::Open),
            ActuatorCall::Step(Direction::Open),
            ActuatorCall::Step(Direction::Close),
        ]
    );
}

#[test]
fn manual_close_at_zero_is_silently_rejected() {
    let mut rig = Rig::new();
    rig.hw.buttons = ManualButtons { open: false, close: true };
    rig.tick(NOON);
    assert_eq!(rig.hw.position, 0);
    assert_eq!(rig.sink.count(|e| matches!(e, AppEvent::SeekFailed(_))), 0);
}

#[test]
fn sensors_are_read_only_by_the_mode_that_uses_them() {
    let mut rig = Rig::new();
    rig.tick(NOON);
    assert_eq!((rig.hw.button_reads, rig.hw.samples_taken), (1, 0));

    rig.enter_mode(OperationMode::Timed);
    rig.tick(NOON);
    assert_eq!((rig.hw.button_reads, rig.hw.samples_taken), (1, 0));

    rig.enter_mode(OperationMode::Automatic);
    rig.tick(NOON);
    assert_eq!((rig.hw.button_reads, rig.hw.samples_taken), (1, 1));
}

#[test]
fn timed_opens_outside_window_and_closes_inside() {
    let mut rig = Rig::new();
    rig.enter_mode(OperationMode::Timed);

    rig.tick(NOON);
    assert_eq!(rig.hw.position, MAX_STEPS);
    rig.tick(NOON);

    rig.tick(NIGHT);
    assert_eq!(rig.hw.position, 0);

    let reached: Vec<_> = rig
        .sink
        .events
        .iter()
        .filter(|e| matches!(e, AppEvent::TargetReached { .. }))
        .cloned()
        .collect();
    assert_eq!(
        reached,
        vec![
            AppEvent::TargetReached { percent: 100, steps: 128 },
            AppEvent::TargetReached { percent: 0, steps: 128 },
        ]
    );
}

#[test]
fn automatic_follows_brightness_in_daylight() {
    let mut rig = Rig::new();
    rig.enter_mode(OperationMode::Automatic);
    rig.hw.brightness = Ok(HALF_LIGHT);

    rig.tick(NOON);
    assert_eq!(rig.hw.position, 512);
    assert!(rig
        .sink
        .events
        .contains(&AppEvent::TargetReached { percent: 50, steps: 64 }));

    // Same target again: no movement, no event.
    let before = rig.sink.events.len();
    rig.tick(NOON);
    assert_eq!(rig.sink.events.len(), before);
    assert_eq!(rig.hw.position, 512);
}

#[test]
fn automatic_closes_inside_window_regardless_of_light() {
    let mut rig = Rig::new();
    rig.hw.position = 512;
    rig.enter_mode(OperationMode::Automatic);
    rig.hw.brightness = Ok(14);
    rig.tick(NIGHT);
    assert_eq!(rig.hw.position, 0);
}

#[test]
fn sensor_fault_emits_event_and_holds() {
    let mut rig = Rig::new();
    rig.enter_mode(OperationMode::Automatic);
    let fault = SensorError::PollTimeout { polls: 200_000 };
    rig.hw.brightness = Err(fault);

    rig.tick(NOON);
    assert!(rig.sink.events.contains(&AppEvent::SensorFault(fault)));
    assert_eq!(rig.app.last_motion(), MotionCommand::Hold);
    assert!(rig.hw.motion_calls().is_empty());
}

#[test]
fn seek_failure_is_reported() {
    let mut rig = Rig::new();
    rig.enter_mode(OperationMode::Timed);
    rig.hw.fail_seeks = true;
    rig.tick(NOON);
    assert!(rig.sink.events.contains(&AppEvent::SeekFailed(
        ActuatorError::SeekMismatch { target: MAX_STEPS, position: 0 }
    )));
}

// ── Shutdown ──────────────────────────────────────────────────

#[test]
fn shutdown_stops_upload_and_releases_once() {
    let mut rig = Rig::new();
    rig.event(Event::SetupToggle);
    assert!(rig.upload.running);

    rig.event(Event::Shutdown);
    rig.event(Event::Shutdown);

    assert!(rig.app.is_shut_down());
    assert!(!rig.upload.running);
    assert_eq!(
        rig.hw.calls.iter().filter(|c| **c == ActuatorCall::Release).count(),
        1
    );
    assert_eq!(rig.sink.count(|e| *e == AppEvent::Shutdown), 1);

    // A dead service neither ticks nor reacts.
    rig.event(Event::ModeToggle);
    rig.tick(NOON);
    assert_eq!(rig.app.tick_count(), 0);
    assert_eq!(rig.app.mode(), OperationMode::Manual);
}

// ── Real drivers behind mock pins ─────────────────────────────

#[test]
fn board_automatic_half_light_seeks_to_512() {
    let (mut hw, board) = mock_board();
    board.charge_polls.set(HALF_LIGHT);
    let mut app = AppService::new(Settings::default());
    let (mut upload, store, mut sink) =
        (MockUpload::default(), MockStore::default(), RecordingSink::default());
    app.start(&mut hw, &mut sink);
    for _ in 0..2 {
        app.handle_event(Event::ModeToggle, &mut hw, &mut upload, &store, &mut sink);
    }
    assert_eq!(board.led_levels(), [false, false, true]);

    board.motor.borrow_mut().clear();
    app.tick(&NOON, &mut hw, &mut sink);

    assert_eq!(hw.position(), 512);
    assert!(sink
        .events
        .contains(&AppEvent::TargetReached { percent: 50, steps: 64 }));
    // 64 calls, 8 phase entries of 5 ms each.
    assert_eq!(board.motor_delay.total_ms(), 64 * 8 * 5);
    // 4 writes per phase entry plus 4 releases, per call.
    assert_eq!(board.motor.borrow().len(), 64 * (8 * 4 + 4));
    assert!(!board.motor_energized());
}

#[test]
fn board_config_pattern_and_shutdown_release() {
    let (mut hw, board) = mock_board();
    let mut app = AppService::new(Settings::default());
    let (mut upload, store, mut sink) =
        (MockUpload::default(), MockStore::default(), RecordingSink::default());
    app.start(&mut hw, &mut sink);
    assert_eq!(board.led_levels(), [true, false, false]);

    app.handle_event(Event::SetupToggle, &mut hw, &mut upload, &store, &mut sink);
    assert_eq!(board.led_levels(), [true, false, true]);

    app.shutdown(&mut hw, &mut upload, &mut sink);
    assert_eq!(board.led_levels(), [false, false, false]);
    assert!(!board.motor_energized());
}

#[test]
fn board_stuck_sensor_times_out() {
    let (mut hw, board) = mock_board();
    board.charge_polls.set(u32::MAX);
    let mut app = AppService::new(Settings::default());
    let (mut upload, store, mut sink) =
        (MockUpload::default(), MockStore::default(), RecordingSink::default());
    app.start(&mut hw, &mut sink);
    for _ in 0..2 {
        app.handle_event(Event::ModeToggle, &mut hw, &mut upload, &store, &mut sink);
    }

    app.tick(&NOON, &mut hw, &mut sink);
    assert!(sink.events.contains(&AppEvent::SensorFault(
        SensorError::PollTimeout { polls: 200_000 }
    )));
    assert_eq!(hw.position(), 0);
}

#[test]
fn board_manual_jog_stops_at_the_open_limit() {
    let (mut hw, board) = mock_board();
    board.open_button.set(true);
    let mut app = AppService::new(Settings::default());
    let mut sink = RecordingSink::default();
    app.start(&mut hw, &mut sink);

    for _ in 0..(MAX_STEPS / 8 + 5) {
        app.tick(&NOON, &mut hw, &mut sink);
    }
    assert_eq!(hw.position(), MAX_STEPS);
}
