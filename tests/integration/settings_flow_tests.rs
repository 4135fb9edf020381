//! Integration tests for the configuration-mode settings flow.
//!
//! Setup button → upload server on loopback → JSON document over TCP →
//! settings file → setup button → service reloads the new settings.

use std::io::{Read, Write};
use std::net::{Shutdown, SocketAddr, TcpStream};
use std::path::PathBuf;
use std::sync::Arc;

use blindctl::adapters::settings_store::FileSettingsStore;
use blindctl::adapters::upload_server::UploadServer;
use blindctl::app::events::AppEvent;
use blindctl::app::ports::{ActuatorPort, ConfigPort, SettingsUploadPort};
use blindctl::app::service::AppService;
use blindctl::config::{Settings, SettingsSource, load_settings};
use blindctl::events::{Event, EventQueue};

use crate::mock_hw::{ActuatorCall, MockHardware, RecordingSink, mock_board};

fn settings_path(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("blindctl-flow-{}-{}", name, std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("settings.json");
    let _ = std::fs::remove_file(&path);
    path
}

fn loopback_server(store: &Arc<FileSettingsStore>) -> UploadServer<FileSettingsStore> {
    UploadServer::new(SocketAddr::from(([127, 0, 0, 1], 0)), Arc::clone(store))
}

fn send(addr: SocketAddr, body: &str) -> String {
    let mut s = TcpStream::connect(addr).unwrap();
    s.write_all(body.as_bytes()).unwrap();
    s.shutdown(Shutdown::Write).unwrap();
    let mut reply = String::new();
    s.read_to_string(&mut reply).unwrap();
    reply
}

#[test]
fn uploaded_settings_take_effect_after_setup_exit() {
    let store = Arc::new(FileSettingsStore::new(settings_path("apply")));
    let mut upload = loopback_server(&store);
    let mut hw = MockHardware::new();
    let mut sink = RecordingSink::default();

    let (settings, source) = load_settings(store.as_ref());
    assert_eq!(source, SettingsSource::Defaults);
    let mut app = AppService::new(settings);
    app.start(&mut hw, &mut sink);

    app.handle_event(Event::SetupToggle, &mut hw, &mut upload, store.as_ref(), &mut sink);
    let addr = upload.local_addr().unwrap();

    let reply = send(
        addr,
        r#"{"latitude": 60.17, "longitude": 24.94, "close_start": "23:00", "close_duration": 420}"#,
    );
    assert_eq!(reply, "OK\n");

    // Not applied until configuration mode is left.
    assert_eq!(app.settings(), &Settings::default());

    app.handle_event(Event::SetupToggle, &mut hw, &mut upload, store.as_ref(), &mut sink);
    assert!(!upload.is_running());
    assert_eq!(app.settings().config.latitude, 60.17);
    assert_eq!(app.settings().close_window.start.hour, 23);
    assert_eq!(app.settings().close_window.duration_mins, 420);
    assert!(sink
        .events
        .contains(&AppEvent::SettingsReloaded(SettingsSource::User)));
}

#[test]
fn rejected_upload_keeps_previous_file() {
    let store = Arc::new(FileSettingsStore::new(settings_path("reject")));
    let mut upload = loopback_server(&store);
    upload.start().unwrap();
    let addr = upload.local_addr().unwrap();

    assert_eq!(send(addr, r#"{"close_start": "07:30"}"#), "OK\n");
    let reply = send(addr, r#"{"close_start": "7h30"}"#);
    assert!(reply.starts_with("ERR"), "got {reply:?}");

    upload.stop(&mut || {}).unwrap();
    assert_eq!(store.load().unwrap().close_start, "07:30");
}

#[test]
fn reloaded_timings_reach_the_drivers() {
    let store = Arc::new(FileSettingsStore::new(settings_path("timing")));
    let mut upload = loopback_server(&store);
    let (mut hw, board) = mock_board();
    let mut sink = RecordingSink::default();
    let mut app = AppService::new(Settings::default());
    app.start(&mut hw, &mut sink);

    app.handle_event(Event::SetupToggle, &mut hw, &mut upload, store.as_ref(), &mut sink);
    let addr = upload.local_addr().unwrap();
    assert_eq!(send(addr, r#"{"step_delay_ms": 2}"#), "OK\n");
    app.handle_event(Event::SetupToggle, &mut hw, &mut upload, store.as_ref(), &mut sink);

    assert_eq!(app.settings_generation(), 1);
    hw.apply_config(&app.settings().config);

    hw.seek_percent(100).unwrap();
    assert_eq!(board.motor_delay.total_ms(), 128 * 8 * 2);
}

#[test]
fn queued_shutdown_stops_the_upload_server_and_ends_the_loop() {
    let store = Arc::new(FileSettingsStore::new(settings_path("shutdown")));
    let mut upload = loopback_server(&store);
    let mut hw = MockHardware::new();
    let mut sink = RecordingSink::default();
    let mut app = AppService::new(Settings::default());
    app.start(&mut hw, &mut sink);

    let queue = EventQueue::new();
    assert!(queue.push(Event::SetupToggle));
    assert!(app.process_events(&queue, &mut hw, &mut upload, store.as_ref(), &mut sink));
    assert!(upload.is_running());
    let addr = upload.local_addr().unwrap();
    assert_eq!(send(addr, r#"{"close_duration": 60}"#), "OK\n");

    assert!(queue.push(Event::Shutdown));
    assert!(queue.push(Event::ModeToggle));
    assert!(!app.process_events(&queue, &mut hw, &mut upload, store.as_ref(), &mut sink));

    assert!(app.is_shut_down());
    assert!(!upload.is_running());
    assert!(upload.local_addr().is_none());
    assert_eq!(queue.pop(), None);
    assert_eq!(hw.calls.last(), Some(&ActuatorCall::Release));
    assert_eq!(sink.events.last(), Some(&AppEvent::Shutdown));
}
