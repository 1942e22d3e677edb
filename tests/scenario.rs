mod common;

use common::{TestBoard, board};
use pico_datalogger::app::{DataLogger, LogOutcome};
use pico_datalogger::clock::WallClock;
use pico_datalogger::config::{CSV_HEADER, Config, LOG_FILE_NAME, MESSAGE_WINDOW_US};
use pico_datalogger::display;
use pico_datalogger::indicator::Indicator;
use pico_datalogger::input::{Button, Debouncer, InputEvent, on_edge};
use pico_datalogger::mount::{MountAction, MountOutcome};
use pico_datalogger::state::{CaptureOutcome, MessageKind, Shared};

const TICK_US: u64 = 500_000;

type Logger = DataLogger<
    common::MemCard,
    common::Buzzer,
    common::RampImu,
    common::Oled,
    common::Led,
>;

fn logger_with(board: TestBoard) -> Logger {
    let config = Config::default();
    let mut clock = WallClock::new();
    clock.set(config.boot_datetime, 0).unwrap();
    DataLogger::new(board, &config, clock)
}

#[test]
fn startup_plays_melody_and_draws_idle_frame() {
    let shared = Shared::new();
    let mut logger = logger_with(board());
    logger.start(&shared, 0);

    let b = logger.board();
    assert_eq!(b.tone.notes, vec![(523, 100), (659, 100), (784, 100), (1047, 150)]);
    assert_eq!(b.light.shown, vec![Indicator::Idle]);
    assert_eq!(b.panel.frames, 1);
    assert!(b.panel.lit > 0);
}

#[test]
fn mount_then_record() {
    let shared = Shared::new();
    let mut debouncer = Debouncer::new();
    let mut logger = logger_with(board());
    let mut now = 0;

    // Idle tick.
    let report = logger.tick(&shared, now);
    assert_eq!(report.indicator, Indicator::Idle);
    assert_eq!(display::footer(&report.screen), "MODE: IDLE");
    assert_eq!(report.log, LogOutcome::Idle);

    // Mount press, with a bounce right behind it.
    now += 100_000;
    assert_eq!(
        on_edge(&mut debouncer, &shared, Button::Mount, now),
        Some(InputEvent::MountRequested(true))
    );
    assert_eq!(on_edge(&mut debouncer, &shared, Button::Mount, now + 5_000), None);

    now += TICK_US;
    let report = logger.tick(&shared, now);
    let mounted_at = now;
    assert_eq!(report.mount, Some(MountOutcome::Mounted));
    assert_eq!(report.indicator, Indicator::Ready);
    assert_eq!(report.screen.message, Some(MessageKind::Mounted));
    assert_eq!(display::footer(&report.screen), "MODE: READY");
    assert_eq!(logger.board().storage.mounts, 1);

    // Confirmation beep plays on the following tick.
    now += TICK_US;
    let report = logger.tick(&shared, now);
    assert_eq!(report.cues_played, 1);
    assert_eq!(logger.board().tone.notes.last(), Some(&(600, 120)));
    assert_eq!(report.mount, None);
    assert_eq!(report.screen.message, Some(MessageKind::Mounted));

    // Message gone once the window has elapsed.
    now = mounted_at + MESSAGE_WINDOW_US;
    let report = logger.tick(&shared, now);
    assert_eq!(report.screen.message, None);
    assert_eq!(display::body(&report.screen)[0].as_str(), "Action: Record");

    // Capture press.
    now += 1_000;
    assert_eq!(
        on_edge(&mut debouncer, &shared, Button::Capture, now),
        Some(InputEvent::Capture(CaptureOutcome::Started))
    );

    let mut last = 0;
    for i in 1..=4u32 {
        now += TICK_US;
        let report = logger.tick(&shared, now);
        assert_eq!(report.indicator, Indicator::Recording);
        assert_eq!(display::footer(&report.screen), "MODE: RECORDING");
        if i == 1 {
            assert_eq!(report.screen.message, Some(MessageKind::CaptureStarted));
        }
        let LogOutcome::Written(count) = report.log else {
            panic!("tick {i} did not write: {:?}", report.log);
        };
        assert!(count > last);
        last = count;
    }
    assert_eq!(logger.sample_count(), 4);

    let text = logger.board().storage.text(LOG_FILE_NAME);
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 5);
    assert_eq!(lines[0], CSV_HEADER.trim_end());
    assert!(lines[1].starts_with("2025-07-29,12:00:"));
    // Fifth IMU read: four idle/ready ticks came first.
    assert!(lines[1].ends_with(",5,0,16384,0,0,-5"));
    assert_eq!(lines[1].split(',').count(), 8);
    assert_eq!(logger.board().storage.open_handles, 0);
}

#[test]
fn capture_without_card_is_refused() {
    let shared = Shared::new();
    let mut debouncer = Debouncer::new();
    let mut logger = logger_with(board());

    assert_eq!(
        on_edge(&mut debouncer, &shared, Button::Capture, 0),
        Some(InputEvent::Capture(CaptureOutcome::Rejected))
    );
    let report = logger.tick(&shared, TICK_US);
    assert!(!shared.is_capturing());
    assert_eq!(report.cues_played, 1);
    assert_eq!(
        logger.board().tone.notes,
        vec![(400, 150), (0, 50), (400, 150)]
    );
    assert_eq!(report.screen.message, Some(MessageKind::InvalidCapture));
    assert_eq!(report.indicator, Indicator::Idle);
    assert!(logger.board().storage.files.is_empty());
}

#[test]
fn failed_mount_shows_error_once() {
    let shared = Shared::new();
    let mut debouncer = Debouncer::new();
    let mut b = board();
    b.storage.fail_mount = true;
    let mut logger = logger_with(b);

    on_edge(&mut debouncer, &shared, Button::Mount, 0);
    let report = logger.tick(&shared, TICK_US);
    assert_eq!(report.mount, Some(MountOutcome::Failed(MountAction::Mount)));
    assert_eq!(report.screen.message, Some(MessageKind::MountError));
    assert!(!shared.is_mounted());

    for n in 2..6 {
        let report = logger.tick(&shared, n * TICK_US);
        assert_eq!(report.mount, None);
    }
    assert_eq!(logger.board().storage.mounts, 1);
}

#[test]
fn write_failure_drops_record_and_recovers() {
    let shared = Shared::new();
    let mut debouncer = Debouncer::new();
    let mut logger = logger_with(board());

    on_edge(&mut debouncer, &shared, Button::Mount, 0);
    logger.tick(&shared, TICK_US);
    on_edge(&mut debouncer, &shared, Button::Capture, TICK_US + 1);

    logger.board_mut().storage.fail_writes = true;
    let report = logger.tick(&shared, 2 * TICK_US);
    assert_eq!(report.log, LogOutcome::Failed);
    assert_eq!(report.samples, 0);
    assert_eq!(shared.active_message(2 * TICK_US), Some(MessageKind::WriteError));

    logger.board_mut().storage.fail_writes = false;
    let report = logger.tick(&shared, 3 * TICK_US);
    assert_eq!(report.log, LogOutcome::Written(1));
    let text = logger.board().storage.text(LOG_FILE_NAME);
    assert_eq!(text.lines().count(), 2);
}

#[test]
fn imu_failure_skips_the_record() {
    let shared = Shared::new();
    let mut debouncer = Debouncer::new();
    let mut logger = logger_with(board());

    on_edge(&mut debouncer, &shared, Button::Mount, 0);
    logger.tick(&shared, TICK_US);
    on_edge(&mut debouncer, &shared, Button::Capture, TICK_US + 1);

    logger.board_mut().imu.fail = true;
    let report = logger.tick(&shared, 2 * TICK_US);
    assert_eq!(report.log, LogOutcome::NoSample);
    assert_eq!(logger.sample_count(), 0);
}

#[test]
fn unmount_while_recording_stops_writes() {
    let shared = Shared::new();
    let mut debouncer = Debouncer::new();
    let mut logger = logger_with(board());

    on_edge(&mut debouncer, &shared, Button::Mount, 0);
    logger.tick(&shared, TICK_US);
    on_edge(&mut debouncer, &shared, Button::Capture, TICK_US + 1);
    logger.tick(&shared, 2 * TICK_US);
    assert_eq!(logger.sample_count(), 1);

    on_edge(&mut debouncer, &shared, Button::Mount, 2 * TICK_US + 1);
    let report = logger.tick(&shared, 3 * TICK_US);
    assert_eq!(report.mount, Some(MountOutcome::Unmounted));
    assert_eq!(report.indicator, Indicator::Anomaly);
    assert_eq!(report.log, LogOutcome::Idle);
    assert_eq!(display::footer(&report.screen), "MODE: IDLE");

    // Capture press disarms; the light returns to idle.
    on_edge(&mut debouncer, &shared, Button::Capture, 3 * TICK_US + 1);
    let report = logger.tick(&shared, 4 * TICK_US);
    assert_eq!(report.indicator, Indicator::Idle);
    assert_eq!(logger.sample_count(), 1);
}

#[test]
fn remount_appends_without_second_header() {
    let shared = Shared::new();
    let mut debouncer = Debouncer::new();
    let mut logger = logger_with(board());
    let mut now = 0;

    for _session in 0..2 {
        now += 1_000_000;
        on_edge(&mut debouncer, &shared, Button::Mount, now);
        now += TICK_US;
        logger.tick(&shared, now);
        now += 1_000;
        on_edge(&mut debouncer, &shared, Button::Capture, now);
        now += TICK_US;
        logger.tick(&shared, now);
        now += 1_000_000;
        on_edge(&mut debouncer, &shared, Button::Capture, now);
        now += 1_000_000;
        on_edge(&mut debouncer, &shared, Button::Mount, now);
        now += TICK_US;
        logger.tick(&shared, now);
        assert!(!shared.is_mounted());
    }

    let text = logger.board().storage.text(LOG_FILE_NAME);
    let headers = text.lines().filter(|l| l.starts_with("Date,")).count();
    assert_eq!(headers, 1);
    assert_eq!(text.lines().count(), 3);
    assert_eq!(logger.board().storage.mounts, 2);
    assert_eq!(logger.board().storage.unmounts, 2);
}
