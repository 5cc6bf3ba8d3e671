// tests/lifecycle.rs - Overlay Lifecycle Tests
//
// Drives the real render thread against the mock platform.

mod common;

use std::sync::atomic::Ordering;
use std::thread;

use common::{config, probe, MockPlatform, TestApp, BASE_EX_STYLE, MOCK_HWND};
use rustoverlay::platform::{SizeKind, WindowEvent, WindowHandle, WindowRect};
use rustoverlay::{LifecycleState, Overlay, OverlayError};

type MockOverlay = Overlay<MockPlatform>;

#[test]
fn start_creates_window_and_reports_ready() {
    let probe = probe("lifecycle-ready");
    let mut overlay = MockOverlay::new(config("lifecycle-ready"));
    assert_eq!(overlay.state(), LifecycleState::NotStarted);

    overlay.start(TestApp::new(probe.clone())).unwrap();

    let control = overlay.control();
    assert_eq!(control.window_handle(), WindowHandle(MOCK_HWND));
    assert!(matches!(overlay.state(), LifecycleState::Ready | LifecycleState::Running));
    assert!(probe.wait_until(|s| s.presents >= 3));

    overlay.close();
    overlay.wait_for_shutdown().unwrap();
    assert_eq!(overlay.state(), LifecycleState::Closed);
    assert!(control.window_handle().is_null());

    let stats = probe.snapshot();
    assert_eq!(stats.hooks, vec!["create_ui", "post_initialized", "render", "on_closed"]);
    assert_eq!(stats.windows_created, 1);
    assert_eq!(stats.windows_destroyed, 1);
    assert_eq!(stats.live_buffers, 0);
    assert_eq!(stats.live_textures, 0);
    assert_eq!(stats.surface_released, 1);
}

#[test]
fn close_then_wait_finishes_and_close_again_is_harmless() {
    let probe = probe("lifecycle-close");
    let mut overlay = MockOverlay::new(config("lifecycle-close"));
    overlay.start(TestApp::new(probe.clone())).unwrap();

    overlay.close();
    overlay.wait_for_shutdown().unwrap();
    let presents = probe.snapshot().presents;

    overlay.close();
    overlay.wait_for_shutdown().unwrap();
    assert_eq!(probe.snapshot().presents, presents);
    assert!(overlay.control().is_closing());
}

#[test]
fn second_start_is_rejected() {
    let probe = probe("lifecycle-double-start");
    let mut overlay = MockOverlay::new(config("lifecycle-double-start"));
    overlay.start(TestApp::new(probe.clone())).unwrap();

    let err = overlay.start(TestApp::new(probe.clone())).unwrap_err();
    assert!(matches!(err, OverlayError::AlreadyStarted));
    assert!(!overlay.control().is_closing());
    assert_eq!(probe.snapshot().windows_created, 1);

    overlay.close();
    overlay.wait_for_shutdown().unwrap();
}

#[test]
fn run_blocks_until_the_app_closes_itself() {
    let probe = probe("lifecycle-run");
    let mut overlay = MockOverlay::new(config("lifecycle-run"));

    overlay.run(TestApp::new(probe.clone()).closing_after(5)).unwrap();

    assert_eq!(probe.snapshot().frames, 5);
    assert_eq!(overlay.state(), LifecycleState::Closed);
}

#[test]
fn dispose_runs_once() {
    let probe = probe("lifecycle-dispose");
    let mut overlay = MockOverlay::new(config("lifecycle-dispose"));
    overlay.start(TestApp::new(probe.clone())).unwrap();

    overlay.dispose();
    overlay.dispose();

    assert!(overlay.is_disposed());
    assert_eq!(overlay.state(), LifecycleState::Closed);
    assert_eq!(probe.snapshot().windows_destroyed, 1);
    drop(overlay);
    assert_eq!(probe.snapshot().hooks.iter().filter(|h| **h == "on_closed").count(), 1);
}

#[test]
fn start_after_dispose_is_rejected() {
    let probe = probe("lifecycle-start-after-dispose");
    let mut overlay = MockOverlay::new(config("lifecycle-start-after-dispose"));
    overlay.dispose();

    let err = overlay.start(TestApp::new(probe.clone())).unwrap_err();
    assert!(matches!(err, OverlayError::Disposed));
    assert_eq!(overlay.state(), LifecycleState::Closed);
    assert_eq!(probe.snapshot().windows_created, 0);
}

#[test]
fn unstarted_overlay_shuts_down_immediately() {
    let mut overlay = MockOverlay::new(config("lifecycle-unstarted"));
    overlay.wait_for_shutdown().unwrap();
    overlay.dispose();
    assert_eq!(overlay.state(), LifecycleState::Closed);
    overlay.control().wait_for_shutdown().unwrap();
}

#[test]
fn other_threads_can_wait_for_shutdown() {
    let probe = probe("lifecycle-waiters");
    let mut overlay = MockOverlay::new(config("lifecycle-waiters"));
    overlay.start(TestApp::new(probe)).unwrap();

    let waiters: Vec<_> = (0..3)
        .map(|_| {
            let control = overlay.control();
            thread::spawn(move || control.wait_for_shutdown().is_ok())
        })
        .collect();

    overlay.control().close();
    for waiter in waiters {
        assert!(waiter.join().unwrap());
    }
}

#[test]
fn waiting_before_start_resolves_after_close() {
    let probe = probe("lifecycle-early-waiter");
    let mut overlay = MockOverlay::new(config("lifecycle-early-waiter"));
    let control = overlay.control();
    let waiter = thread::spawn(move || control.wait_for_shutdown().is_ok());

    overlay.start(TestApp::new(probe.clone())).unwrap();
    assert!(!waiter.is_finished());
    assert!(probe.wait_until(|s| s.presents >= 1));

    overlay.close();
    assert!(waiter.join().unwrap());
    assert_eq!(overlay.state(), LifecycleState::Closed);
}

#[test]
fn ui_creation_failure_surfaces_from_start() {
    let probe = probe("lifecycle-ui-failure");
    let mut overlay = MockOverlay::new(config("lifecycle-ui-failure"));
    let mut app = TestApp::new(probe.clone());
    app.fail_create_ui = true;

    let err = overlay.start(app).unwrap_err();
    assert!(err.is(|e| matches!(e, OverlayError::Hook(_))));
    assert_eq!(overlay.state(), LifecycleState::Closed);
    assert!(overlay.wait_for_shutdown().is_err());

    let stats = probe.snapshot();
    assert_eq!(stats.windows_created, 1);
    assert_eq!(stats.windows_destroyed, 1);
    assert_eq!(stats.presents, 0);
}

#[test]
fn window_creation_failure_surfaces_from_start() {
    let probe = probe("lifecycle-window-failure");
    probe.fail_window.store(true, Ordering::SeqCst);
    let mut overlay = MockOverlay::new(config("lifecycle-window-failure"));

    let err = overlay.start(TestApp::new(probe.clone())).unwrap_err();
    assert!(err.is(|e| matches!(e, OverlayError::Init(_))));
    assert!(probe.snapshot().hooks.is_empty());
}

#[test]
fn closing_hook_error_is_reported_on_shutdown() {
    let probe = probe("lifecycle-closed-hook");
    let mut overlay = MockOverlay::new(config("lifecycle-closed-hook"));
    let mut app = TestApp::new(probe.clone()).closing_after(1);
    app.fail_on_closed = true;

    overlay.start(app).unwrap();
    let err = overlay.wait_for_shutdown().unwrap_err();
    assert!(err.is(|e| matches!(e, OverlayError::Hook(_))));
    // Resources are still released
    assert_eq!(probe.snapshot().windows_destroyed, 1);
}

#[test]
fn render_error_ends_the_loop() {
    let probe = probe("lifecycle-render-error");
    let mut overlay = MockOverlay::new(config("lifecycle-render-error"));
    let app = TestApp::new(probe.clone()).rendering(|_, _| anyhow::bail!("frame exploded"));

    overlay.start(app).unwrap();
    let err = overlay.wait_for_shutdown().unwrap_err();
    assert!(err.to_string().contains("frame exploded"));
    assert_eq!(probe.snapshot().hooks.last(), Some(&"on_closed"));
}

#[test]
fn creation_resize_is_replayed_after_ready() {
    let probe = probe("lifecycle-resize");
    let mut overlay = MockOverlay::new(config("lifecycle-resize"));
    overlay.run(TestApp::new(probe.clone()).closing_after(1)).unwrap();

    let stats = probe.snapshot();
    assert_eq!(stats.surfaces, vec![(640, 480)]);
    assert_eq!(stats.ui_events.first().map(String::as_str), Some("display 640x480"));
}

#[test]
fn zero_message_cap_still_pumps() {
    let probe = probe("lifecycle-zero-cap");
    let mut settings = config("lifecycle-zero-cap");
    settings.max_messages_per_frame = 0;
    let mut overlay = MockOverlay::new(settings);

    overlay.run(TestApp::new(probe.clone()).closing_after(1)).unwrap();
    assert_eq!(probe.snapshot().surfaces, vec![(640, 480)]);
}

#[test]
fn resize_and_minimize_while_running() {
    let probe = probe("lifecycle-live-resize");
    let mut overlay = MockOverlay::new(config("lifecycle-live-resize"));
    overlay.start(TestApp::new(probe.clone())).unwrap();

    probe.push_event(WindowEvent::Resized { kind: SizeKind::Maximized, width: 1920, height: 1080 });
    assert!(probe.wait_until(|s| s.surfaces.len() == 2));
    assert_eq!(overlay.control().size(), (1920, 1080));

    probe.push_event(WindowEvent::Resized { kind: SizeKind::Minimized, width: 0, height: 0 });
    assert!(probe.wait_until(|s| s.ui_events.iter().any(|e| e == "display 0x0")));

    overlay.close();
    overlay.wait_for_shutdown().unwrap();
    // Minimizing never touches the swap chain
    assert_eq!(probe.snapshot().surfaces, vec![(640, 480), (1920, 1080)]);
}

#[test]
fn native_destroy_closes_the_overlay() {
    let probe = probe("lifecycle-destroyed");
    let mut overlay = MockOverlay::new(config("lifecycle-destroyed"));
    overlay.start(TestApp::new(probe.clone())).unwrap();

    probe.push_event(WindowEvent::Destroyed);
    overlay.wait_for_shutdown().unwrap();
    assert!(overlay.control().is_closing());
}

#[test]
fn click_through_follows_ui_capture() {
    let probe = probe("lifecycle-click-through");
    let mut overlay = MockOverlay::new(config("lifecycle-click-through"));
    // Capture is read at the start of the next frame
    let app = TestApp::new(probe.clone()).closing_after(3).rendering(|_, probe| {
        let frame = probe.stats().frames;
        probe.want_capture.store(frame == 1, Ordering::SeqCst);
        Ok(())
    });

    overlay.run(app).unwrap();

    let click_through = BASE_EX_STYLE | 0x0008_0000 | 0x0000_0020;
    let stats = probe.snapshot();
    assert_eq!(stats.styles, vec![click_through, BASE_EX_STYLE, click_through]);
    assert_eq!(stats.focus_calls, 1);
    assert_eq!(stats.focus_lost, 1);
}

#[test]
fn input_reaches_the_ui() {
    let probe = probe("lifecycle-input");
    let mut overlay = MockOverlay::new(config("lifecycle-input"));
    overlay.start(TestApp::new(probe.clone())).unwrap();

    probe.push_event(WindowEvent::Wheel(-240));
    probe.push_event(WindowEvent::Char(0x41));
    assert!(probe.wait_until(|s| s.ui_events.iter().any(|e| e == "char 65")));

    overlay.close();
    overlay.wait_for_shutdown().unwrap();
    let stats = probe.snapshot();
    assert!(stats.ui_events.iter().any(|e| e == "wheel 0 -2"));
}

#[test]
fn queued_requests_apply_before_the_first_frame() {
    let probe = probe("lifecycle-requests");
    let icon = tempfile::NamedTempFile::new().unwrap();
    let mut overlay = MockOverlay::new(config("lifecycle-requests"));
    let control = overlay.control();

    control.set_position(5, 6);
    assert!(control.set_icon(icon.path()));
    assert!(!control.set_icon("/no/such/icon.ico"));

    overlay.run(TestApp::new(probe.clone()).closing_after(1)).unwrap();

    let stats = probe.snapshot();
    assert_eq!(stats.moves, vec![WindowRect::new(5, 6, 640, 480)]);
    assert_eq!(stats.icons, vec![icon.path().to_path_buf()]);
}

#[test]
fn display_count_comes_from_the_platform() {
    assert_eq!(MockOverlay::number_video_displays(), 2);
}
