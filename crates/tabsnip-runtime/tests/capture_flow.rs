//! End-to-end capture flows across launcher, coordinator, and overlay.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use image::{ImageBuffer, Rgba, RgbaImage};
use tokio::sync::broadcast::error::TryRecvError;
use tokio::time::{sleep, timeout};

use tabsnip_core::config::{RetryPolicy, RuntimeConfig};
use tabsnip_core::error::{Result, SnipError};
use tabsnip_core::frame::{FrameSource, FullFrame, TabId};
use tabsnip_core::protocol::{CaptureEvent, ForwardOutcome, OverlayAck};
use tabsnip_core::session::OverlayPhase;
use tabsnip_core::slot::SlotStore;
use tabsnip_infrastructure::{MemorySlotStore, StaticFrameSource};
use tabsnip_runtime::{Coordinator, CoordinatorHandle, Launcher, OverlayOptions, StartOutcome};

const EVENT_WAIT: Duration = Duration::from_secs(2);

fn gradient_png(width: u32, height: u32) -> Vec<u8> {
    let img: RgbaImage = ImageBuffer::from_fn(width, height, |x, y| {
        Rgba([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8, 255])
    });
    let mut png = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)
        .unwrap();
    png
}

fn gradient_pixel(x: u32, y: u32) -> Rgba<u8> {
    Rgba([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8, 255])
}

fn fast_config() -> RuntimeConfig {
    RuntimeConfig {
        reply_timeout_ms: 50,
        inject_retry: RetryPolicy {
            attempts: 1,
            delay_ms: 10,
        },
    }
}

struct Harness {
    coordinator: CoordinatorHandle,
    launcher: Launcher,
    source: Arc<StaticFrameSource>,
    slot: Arc<MemorySlotStore>,
}

fn harness() -> Harness {
    harness_with_frame(gradient_png(1000, 800))
}

fn harness_with_frame(png: Vec<u8>) -> Harness {
    let source = Arc::new(StaticFrameSource::new(png).unwrap());
    let slot = Arc::new(MemorySlotStore::new());
    let coordinator = Coordinator::spawn(source.clone(), slot.clone(), fast_config());
    let launcher = Launcher::new(coordinator.clone(), fast_config());
    Harness {
        coordinator,
        launcher,
        source,
        slot,
    }
}

async fn start_injected(harness: &Harness, tab: TabId) -> tabsnip_runtime::OverlayHandle {
    start_injected_with(harness, tab, OverlayOptions::default()).await
}

async fn start_injected_with(
    harness: &Harness,
    tab: TabId,
    options: OverlayOptions,
) -> tabsnip_runtime::OverlayHandle {
    let outcome = harness.launcher.start_capture(tab, options).await.unwrap();
    match outcome {
        StartOutcome::Started {
            overlay: Some(overlay),
            ..
        } => overlay,
        other => panic!("expected an injected start, got {other:?}"),
    }
}

#[tokio::test]
async fn test_capture_round_trip_is_pixel_exact() {
    let h = harness();
    let tab = TabId(1);
    let mut events = h.coordinator.subscribe();

    let overlay = start_injected(&h, tab).await;

    overlay.pointer_down(50.0, 50.0).await.unwrap();
    overlay.pointer_moved(120.0, 90.0).await.unwrap();
    overlay.pointer_moved(250.0, 200.0).await.unwrap();
    overlay.pointer_up().await.unwrap();

    let event = timeout(EVENT_WAIT, events.recv())
        .await
        .expect("no capture notification")
        .unwrap();
    let CaptureEvent::ScreenshotCaptured { artifact } = event;
    assert_eq!((artifact.width, artifact.height), (200, 150));

    // The slot already holds the exact artifact the event announced.
    let stored = h.slot.get().await.unwrap().expect("slot empty after notification");
    assert_eq!(stored.artifact, artifact);

    let img = image::load_from_memory(&artifact.png).unwrap().to_rgba8();
    assert_eq!(img.dimensions(), (200, 150));
    assert_eq!(*img.get_pixel(0, 0), gradient_pixel(50, 50));
    assert_eq!(*img.get_pixel(199, 0), gradient_pixel(249, 50));
    assert_eq!(*img.get_pixel(0, 149), gradient_pixel(50, 199));
    assert_eq!(*img.get_pixel(199, 149), gradient_pixel(249, 199));
    assert_eq!(*img.get_pixel(100, 75), gradient_pixel(150, 125));

    // One frame request for one selection, overlay at rest, session gone.
    assert_eq!(h.source.capture_count(), 1);
    assert_eq!(overlay.phase().await.unwrap(), OverlayPhase::Idle);
    assert!(h.coordinator.session().await.unwrap().is_none());
}

#[tokio::test]
async fn test_device_pixel_ratio_scales_the_crop() {
    let h = harness_with_frame(gradient_png(2000, 1600));
    let tab = TabId(1);
    let mut events = h.coordinator.subscribe();

    let overlay = start_injected_with(
        &h,
        tab,
        OverlayOptions {
            device_pixel_ratio: 2.0,
        },
    )
    .await;

    overlay.pointer_down(50.0, 50.0).await.unwrap();
    overlay.pointer_moved(250.0, 200.0).await.unwrap();
    overlay.pointer_up().await.unwrap();

    let CaptureEvent::ScreenshotCaptured { artifact } = timeout(EVENT_WAIT, events.recv())
        .await
        .expect("no capture notification")
        .unwrap();

    assert_eq!((artifact.width, artifact.height), (400, 300));
    let img = image::load_from_memory(&artifact.png).unwrap().to_rgba8();
    assert_eq!(*img.get_pixel(0, 0), gradient_pixel(100, 100));
    assert_eq!(*img.get_pixel(399, 299), gradient_pixel(499, 399));
}

#[tokio::test]
async fn test_escape_mid_drag_cancels_without_capture() {
    let h = harness();
    let tab = TabId(2);
    let mut events = h.coordinator.subscribe();

    let overlay = start_injected(&h, tab).await;

    overlay.pointer_down(10.0, 10.0).await.unwrap();
    overlay.pointer_moved(300.0, 300.0).await.unwrap();
    overlay.escape().await.unwrap();

    assert_eq!(overlay.phase().await.unwrap(), OverlayPhase::Idle);
    assert!(h.coordinator.session().await.unwrap().is_none());
    assert_eq!(h.source.capture_count(), 0);
    assert!(h.slot.get().await.unwrap().is_none());
    assert!(matches!(events.try_recv(), Err(TryRecvError::Empty)));
}

#[tokio::test]
async fn test_cancel_command_acks_and_is_repeatable() {
    let h = harness();
    let tab = TabId(3);

    let overlay = start_injected(&h, tab).await;
    overlay.pointer_down(20.0, 20.0).await.unwrap();

    let outcome = h.launcher.cancel_capture(tab).await.unwrap();
    assert_eq!(outcome, ForwardOutcome::Acked(OverlayAck::Cancelled));

    // Cancelling again finds nothing to remove but still acks.
    let outcome = h.launcher.cancel_capture(tab).await.unwrap();
    assert_eq!(outcome, ForwardOutcome::Acked(OverlayAck::Cancelled));

    assert_eq!(overlay.phase().await.unwrap(), OverlayPhase::Idle);
    assert!(h.coordinator.session().await.unwrap().is_none());
}

#[tokio::test]
async fn test_cancel_without_any_overlay_reports_no_listener() {
    let h = harness();
    let outcome = h.launcher.cancel_capture(TabId(42)).await.unwrap();
    assert_eq!(outcome, ForwardOutcome::NoListener);
}

#[tokio::test]
async fn test_tiny_drag_is_a_no_op() {
    let h = harness();
    let tab = TabId(4);
    let mut events = h.coordinator.subscribe();

    let overlay = start_injected(&h, tab).await;

    // 4x3 pixels: a stray click, not a selection.
    overlay.pointer_down(50.0, 50.0).await.unwrap();
    overlay.pointer_moved(54.0, 53.0).await.unwrap();
    overlay.pointer_up().await.unwrap();

    assert_eq!(overlay.phase().await.unwrap(), OverlayPhase::Idle);
    assert!(h.coordinator.session().await.unwrap().is_none());

    // No frame was ever requested and nothing was stored or announced.
    assert_eq!(h.source.capture_count(), 0);
    assert!(h.slot.get().await.unwrap().is_none());
    assert!(matches!(events.try_recv(), Err(TryRecvError::Empty)));
}

#[tokio::test]
async fn test_start_while_armed_is_a_no_op() {
    let h = harness();
    let tab = TabId(5);
    let mut events = h.coordinator.subscribe();

    let first = h
        .launcher
        .start_capture(tab, OverlayOptions::default())
        .await
        .unwrap();
    let StartOutcome::Started {
        overlay: Some(overlay),
        session_id: first_id,
    } = first
    else {
        panic!("expected an injected start");
    };

    let session = h.coordinator.session().await.unwrap().unwrap();
    assert_eq!(session.phase, OverlayPhase::Armed);

    // The popup fires start again: same session, no second overlay.
    let second = h
        .launcher
        .start_capture(tab, OverlayOptions::default())
        .await
        .unwrap();
    let StartOutcome::Started {
        overlay: None,
        session_id: second_id,
    } = second
    else {
        panic!("expected a start without injection, got {second:?}");
    };
    assert_eq!(first_id, second_id);
    assert_eq!(overlay.phase().await.unwrap(), OverlayPhase::Armed);

    // The one overlay still finishes exactly one capture.
    overlay.pointer_down(50.0, 50.0).await.unwrap();
    overlay.pointer_moved(250.0, 200.0).await.unwrap();
    overlay.pointer_up().await.unwrap();

    timeout(EVENT_WAIT, events.recv())
        .await
        .expect("no capture notification")
        .unwrap();
    assert_eq!(h.source.capture_count(), 1);
    assert!(matches!(events.try_recv(), Err(TryRecvError::Empty)));
}

#[tokio::test]
async fn test_second_tab_is_busy_while_session_live() {
    let h = harness();

    let _overlay = start_injected(&h, TabId(1)).await;

    match h
        .launcher
        .start_capture(TabId(2), OverlayOptions::default())
        .await
        .unwrap()
    {
        StartOutcome::Busy { other_tab } => assert_eq!(other_tab, TabId(1)),
        other => panic!("expected Busy, got {other:?}"),
    }

    // Once the first session cancels, the second tab may start.
    let outcome = h.launcher.cancel_capture(TabId(1)).await.unwrap();
    assert_eq!(outcome, ForwardOutcome::Acked(OverlayAck::Cancelled));

    let started = h
        .launcher
        .start_capture(TabId(2), OverlayOptions::default())
        .await
        .unwrap();
    assert!(matches!(started, StartOutcome::Started { .. }));
}

#[tokio::test]
async fn test_second_capture_reuses_listener_and_overwrites_slot() {
    let h = harness();
    let tab = TabId(6);
    let mut events = h.coordinator.subscribe();

    let overlay = start_injected(&h, tab).await;
    overlay.pointer_down(0.0, 0.0).await.unwrap();
    overlay.pointer_moved(100.0, 100.0).await.unwrap();
    overlay.pointer_up().await.unwrap();
    timeout(EVENT_WAIT, events.recv())
        .await
        .expect("no first notification")
        .unwrap();

    // Second session on the same page: the listener survived teardown, so
    // no injection is needed and the original handle still drives input.
    let outcome = h
        .launcher
        .start_capture(tab, OverlayOptions::default())
        .await
        .unwrap();
    assert!(matches!(
        outcome,
        StartOutcome::Started { overlay: None, .. }
    ));

    overlay.pointer_down(10.0, 10.0).await.unwrap();
    overlay.pointer_moved(310.0, 210.0).await.unwrap();
    overlay.pointer_up().await.unwrap();

    let CaptureEvent::ScreenshotCaptured { artifact } = timeout(EVENT_WAIT, events.recv())
        .await
        .expect("no second notification")
        .unwrap();
    assert_eq!((artifact.width, artifact.height), (300, 200));

    // Last writer wins.
    let stored = h.slot.get().await.unwrap().unwrap();
    assert_eq!((stored.artifact.width, stored.artifact.height), (300, 200));
    assert_eq!(h.source.capture_count(), 2);
}

#[tokio::test]
async fn test_cancel_after_pointer_up_does_not_abort_capture() {
    let h = harness();
    let tab = TabId(7);
    let mut events = h.coordinator.subscribe();

    let overlay = start_injected(&h, tab).await;
    overlay.pointer_down(50.0, 50.0).await.unwrap();
    overlay.pointer_moved(250.0, 200.0).await.unwrap();
    overlay.pointer_up().await.unwrap();

    // The cancel lands after finalize: the overlay is already gone, but
    // the in-flight capture must still complete and store.
    let outcome = h.launcher.cancel_capture(tab).await.unwrap();
    assert_eq!(outcome, ForwardOutcome::Acked(OverlayAck::Cancelled));

    let CaptureEvent::ScreenshotCaptured { artifact } = timeout(EVENT_WAIT, events.recv())
        .await
        .expect("capture was aborted by the racing cancel")
        .unwrap();
    assert_eq!((artifact.width, artifact.height), (200, 150));

    let stored = h.slot.get().await.unwrap().unwrap();
    assert_eq!(stored.artifact, artifact);
}

struct FailingFrameSource;

#[async_trait]
impl FrameSource for FailingFrameSource {
    async fn capture_visible(&self, _tab: TabId) -> Result<FullFrame> {
        Err(SnipError::capture("surface refused to be captured"))
    }
}

#[tokio::test]
async fn test_capture_failure_leaves_slot_and_state_clean() {
    let slot = Arc::new(MemorySlotStore::new());
    let coordinator = Coordinator::spawn(Arc::new(FailingFrameSource), slot.clone(), fast_config());
    let launcher = Launcher::new(coordinator.clone(), fast_config());
    let tab = TabId(8);
    let mut events = coordinator.subscribe();

    let StartOutcome::Started {
        overlay: Some(overlay),
        ..
    } = launcher.start_capture(tab, OverlayOptions::default()).await.unwrap()
    else {
        panic!("expected an injected start");
    };

    overlay.pointer_down(50.0, 50.0).await.unwrap();
    overlay.pointer_moved(250.0, 200.0).await.unwrap();
    overlay.pointer_up().await.unwrap();

    // Give the detached pipeline time to hit the failure.
    sleep(Duration::from_millis(50)).await;

    assert_eq!(overlay.phase().await.unwrap(), OverlayPhase::Idle);
    assert!(coordinator.session().await.unwrap().is_none());
    assert!(slot.get().await.unwrap().is_none());
    assert!(matches!(events.try_recv(), Err(TryRecvError::Empty)));

    // A fresh attempt is immediately possible.
    let retry = launcher
        .start_capture(tab, OverlayOptions::default())
        .await
        .unwrap();
    assert!(matches!(
        retry,
        StartOutcome::Started { overlay: None, .. }
    ));
}

#[tokio::test]
async fn test_every_subscriber_sees_slot_filled_at_notification() {
    let h = harness();
    let tab = TabId(9);
    let mut first = h.coordinator.subscribe();
    let mut second = h.coordinator.subscribe();

    let overlay = start_injected(&h, tab).await;
    overlay.pointer_down(50.0, 50.0).await.unwrap();
    overlay.pointer_moved(250.0, 200.0).await.unwrap();
    overlay.pointer_up().await.unwrap();

    for events in [&mut first, &mut second] {
        let CaptureEvent::ScreenshotCaptured { artifact } = timeout(EVENT_WAIT, events.recv())
            .await
            .expect("no capture notification")
            .unwrap();
        let stored = h.slot.get().await.unwrap().expect("slot empty at notification");
        assert_eq!(stored.artifact, artifact);
    }
}

#[tokio::test]
async fn test_tab_close_mid_drag_tears_everything_down() {
    let h = harness();
    let tab = TabId(10);

    let overlay = start_injected(&h, tab).await;
    overlay.pointer_down(50.0, 50.0).await.unwrap();

    h.coordinator.tab_closed(tab).await.unwrap();

    assert!(h.coordinator.session().await.unwrap().is_none());
    assert!(overlay.phase().await.is_err(), "overlay task should be gone");
    assert_eq!(h.source.capture_count(), 0);

    // The next start on that tab injects a fresh overlay.
    let outcome = h
        .launcher
        .start_capture(tab, OverlayOptions::default())
        .await
        .unwrap();
    assert!(matches!(
        outcome,
        StartOutcome::Started {
            overlay: Some(_),
            ..
        }
    ));
}

#[tokio::test]
async fn test_clear_slot_is_silent() {
    let h = harness();
    let tab = TabId(11);
    let mut events = h.coordinator.subscribe();

    let overlay = start_injected(&h, tab).await;
    overlay.pointer_down(50.0, 50.0).await.unwrap();
    overlay.pointer_moved(250.0, 200.0).await.unwrap();
    overlay.pointer_up().await.unwrap();
    timeout(EVENT_WAIT, events.recv())
        .await
        .expect("no capture notification")
        .unwrap();

    h.coordinator.clear_slot().await.unwrap();

    assert!(h.slot.get().await.unwrap().is_none());
    assert!(matches!(events.try_recv(), Err(TryRecvError::Empty)));
}
