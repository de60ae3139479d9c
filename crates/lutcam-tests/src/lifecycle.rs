//! Session lifecycle: readiness, capture start, selection and teardown.

use crate::fakes::{Call, Harness};
use crossbeam_channel::{Receiver, Sender};
use lutcam_core::{LutCamError, LutImage, Result, SampleKind, SurfaceHandle};
use lutcam_pipeline::{IdentityLuts, LutProvider, Phase, SessionConfig, SessionEvent};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// LUT provider that reports the loading thread and waits to be let go.
struct GatedLuts {
    loading: Sender<Option<String>>,
    resume: Receiver<()>,
}

impl LutProvider for GatedLuts {
    fn load(&self, names: &[String]) -> Result<Vec<LutImage>> {
        let _ = self
            .loading
            .send(thread::current().name().map(str::to_string));
        let _ = self.resume.recv_timeout(Duration::from_secs(5));
        IdentityLuts.load(names)
    }
}

struct MissingLuts;

impl LutProvider for MissingLuts {
    fn load(&self, names: &[String]) -> Result<Vec<LutImage>> {
        Err(LutCamError::Config(format!("cannot open {}", names[0])))
    }
}

#[test]
fn first_layout_seeds_window_and_auto_selects() {
    let h = Harness::new(SampleKind::MultiLut);
    h.start_capture();
    assert_eq!(h.session.phase(), Phase::AwaitingReady);

    let window = h.session.on_layout_stable(1080, 120).unwrap();
    h.session.sync().unwrap();

    assert_eq!(window.start_index, 0);
    assert_eq!(window.pixel_offset, 0);
    assert_eq!(h.session.selection(), Some(0));
    assert_eq!(h.session.phase(), Phase::Active);

    let calls = h.calls();
    assert_eq!(
        &calls[..4],
        &[
            Call::Init(8),
            Call::Surface(7, 1080, 2340),
            Call::Luts(9),
            Call::Window(window),
        ]
    );
    assert_eq!(calls[4], Call::Selection(0));

    let events = h.events();
    assert!(events.contains(&SessionEvent::AutoSelected(1)));
    assert!(events.contains(&SessionEvent::Active));
}

#[test]
fn user_selection_maps_to_zero_based_index() {
    let h = Harness::new(SampleKind::MultiLut);
    h.start_capture();
    h.session.on_layout_stable(1080, 120).unwrap();
    h.session.sync().unwrap();

    let mark = h.mark();
    assert_eq!(h.session.on_select(1).unwrap(), Some(0));
    assert_eq!(h.session.on_select(0).unwrap(), None);
    assert_eq!(h.session.on_select(4).unwrap(), Some(3));
    h.session.sync().unwrap();

    assert_eq!(
        h.calls_since(mark),
        vec![Call::Selection(0), Call::Selection(3)]
    );
    assert_eq!(h.session.selection(), Some(3));
}

#[test]
fn explicit_selection_suppresses_auto_select() {
    let h = Harness::new(SampleKind::MultiLut);
    h.start_capture();
    h.session.on_select(5).unwrap();
    h.session.on_layout_stable(1080, 120).unwrap();
    h.session.sync().unwrap();

    let selections: Vec<_> = h
        .calls()
        .into_iter()
        .filter(|c| matches!(c, Call::Selection(_)))
        .collect();
    assert_eq!(selections, vec![Call::Selection(4)]);
    assert!(!h
        .events()
        .iter()
        .any(|e| matches!(e, SessionEvent::AutoSelected(_))));
}

#[test]
fn capture_starts_once_whatever_the_order() {
    let h = Harness::new(SampleKind::CameraYuv);
    h.session.on_permission_result(true).unwrap();
    h.session
        .on_surface_available(SurfaceHandle(1), 720, 1280)
        .unwrap();
    h.session.sync().unwrap();
    h.session
        .on_surface_available(SurfaceHandle(2), 720, 1280)
        .unwrap();
    h.session.sync().unwrap();
    h.session.sync().unwrap();

    assert_eq!(h.source.starts(), 1);
    assert!(h.session.readiness().surface_ready);
    assert_eq!(h.session.phase(), Phase::Active);
    assert_eq!(
        h.events()
            .iter()
            .filter(|e| **e == SessionEvent::CaptureStarted)
            .count(),
        1
    );
}

#[test]
fn preview_negotiation_requires_new_layout() {
    let h = Harness::new(SampleKind::MultiLut);
    h.session.on_layout_stable(350, 100).unwrap();
    h.session.on_scroll(250).unwrap();
    h.start_capture();

    // The source reported its size after the strip was measured
    assert!(!h.session.readiness().layout_ready);
    assert_eq!(h.session.phase(), Phase::AwaitingReady);
    assert!(matches!(
        h.session.on_scroll(300),
        Err(LutCamError::InvalidLayout(_))
    ));
    let mark = h.mark();
    h.deliver(1);
    assert_eq!(h.calls_since(mark), vec![Call::Released(1)]);

    // Re-measured layout keeps the scroll position
    let window = h.session.on_layout_stable(350, 100).unwrap();
    assert_eq!((window.start_index, window.pixel_offset), (2, 50));
    assert_eq!(h.session.phase(), Phase::Active);
    h.deliver(2);
    assert!(h.calls().contains(&Call::Render(false)));
}

#[test]
fn surface_call_returns_before_luts_load() {
    let (loading_tx, loading_rx) = crossbeam_channel::unbounded();
    let (resume_tx, resume_rx) = crossbeam_channel::unbounded();
    let h = Harness::with_luts(
        SampleKind::MultiLut,
        Arc::new(GatedLuts {
            loading: loading_tx,
            resume: resume_rx,
        }),
    );

    h.session
        .on_surface_available(SurfaceHandle(3), 1080, 2340)
        .unwrap();
    let thread_name = loading_rx
        .recv_timeout(Duration::from_secs(5))
        .expect("LUTs never loaded");
    assert_eq!(thread_name.as_deref(), Some("lutcam-delivery"));
    assert!(!h.session.readiness().surface_ready);
    assert!(!h
        .calls()
        .iter()
        .any(|c| matches!(c, Call::Surface(..) | Call::Luts(_))));

    resume_tx.send(()).unwrap();
    h.session.sync().unwrap();
    assert!(h
        .calls()
        .ends_with(&[Call::Surface(3, 1080, 2340), Call::Luts(9)]));
    assert!(h.session.readiness().surface_ready);
}

#[test]
fn lut_load_failure_fails_session() {
    let h = Harness::with_luts(SampleKind::MultiLut, Arc::new(MissingLuts));
    h.session
        .on_surface_available(SurfaceHandle(3), 1080, 2340)
        .unwrap();
    h.session.sync().unwrap();

    assert_eq!(h.session.phase(), Phase::Failed);
    assert!(!h.session.readiness().surface_ready);
    assert!(h
        .events()
        .iter()
        .any(|e| matches!(e, SessionEvent::LutLoadFailed(_))));
    assert!(!h.calls().iter().any(|c| matches!(c, Call::Surface(..))));
}

#[test]
fn denied_permission_never_activates() {
    let h = Harness::new(SampleKind::CameraYuv);
    h.session
        .on_surface_available(SurfaceHandle(1), 720, 1280)
        .unwrap();
    assert!(matches!(
        h.session.on_permission_result(false),
        Err(LutCamError::PermissionDenied)
    ));
    h.session.sync().unwrap();

    assert_eq!(h.source.starts(), 0);
    assert_eq!(h.session.phase(), Phase::AwaitingReady);
    assert!(h.events().contains(&SessionEvent::PermissionDenied));
}

#[test]
fn stop_discards_state_and_closes_renderer() {
    let h = Harness::new(SampleKind::MultiLut);
    h.start_capture();
    h.session.on_layout_stable(1080, 120).unwrap();
    h.deliver(1);

    let stats = h.session.stop().unwrap();
    assert_eq!(stats.forwarded, 1);
    assert!(h.session.stop().is_none());

    assert_eq!(h.session.phase(), Phase::Stopped);
    assert_eq!(h.session.window(), None);
    assert_eq!(h.session.selection(), None);
    assert!(!h.session.readiness().surface_ready);
    assert_eq!(h.source.stops(), 1);
    assert_eq!(h.calls().last(), Some(&Call::Deinit));
    assert_eq!(h.events().last(), Some(&SessionEvent::Stopped));
}

#[test]
fn invalid_config_is_rejected() {
    let config = SessionConfig {
        lut_assets: Vec::new(),
        ..SessionConfig::default()
    };
    let err = config.validate().unwrap_err();
    assert!(matches!(err, LutCamError::Config(_)));
}

#[tokio::test]
async fn wait_active_resolves_after_readiness() {
    let h = Harness::new(SampleKind::Lut);
    assert!(tokio::time::timeout(Duration::from_millis(50), h.session.wait_active())
        .await
        .is_err());

    h.start_capture();
    tokio::time::timeout(Duration::from_secs(5), h.session.wait_active())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(h.session.phase(), Phase::Active);
}
