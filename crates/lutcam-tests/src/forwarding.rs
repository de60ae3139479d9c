//! Frame forwarding through a full session.

use crate::fakes::{Call, FrameBlock, Harness, RecordingRenderer, PREVIEW};
use lutcam_core::SampleKind;
use lutcam_pipeline::{compute_window, Phase, SessionEvent};
use std::thread;
use std::time::Duration;

#[test]
fn frame_before_layout_is_released_without_renderer_calls() {
    let h = Harness::new(SampleKind::MultiLut);
    h.start_capture();
    assert!(!h.session.readiness().layout_ready);

    let mark = h.mark();
    h.deliver(1);

    assert_eq!(h.calls_since(mark), vec![Call::Released(1)]);
    assert_eq!(h.source.released(), 1);
}

#[test]
fn open_gate_updates_draws_then_releases() {
    let h = Harness::new(SampleKind::MultiLut);
    h.start_capture();
    let window = h.session.on_layout_stable(350, 100).unwrap();
    h.session.sync().unwrap();

    let mark = h.mark();
    h.deliver(1);
    h.deliver(2);

    assert_eq!(
        h.calls_since(mark),
        vec![
            Call::Frame(PREVIEW.width, PREVIEW.height),
            Call::Render(false),
            Call::Released(1),
            Call::Frame(PREVIEW.width, PREVIEW.height),
            Call::Render(false),
            Call::Released(2),
        ]
    );
    assert_eq!(window, compute_window(0, 350, 100).unwrap());
    assert_eq!(window.draw_count, 5);
}

#[test]
fn scroll_updates_reach_renderer_between_frames() {
    let h = Harness::new(SampleKind::MultiLut);
    h.start_capture();
    h.session.on_layout_stable(350, 100).unwrap();
    h.deliver(1);

    let mark = h.mark();
    let window = h.session.on_scroll(250).unwrap();
    assert_eq!((window.start_index, window.pixel_offset), (2, 50));
    h.deliver(2);

    assert_eq!(
        h.calls_since(mark),
        vec![
            Call::Window(window),
            Call::Frame(PREVIEW.width, PREVIEW.height),
            Call::Render(false),
            Call::Released(2),
        ]
    );
}

#[test]
fn empty_tick_does_nothing() {
    let h = Harness::new(SampleKind::Histogram);
    h.start_capture();
    let mark = h.mark();

    assert!(h.source.push_empty_tick());
    h.session.sync().unwrap();

    assert!(h.calls_since(mark).is_empty());
    assert_eq!(h.source.released(), 0);
}

#[test]
fn histogram_forwards_without_strip() {
    let h = Harness::new(SampleKind::Histogram);
    h.start_capture();
    assert_eq!(h.session.phase(), Phase::Active);
    h.deliver(1);

    let calls = h.calls();
    assert_eq!(calls[0], Call::Init(9));
    assert!(!calls.iter().any(|c| matches!(c, Call::Luts(_) | Call::Window(_))));
    assert!(calls.ends_with(&[
        Call::Frame(PREVIEW.width, PREVIEW.height),
        Call::Render(false),
        Call::Released(1),
    ]));
}

#[test]
fn renderer_failure_fails_session_and_releases_frame() {
    let h = Harness::with_renderer(SampleKind::CameraYuv, |log| {
        RecordingRenderer::new(log).failing_render()
    });
    h.start_capture();
    h.deliver(1);

    assert_eq!(h.session.phase(), Phase::Failed);
    assert!(h
        .events()
        .iter()
        .any(|e| matches!(e, SessionEvent::RendererFailed(_))));

    let mark = h.mark();
    h.deliver(2);
    assert_eq!(h.calls_since(mark), vec![Call::Released(2)]);
    assert_eq!(h.source.released(), 2);
}

#[test]
fn teardown_during_frame_update_skips_draw() {
    let (entered_tx, entered_rx) = crossbeam_channel::bounded(1);
    let (resume_tx, resume_rx) = crossbeam_channel::bounded(1);
    let h = Harness::with_renderer(SampleKind::CameraYuv, move |log| {
        RecordingRenderer::new(log).blocking(FrameBlock {
            entered: entered_tx,
            resume: resume_rx,
        })
    });
    h.start_capture();

    assert!(h.source.push_frame(1));
    entered_rx
        .recv_timeout(Duration::from_secs(5))
        .expect("frame update never started");

    let stats = thread::scope(|scope| {
        let stopper = scope.spawn(|| h.session.stop());
        while !h.session.is_stopping() {
            thread::sleep(Duration::from_millis(1));
        }
        resume_tx.send(()).unwrap();
        stopper.join().unwrap()
    })
    .unwrap();

    assert_eq!(stats.interrupted, 1);
    assert_eq!(stats.forwarded, 0);
    let calls = h.calls();
    assert!(!calls.contains(&Call::Render(false)));
    assert_eq!(h.source.released(), 1);
    assert_eq!(calls.last(), Some(&Call::Deinit));

    // A late frame after teardown only gets released
    assert!(!h.source.push_frame(2));
    assert_eq!(h.source.released(), 2);
    let renderer_calls = calls.iter().filter(|c| c.is_renderer()).count();
    assert_eq!(
        h.calls().iter().filter(|c| c.is_renderer()).count(),
        renderer_calls
    );
    assert_eq!(h.source.stops(), 1);
}

#[test]
fn selection_not_delayed_by_frame_backlog() {
    let (entered_tx, entered_rx) = crossbeam_channel::unbounded();
    let (resume_tx, resume_rx) = crossbeam_channel::unbounded();
    let h = Harness::with_renderer(SampleKind::Lut, move |log| {
        RecordingRenderer::new(log).blocking(FrameBlock {
            entered: entered_tx,
            resume: resume_rx,
        })
    });
    h.start_capture();
    let mark = h.mark();

    assert!(h.source.push_frame(1));
    entered_rx
        .recv_timeout(Duration::from_secs(5))
        .expect("frame update never started");

    // The camera keeps producing while the renderer is busy
    for id in 2..=50 {
        assert!(h.source.push_frame(id));
    }
    assert_eq!(h.session.on_select(2).unwrap(), Some(1));

    resume_tx.send(()).unwrap();
    resume_tx.send(()).unwrap();
    h.session.sync().unwrap();

    let renderer_calls: Vec<_> = h
        .calls_since(mark)
        .into_iter()
        .filter(Call::is_renderer)
        .collect();
    assert_eq!(
        renderer_calls,
        vec![
            Call::Frame(PREVIEW.width, PREVIEW.height),
            Call::Render(false),
            Call::Frame(PREVIEW.width, PREVIEW.height),
            Call::Render(false),
            Call::Selection(1),
        ]
    );
    assert_eq!(h.source.released(), 50);
    assert!(h.calls().contains(&Call::Released(50)));
    assert!(entered_rx.try_recv().is_ok());
    assert!(entered_rx.try_recv().is_err());
}
