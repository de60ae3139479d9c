//! Recording renderer and scripted frame source.

use crossbeam_channel::{Receiver, Sender};
use lutcam_core::{
    CameraFrame, ChromaLayout, FrameId, LutCamError, LutImage, Orientation, PreviewSize, Result,
    SampleKind, SurfaceHandle,
};
use lutcam_pipeline::{
    CaptureSession, FrameNotifier, FrameSource, FrameUpdate, IdentityLuts, LutProvider, Renderer,
    ScrollWindow, SessionConfig, SessionEvent,
};
use parking_lot::Mutex;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Everything that happened to the renderer and to frames, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Init(i32),
    Deinit,
    Surface(u64, u32, u32),
    Luts(usize),
    Frame(u32, u32),
    Window(ScrollWindow),
    Selection(u32),
    Render(bool),
    Released(u64),
}

impl Call {
    /// Whether this entry is a call into the renderer.
    pub fn is_renderer(&self) -> bool {
        !matches!(self, Call::Released(_))
    }
}

pub type CallLog = Arc<Mutex<Vec<Call>>>;

/// Makes `update_frame` wait until the test lets it continue.
pub struct FrameBlock {
    pub entered: Sender<()>,
    pub resume: Receiver<()>,
}

pub struct RecordingRenderer {
    log: CallLog,
    block: Option<FrameBlock>,
    fail_render: bool,
}

impl RecordingRenderer {
    pub fn new(log: CallLog) -> Self {
        Self {
            log,
            block: None,
            fail_render: false,
        }
    }

    pub fn blocking(mut self, block: FrameBlock) -> Self {
        self.block = Some(block);
        self
    }

    pub fn failing_render(mut self) -> Self {
        self.fail_render = true;
        self
    }
}

impl Renderer for RecordingRenderer {
    fn init(&mut self, _asset_root: &Path, sample: SampleKind) -> Result<()> {
        self.log.lock().push(Call::Init(sample.ordinal()));
        Ok(())
    }

    fn deinit(&mut self) {
        self.log.lock().push(Call::Deinit);
    }

    fn set_surface(&mut self, surface: SurfaceHandle, width: u32, height: u32) -> Result<()> {
        self.log.lock().push(Call::Surface(surface.0, width, height));
        Ok(())
    }

    fn prepare_luts(&mut self, luts: &[LutImage]) -> Result<()> {
        self.log.lock().push(Call::Luts(luts.len()));
        Ok(())
    }

    fn update_frame(&mut self, frame: &FrameUpdate<'_>) -> Result<()> {
        self.log.lock().push(Call::Frame(frame.width, frame.height));
        if let Some(block) = &self.block {
            let _ = block.entered.send(());
            let _ = block.resume.recv();
        }
        Ok(())
    }

    fn update_lut_window(&mut self, window: &ScrollWindow) -> Result<()> {
        self.log.lock().push(Call::Window(*window));
        Ok(())
    }

    fn update_selection(&mut self, index: u32) -> Result<()> {
        self.log.lock().push(Call::Selection(index));
        Ok(())
    }

    fn render(&mut self, looping: bool) -> Result<()> {
        if self.fail_render {
            return Err(LutCamError::Renderer("swapchain lost".into()));
        }
        self.log.lock().push(Call::Render(looping));
        Ok(())
    }
}

#[derive(Default)]
struct SourceState {
    notifier: Option<FrameNotifier>,
    pending: Option<CameraFrame>,
    starts: usize,
    stops: usize,
}

/// Frame source the test feeds by hand through a [`SourceHandle`].
pub struct ScriptedSource {
    state: Arc<Mutex<SourceState>>,
    preview: Option<PreviewSize>,
}

/// Test side of a [`ScriptedSource`].
#[derive(Clone)]
pub struct SourceHandle {
    state: Arc<Mutex<SourceState>>,
    log: CallLog,
    frame_size: (u32, u32),
    released: Arc<AtomicUsize>,
}

impl ScriptedSource {
    pub fn new(log: CallLog, preview: Option<PreviewSize>) -> (Self, SourceHandle) {
        let state = Arc::new(Mutex::new(SourceState::default()));
        let frame_size = preview.map_or((64, 48), |p| (p.width, p.height));
        let handle = SourceHandle {
            state: Arc::clone(&state),
            log,
            frame_size,
            released: Arc::new(AtomicUsize::new(0)),
        };
        (Self { state, preview }, handle)
    }
}

impl FrameSource for ScriptedSource {
    fn start(&mut self, notifier: FrameNotifier) -> Result<()> {
        if let Some(size) = self.preview {
            notifier.preview_size(size);
        }
        let mut state = self.state.lock();
        state.starts += 1;
        state.notifier = Some(notifier);
        Ok(())
    }

    fn acquire_latest(&mut self) -> Result<Option<CameraFrame>> {
        Ok(self.state.lock().pending.take())
    }

    fn stop(&mut self) {
        let mut state = self.state.lock();
        state.stops += 1;
        state.notifier = None;
        state.pending = None;
    }
}

impl SourceHandle {
    /// Hand a new frame to the pipeline. Returns whether the source was
    /// running to notify anyone; a stopped source releases the frame.
    pub fn push_frame(&self, id: u64) -> bool {
        let log = Arc::clone(&self.log);
        let released = Arc::clone(&self.released);
        let (width, height) = self.frame_size;
        let frame = CameraFrame::test_pattern(
            FrameId(id),
            width,
            height,
            ChromaLayout::Planar,
            Orientation::Deg90,
        )
        .with_release(move |id| {
            released.fetch_add(1, Ordering::SeqCst);
            log.lock().push(Call::Released(id.0));
        });

        let mut state = self.state.lock();
        if state.notifier.is_none() {
            drop(state);
            frame.release();
            return false;
        }
        // A frame nobody acquired yet is released when replaced
        state.pending = Some(frame);
        state
            .notifier
            .as_ref()
            .is_some_and(|notifier| notifier.frame_available())
    }

    /// Notify without a frame, like an image reader waking up too early.
    pub fn push_empty_tick(&self) -> bool {
        let state = self.state.lock();
        match &state.notifier {
            Some(notifier) => notifier.frame_available(),
            None => false,
        }
    }

    pub fn released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }

    pub fn starts(&self) -> usize {
        self.state.lock().starts
    }

    pub fn stops(&self) -> usize {
        self.state.lock().stops
    }
}

/// A session wired to the fakes.
pub struct Harness {
    pub session: CaptureSession,
    pub events: Receiver<SessionEvent>,
    pub log: CallLog,
    pub source: SourceHandle,
}

pub const PREVIEW: PreviewSize = PreviewSize::new(64, 48);

impl Harness {
    pub fn new(sample: SampleKind) -> Self {
        Self::with_renderer(sample, RecordingRenderer::new)
    }

    pub fn with_renderer(
        sample: SampleKind,
        renderer: impl FnOnce(CallLog) -> RecordingRenderer,
    ) -> Self {
        Self::build(sample, renderer, Arc::new(IdentityLuts))
    }

    pub fn with_luts(sample: SampleKind, luts: Arc<dyn LutProvider>) -> Self {
        Self::build(sample, RecordingRenderer::new, luts)
    }

    fn build(
        sample: SampleKind,
        renderer: impl FnOnce(CallLog) -> RecordingRenderer,
        luts: Arc<dyn LutProvider>,
    ) -> Self {
        let log: CallLog = Arc::new(Mutex::new(Vec::new()));
        let (source, handle) = ScriptedSource::new(Arc::clone(&log), Some(PREVIEW));
        let config = SessionConfig {
            sample,
            ..SessionConfig::default()
        };
        let (session, events) = CaptureSession::new(
            &config,
            Box::new(renderer(Arc::clone(&log))),
            Box::new(source),
            luts,
        )
        .unwrap();
        Self {
            session,
            events,
            log,
            source: handle,
        }
    }

    /// Surface, then permission, and wait until capture started and the
    /// preview size was handled.
    pub fn start_capture(&self) {
        self.session
            .on_surface_available(SurfaceHandle(7), 1080, 2340)
            .unwrap();
        self.session.sync().unwrap();
        self.session.on_permission_result(true).unwrap();
        self.session.sync().unwrap();
        self.session.sync().unwrap();
    }

    /// Feed one frame and wait until the pipeline handled it.
    pub fn deliver(&self, id: u64) {
        assert!(self.source.push_frame(id));
        self.session.sync().unwrap();
    }

    pub fn calls(&self) -> Vec<Call> {
        self.log.lock().clone()
    }

    /// Calls logged after the first `skip` entries.
    pub fn calls_since(&self, skip: usize) -> Vec<Call> {
        self.log.lock()[skip..].to_vec()
    }

    pub fn mark(&self) -> usize {
        self.log.lock().len()
    }

    pub fn events(&self) -> Vec<SessionEvent> {
        self.events.try_iter().collect()
    }
}
