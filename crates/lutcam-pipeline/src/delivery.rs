//! The delivery context.
//!
//! One worker thread owns the renderer and the frame source. Frame
//! notifications from the source and UI updates marshalled by
//! [`CaptureSession`](crate::CaptureSession) arrive on one queue, so every
//! renderer call happens here, one at a time, in arrival order.

use crate::forwarder::{renderer_failure, ForwardContext, ForwarderStats, FrameForwarder};
use crate::readiness::Condition;
use crate::renderer::{LoopGuard, Renderer};
use crate::scroll_window::ScrollWindow;
use crate::source::{FrameNotifier, FrameSource, FrameWake, LutProvider};
use crate::state::{SessionEvent, Shared};
use crossbeam_channel::{Receiver, Sender};
use lutcam_core::{LutCamError, PreviewSize, Result, SampleKind, SurfaceHandle};
use std::path::PathBuf;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, info, trace, warn};

pub(crate) const THREAD_NAME: &str = "lutcam-delivery";

/// Work items for the delivery context.
pub(crate) enum Message {
    /// The source has a new frame to acquire. At most one is queued.
    FrameAvailable,
    PreviewSize(PreviewSize),
    /// The output surface exists. LUT images are loaded here, off the UI
    /// context, and uploaded together with the surface.
    Surface {
        handle: SurfaceHandle,
        width: u32,
        height: u32,
    },
    Window(ScrollWindow),
    /// 0-based renderer index.
    Selection(u32),
    StartCapture,
    /// Acknowledged once everything queued before it was handled.
    Barrier(Sender<()>),
    Shutdown,
}

pub(crate) struct DeliveryWorker {
    shared: Arc<Shared>,
    renderer: LoopGuard<Box<dyn Renderer>>,
    source: Box<dyn FrameSource>,
    luts: Arc<dyn LutProvider>,
    lut_assets: Vec<String>,
    forwarder: FrameForwarder,
    wake: Arc<FrameWake>,
    rx: Receiver<Message>,
    tx: Sender<Message>,
    asset_root: PathBuf,
    sample: SampleKind,
    capturing: bool,
}

impl DeliveryWorker {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        shared: Arc<Shared>,
        renderer: Box<dyn Renderer>,
        source: Box<dyn FrameSource>,
        luts: Arc<dyn LutProvider>,
        lut_assets: Vec<String>,
        rx: Receiver<Message>,
        tx: Sender<Message>,
        asset_root: PathBuf,
        sample: SampleKind,
    ) -> Self {
        let forwarder = FrameForwarder::new(shared.strip);
        Self {
            shared,
            renderer: LoopGuard::new(renderer),
            source,
            luts,
            lut_assets,
            forwarder,
            wake: Arc::new(FrameWake::default()),
            rx,
            tx,
            asset_root,
            sample,
            capturing: false,
        }
    }

    pub fn spawn(self) -> Result<JoinHandle<ForwarderStats>> {
        thread::Builder::new()
            .name(THREAD_NAME.to_string())
            .spawn(move || self.run())
            .map_err(LutCamError::Io)
    }

    fn run(mut self) -> ForwarderStats {
        let initialized = match self.renderer.init(&self.asset_root, self.sample) {
            Ok(()) => {
                info!(sample = %self.sample, ordinal = self.sample.ordinal(), "Renderer initialized");
                true
            }
            Err(e) => {
                self.shared
                    .fail(renderer_failure(e), SessionEvent::RendererFailed);
                false
            }
        };
        self.shared.mark_started();

        while let Ok(message) = self.rx.recv() {
            match message {
                Message::FrameAvailable => self.deliver_frame(),
                Message::PreviewSize(size) => self.shared.on_preview_size(size),
                Message::Surface {
                    handle,
                    width,
                    height,
                } => self.attach_surface(handle, width, height),
                Message::Window(window) => self.push_window(window),
                Message::Selection(index) => self.push_selection(index),
                Message::StartCapture => self.start_capture(),
                Message::Barrier(ack) => {
                    let _ = ack.send(());
                }
                Message::Shutdown => break,
            }
        }

        self.wake.close();
        if self.capturing {
            self.source.stop();
            self.capturing = false;
            debug!("Frame source stopped");
        }
        if initialized {
            self.renderer.deinit();
        }
        let stats = self.forwarder.stats();
        info!(
            forwarded = stats.forwarded,
            dropped = stats.dropped,
            interrupted = stats.interrupted,
            "Delivery context finished"
        );
        stats
    }

    fn deliver_frame(&mut self) {
        self.wake.take();
        let frame = match self.source.acquire_latest() {
            Ok(Some(frame)) => frame,
            Ok(None) => {
                trace!("Empty delivery tick");
                return;
            }
            Err(e) => {
                warn!(error = %e, "Frame acquisition failed");
                return;
            }
        };

        let snapshot = self.shared.forward_snapshot();
        let ctx = ForwardContext {
            may_process: snapshot.may_process,
            ended: snapshot.ended,
            window: snapshot.window,
            halt: &self.shared.halt,
        };
        if let Err(e) = self.forwarder.on_frame(frame, &ctx, &mut self.renderer) {
            self.shared
                .fail(renderer_failure(e), SessionEvent::RendererFailed);
        }
    }

    fn attach_surface(&mut self, handle: SurfaceHandle, width: u32, height: u32) {
        if self.shared.forward_snapshot().ended {
            return;
        }
        let luts = if self.sample.uses_luts() {
            match self.luts.load(&self.lut_assets) {
                Ok(luts) => {
                    if luts.is_empty() {
                        warn!(sample = %self.sample, "LUT provider returned no images");
                    }
                    luts
                }
                Err(e) => {
                    self.shared.fail(e, SessionEvent::LutLoadFailed);
                    return;
                }
            }
        } else {
            Vec::new()
        };
        let luts = &luts;
        let result = (|| -> Result<bool> {
            {
                let Some(_permit) = self.shared.halt.permit() else {
                    return Ok(false);
                };
                self.renderer.set_surface(handle, width, height)?;
            }
            if !luts.is_empty() {
                let Some(_permit) = self.shared.halt.permit() else {
                    return Ok(false);
                };
                self.renderer.prepare_luts(luts)?;
                debug!(count = luts.len(), "LUTs prepared");
            }
            Ok(true)
        })();

        match result {
            Ok(true) => {
                info!(surface = handle.0, width, height, "Surface attached");
                if let Err(e) = self.shared.set_condition(Condition::Surface, true) {
                    debug!(error = %e, "Surface ready after session end");
                }
            }
            Ok(false) => {}
            Err(e) => self
                .shared
                .fail(renderer_failure(e), SessionEvent::RendererFailed),
        }
    }

    fn push_window(&mut self, window: ScrollWindow) {
        if self.shared.forward_snapshot().ended {
            return;
        }
        if let Err(e) = self
            .forwarder
            .apply_window(window, &self.shared.halt, &mut self.renderer)
        {
            self.shared
                .fail(renderer_failure(e), SessionEvent::RendererFailed);
        }
    }

    fn push_selection(&mut self, index: u32) {
        if self.shared.forward_snapshot().ended {
            return;
        }
        let result = match self.shared.halt.permit() {
            Some(_permit) => self.renderer.update_selection(index),
            None => return,
        };
        match result {
            Ok(()) => debug!(index, "Selection applied"),
            Err(e) => self
                .shared
                .fail(renderer_failure(e), SessionEvent::RendererFailed),
        }
    }

    fn start_capture(&mut self) {
        if self.capturing || self.shared.halt.is_halted() || self.shared.forward_snapshot().ended {
            return;
        }
        let notifier = FrameNotifier::new(self.tx.clone(), Arc::clone(&self.wake));
        match self.source.start(notifier) {
            Ok(()) => {
                self.capturing = true;
                info!("Frame source started");
                self.shared.on_capture_started();
            }
            Err(e) => self.shared.fail(e, SessionEvent::CaptureFailed),
        }
    }
}
