//! One camera capture session.
//!
//! [`CaptureSession`] is the UI-facing side of the pipeline. Its gesture
//! handlers only touch session state and queue renderer work; the renderer
//! itself is driven from the delivery context.

use crate::config::SessionConfig;
use crate::delivery::{DeliveryWorker, Message};
use crate::forwarder::ForwarderStats;
use crate::readiness::{Condition, ReadinessState};
use crate::renderer::Renderer;
use crate::scroll_window::ScrollWindow;
use crate::selection::to_renderer_index;
use crate::source::{FrameSource, LutProvider};
use crate::state::{Phase, SessionEvent, Shared};
use crossbeam_channel::Receiver;
use lutcam_core::{LutCamError, PreviewSize, Result, SampleKind, SurfaceHandle};
use parking_lot::Mutex;
use std::sync::Arc;
use std::thread::JoinHandle;
use tokio::sync::watch;
use tracing::{debug, error, info};

pub struct CaptureSession {
    shared: Arc<Shared>,
    sample: SampleKind,
    phase_rx: watch::Receiver<Phase>,
    worker: Mutex<Option<JoinHandle<ForwarderStats>>>,
}

impl CaptureSession {
    /// Validate `config`, start the delivery context and initialize the
    /// renderer there. Returns the session and its event stream.
    pub fn new(
        config: &SessionConfig,
        renderer: Box<dyn Renderer>,
        source: Box<dyn FrameSource>,
        luts: Arc<dyn LutProvider>,
    ) -> Result<(Self, Receiver<SessionEvent>)> {
        config.validate()?;

        let (tx, rx) = crossbeam_channel::unbounded();
        let (events_tx, events_rx) = crossbeam_channel::unbounded();
        let (phase_tx, phase_rx) = watch::channel(Phase::Unstarted);
        let strip = config.sample.uses_lut_strip();
        let shared = Arc::new(Shared::new(strip, tx.clone(), events_tx, phase_tx));

        let worker = DeliveryWorker::new(
            Arc::clone(&shared),
            renderer,
            source,
            luts,
            config.lut_assets.clone(),
            rx,
            tx,
            config.asset_root.clone(),
            config.sample,
        )
        .spawn()?;

        info!(
            sample = %config.sample,
            luts = config.lut_assets.len(),
            strip,
            "Capture session created"
        );

        let session = Self {
            shared,
            sample: config.sample,
            phase_rx,
            worker: Mutex::new(Some(worker)),
        };
        Ok((session, events_rx))
    }

    pub fn sample(&self) -> SampleKind {
        self.sample
    }

    pub fn phase(&self) -> Phase {
        self.shared.phase()
    }

    pub fn readiness(&self) -> ReadinessState {
        self.shared.readiness()
    }

    /// Current strip window, once the layout was measured.
    pub fn window(&self) -> Option<ScrollWindow> {
        self.shared.state.lock().mapper.window()
    }

    /// Renderer LUT index currently selected.
    pub fn selection(&self) -> Option<u32> {
        self.shared.state.lock().selection.current()
    }

    pub fn preview_size(&self) -> Option<PreviewSize> {
        self.shared.state.lock().preview_size
    }

    /// Outcome of the camera permission request.
    pub fn on_permission_result(&self, granted: bool) -> Result<()> {
        info!(granted, "Camera permission result");
        self.shared.set_condition(Condition::Permission, granted)?;
        if granted {
            Ok(())
        } else {
            self.shared.emit(SessionEvent::PermissionDenied);
            Err(LutCamError::PermissionDenied)
        }
    }

    /// The output surface exists. Returns right away: the delivery context
    /// loads the LUT images and hands them to the renderer together with the
    /// surface, and the surface counts as ready once the renderer accepted
    /// both.
    pub fn on_surface_available(&self, surface: SurfaceHandle, width: u32, height: u32) -> Result<()> {
        self.shared.state.lock().ensure_running()?;
        if width == 0 || height == 0 {
            return Err(LutCamError::InvalidParameter(format!(
                "surface {}x{} is empty",
                width, height
            )));
        }
        debug!(surface = surface.0, width, height, "Surface available");
        self.shared.post(Message::Surface {
            handle: surface,
            width,
            height,
        })
    }

    /// The LUT strip has been laid out. The first call seeds the renderer's
    /// window at scroll offset 0 and selects the first LUT if nothing is
    /// selected yet.
    pub fn on_layout_stable(&self, container_width: i32, item_width: i32) -> Result<ScrollWindow> {
        self.require_strip()?;
        let mut state = self.shared.state.lock();
        state.ensure_running()?;
        let first = !state.mapper.is_seeded();
        let window = state.mapper.on_layout_stable(container_width, item_width)?;
        self.shared.post(Message::Window(window))?;
        if first {
            info!(
                start = window.start_index,
                draw_count = window.draw_count,
                "LUT window seeded"
            );
        }

        if let Some(raw_id) = state.selection.auto_select() {
            if let Some(index) = to_renderer_index(raw_id) {
                info!(raw_id, index, "Auto-selected first LUT");
                self.shared.post(Message::Selection(index))?;
                self.shared.emit(SessionEvent::AutoSelected(raw_id));
            }
        }

        self.shared
            .apply_condition(&mut state, Condition::Layout, true)?;
        Ok(window)
    }

    /// The LUT strip scrolled. Requires a measured layout.
    pub fn on_scroll(&self, offset: i32) -> Result<ScrollWindow> {
        self.require_strip()?;
        let mut state = self.shared.state.lock();
        state.ensure_running()?;
        let window = state.mapper.on_scroll(offset)?;
        self.shared.post(Message::Window(window))?;
        Ok(window)
    }

    /// The user picked a LUT. `raw_id` is the 1-based picker identifier;
    /// 0 means nothing is selected and is not forwarded.
    pub fn on_select(&self, raw_id: i32) -> Result<Option<u32>> {
        if !self.sample.uses_luts() {
            return Err(LutCamError::InvalidParameter(format!(
                "sample '{}' has no LUT to select",
                self.sample
            )));
        }
        let mut state = self.shared.state.lock();
        state.ensure_running()?;
        let index = state.selection.select(raw_id);
        if let Some(index) = index {
            self.shared.post(Message::Selection(index))?;
        }
        Ok(index)
    }

    /// Resolves once the session is active, or fails with `SessionStopped`
    /// if it ends first.
    pub async fn wait_active(&self) -> Result<()> {
        let mut rx = self.phase_rx.clone();
        let phase = *rx
            .wait_for(|phase| *phase == Phase::Active || phase.is_terminal())
            .await
            .map_err(|_| LutCamError::SessionStopped)?;
        if phase == Phase::Active {
            Ok(())
        } else {
            Err(LutCamError::SessionStopped)
        }
    }

    /// Teardown has begun; no renderer call starts from here on.
    pub fn is_stopping(&self) -> bool {
        self.shared.halt.is_halted()
    }

    /// Block until the delivery context handled everything queued so far.
    pub fn sync(&self) -> Result<()> {
        let (ack_tx, ack_rx) = crossbeam_channel::bounded(1);
        self.shared.post(Message::Barrier(ack_tx))?;
        ack_rx.recv().map_err(|_| LutCamError::SessionStopped)
    }

    /// Tear the session down. Waits for a renderer call in flight, then
    /// stops the source and closes the renderer. Returns the frame counters
    /// on the first call, `None` afterwards.
    pub fn stop(&self) -> Option<ForwarderStats> {
        let worker = self.worker.lock().take()?;
        info!(sample = %self.sample, "Stopping capture session");
        self.shared.halt.halt();
        self.shared.mark_stopped();
        if self.shared.post(Message::Shutdown).is_err() {
            debug!("Delivery context already gone");
        }
        match worker.join() {
            Ok(stats) => Some(stats),
            Err(_) => {
                error!("Delivery context panicked");
                None
            }
        }
    }

    fn require_strip(&self) -> Result<()> {
        if self.shared.strip {
            Ok(())
        } else {
            Err(LutCamError::InvalidParameter(format!(
                "sample '{}' has no LUT strip",
                self.sample
            )))
        }
    }
}

impl Drop for CaptureSession {
    fn drop(&mut self) {
        self.stop();
    }
}
