//! Session state shared between the UI side and the delivery context.

use crate::delivery::Message;
use crate::halt::HaltSignal;
use crate::readiness::{Condition, ReadinessGate, ReadinessState};
use crate::scroll_window::{ScrollWindow, ScrollWindowMapper};
use crate::selection::SelectionTracker;
use crossbeam_channel::Sender;
use lutcam_core::{LutCamError, PreviewSize, Result};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, error, info};

/// Lifecycle of one capture session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    /// Constructed, delivery context not running yet.
    Unstarted,
    /// Waiting for permission, surface and layout.
    AwaitingReady,
    /// Capture running and frames forwarded.
    Active,
    /// Torn down.
    Stopped,
    /// A renderer or capture failure ended the session.
    Failed,
}

impl Phase {
    /// No renderer calls happen in a terminal phase.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Stopped | Self::Failed)
    }
}

/// Notifications for the UI collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// The frame source was started.
    CaptureStarted,
    /// The source settled on a preview size. Strip layouts must be measured
    /// again before frames are forwarded.
    PreviewNegotiated(PreviewSize),
    Active,
    /// The pipeline picked this picker identifier on its own.
    AutoSelected(i32),
    PermissionDenied,
    RendererFailed(String),
    CaptureFailed(String),
    /// The LUT provider could not load the strip.
    LutLoadFailed(String),
    Stopped,
}

#[derive(Debug)]
pub(crate) struct SessionState {
    pub gate: ReadinessGate,
    pub mapper: ScrollWindowMapper,
    pub selection: SelectionTracker,
    pub phase: Phase,
    pub preview_size: Option<PreviewSize>,
    pub capture_started: bool,
}

impl SessionState {
    fn new(strip: bool) -> Self {
        let mut gate = ReadinessGate::new();
        if !strip {
            // No strip to measure
            gate.set_layout_ready(true);
        }
        Self {
            gate,
            mapper: ScrollWindowMapper::new(),
            selection: SelectionTracker::new(),
            phase: Phase::Unstarted,
            preview_size: None,
            capture_started: false,
        }
    }

    /// Fail with `SessionStopped` once the session ended.
    pub fn ensure_running(&self) -> Result<()> {
        if self.phase.is_terminal() {
            Err(LutCamError::SessionStopped)
        } else {
            Ok(())
        }
    }
}

/// Frame-time view of the session used by the forwarder.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ForwardSnapshot {
    pub may_process: bool,
    pub ended: bool,
    pub window: Option<ScrollWindow>,
}

pub(crate) struct Shared {
    pub strip: bool,
    pub state: Mutex<SessionState>,
    pub halt: HaltSignal,
    tx: Sender<Message>,
    events: Sender<SessionEvent>,
    phase_tx: watch::Sender<Phase>,
}

impl Shared {
    pub fn new(
        strip: bool,
        tx: Sender<Message>,
        events: Sender<SessionEvent>,
        phase_tx: watch::Sender<Phase>,
    ) -> Self {
        Self {
            strip,
            state: Mutex::new(SessionState::new(strip)),
            halt: HaltSignal::new(),
            tx,
            events,
            phase_tx,
        }
    }

    /// Queue a message for the delivery context.
    pub fn post(&self, message: Message) -> Result<()> {
        self.tx
            .send(message)
            .map_err(|_| LutCamError::SessionStopped)
    }

    pub fn emit(&self, event: SessionEvent) {
        // Nobody listening is fine
        let _ = self.events.send(event);
    }

    pub fn phase(&self) -> Phase {
        self.state.lock().phase
    }

    pub fn readiness(&self) -> ReadinessState {
        self.state.lock().gate.state()
    }

    /// The delivery context is running.
    pub fn mark_started(&self) {
        let mut state = self.state.lock();
        if state.phase == Phase::Unstarted {
            self.set_phase(&mut state, Phase::AwaitingReady);
            self.refresh_phase(&mut state);
        }
    }

    /// Update one readiness condition and act on the capture trigger.
    pub fn set_condition(&self, condition: Condition, value: bool) -> Result<()> {
        let mut state = self.state.lock();
        self.apply_condition(&mut state, condition, value)
    }

    /// [`Shared::set_condition`] for a caller already holding the state lock.
    pub fn apply_condition(
        &self,
        state: &mut SessionState,
        condition: Condition,
        value: bool,
    ) -> Result<()> {
        state.ensure_running()?;
        state.gate.set(condition, value);
        debug!(?condition, value, pending = state.gate.pending(), "Readiness changed");
        if state.gate.should_start_capture() {
            info!("Permission and surface ready, starting capture");
            self.post(Message::StartCapture)?;
        }
        self.refresh_phase(state);
        Ok(())
    }

    pub fn on_capture_started(&self) {
        let mut state = self.state.lock();
        if state.phase.is_terminal() {
            return;
        }
        state.capture_started = true;
        self.emit(SessionEvent::CaptureStarted);
        self.refresh_phase(&mut state);
    }

    /// The source negotiated its preview size. For strip variants the
    /// thumbnail geometry depends on it, so the layout must be measured again.
    pub fn on_preview_size(&self, size: PreviewSize) {
        let mut state = self.state.lock();
        if state.phase.is_terminal() {
            return;
        }
        info!(size = %size, "Preview size negotiated");
        let changed = state.preview_size != Some(size);
        state.preview_size = Some(size);
        if self.strip && changed {
            state.mapper.invalidate();
            state.gate.set_layout_ready(false);
            self.refresh_phase(&mut state);
        }
        self.emit(SessionEvent::PreviewNegotiated(size));
    }

    pub fn forward_snapshot(&self) -> ForwardSnapshot {
        let state = self.state.lock();
        ForwardSnapshot {
            may_process: state.gate.may_process_frames(),
            ended: state.phase.is_terminal(),
            window: state.mapper.window(),
        }
    }

    /// End the session after a renderer, capture or asset failure and report
    /// it through `event`.
    pub fn fail(&self, error: LutCamError, event: fn(String) -> SessionEvent) {
        let mut state = self.state.lock();
        if state.phase.is_terminal() {
            return;
        }
        error!(error = %error, "Capture session failed");
        self.set_phase(&mut state, Phase::Failed);
        self.emit(event(error.to_string()));
    }

    /// Discard readiness, window and selection.
    pub fn mark_stopped(&self) {
        let mut state = self.state.lock();
        state.gate.reset();
        state.mapper.reset();
        state.selection.reset();
        state.capture_started = false;
        if state.phase != Phase::Stopped {
            self.set_phase(&mut state, Phase::Stopped);
            self.emit(SessionEvent::Stopped);
        }
    }

    pub fn refresh_phase(&self, state: &mut SessionState) {
        if state.phase.is_terminal() || state.phase == Phase::Unstarted {
            return;
        }
        // Strip thumbnails are sized from the preview, so a strip session is
        // only live once the source reported it.
        let negotiated = !self.strip || state.preview_size.is_some();
        let next = if state.capture_started && negotiated && state.gate.may_process_frames() {
            Phase::Active
        } else {
            Phase::AwaitingReady
        };
        if next != state.phase {
            self.set_phase(state, next);
            if next == Phase::Active {
                info!("Capture session active");
                self.emit(SessionEvent::Active);
            }
        }
    }

    fn set_phase(&self, state: &mut SessionState, phase: Phase) {
        debug!(from = ?state.phase, to = ?phase, "Session phase");
        state.phase = phase;
        self.phase_tx.send_replace(phase);
    }
}
