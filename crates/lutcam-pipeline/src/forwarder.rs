//! Per-frame forwarding from the camera to the renderer.
//!
//! For each delivered frame:
//!
//! 1. Gate closed: release the frame, no renderer call. This is the normal
//!    state until surface and layout negotiation complete.
//! 2. Gate open: bring the renderer's LUT window up to date (strip variants
//!    only), `update_frame`, then a one-shot `render(false)`.
//! 3. Release the frame, on the error path too.
//!
//! Exactly one release per frame, at most one draw per frame, and the draw
//! always follows the update.

use crate::halt::HaltSignal;
use crate::renderer::{FrameUpdate, Renderer};
use crate::scroll_window::ScrollWindow;
use lutcam_core::{CameraFrame, LutCamError, Result};
use tracing::{debug, trace, warn};

/// What the delivery context knows about the session when a frame arrives.
#[derive(Debug, Clone, Copy)]
pub struct ForwardContext<'a> {
    /// `ReadinessGate::may_process_frames` at delivery time.
    pub may_process: bool,
    /// The session failed or was torn down.
    pub ended: bool,
    /// Current strip window, for strip variants.
    pub window: Option<ScrollWindow>,
    pub halt: &'a HaltSignal,
}

/// Why a frame was not drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// Surface or layout not ready yet.
    GateClosed,
    /// Teardown began or the session failed.
    SessionEnded,
    /// The source delivered planes too small for the frame geometry.
    Malformed,
}

/// Result of handling one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    Forwarded,
    Dropped(DropReason),
    /// Teardown began between the update and the draw.
    Interrupted,
}

/// Frame counters of one session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ForwarderStats {
    pub forwarded: u64,
    pub dropped: u64,
    pub interrupted: u64,
    pub windows_applied: u64,
}

/// Packages camera frames into renderer updates.
#[derive(Debug, Default)]
pub struct FrameForwarder {
    attach_window: bool,
    applied_window: Option<ScrollWindow>,
    stats: ForwarderStats,
}

impl FrameForwarder {
    /// `attach_window` is set for variants with a LUT strip.
    pub fn new(attach_window: bool) -> Self {
        Self {
            attach_window,
            ..Self::default()
        }
    }

    pub fn stats(&self) -> ForwarderStats {
        self.stats
    }

    /// Window the renderer currently holds.
    pub fn applied_window(&self) -> Option<ScrollWindow> {
        self.applied_window
    }

    /// Handle one delivered frame. The frame is always released before this
    /// returns. Renderer failures are returned, not retried.
    pub fn on_frame<R: Renderer + ?Sized>(
        &mut self,
        frame: CameraFrame,
        ctx: &ForwardContext<'_>,
        renderer: &mut R,
    ) -> Result<FrameOutcome> {
        let reason = if ctx.ended || ctx.halt.is_halted() {
            Some(DropReason::SessionEnded)
        } else if !ctx.may_process {
            Some(DropReason::GateClosed)
        } else if let Err(e) = frame.validate() {
            warn!(frame = %frame.id, error = %e, "Dropping malformed frame");
            Some(DropReason::Malformed)
        } else {
            None
        };

        if let Some(reason) = reason {
            trace!(frame = %frame.id, ?reason, "Frame dropped");
            self.stats.dropped += 1;
            frame.release();
            return Ok(FrameOutcome::Dropped(reason));
        }

        let result = self.forward(&frame, ctx, renderer);
        frame.release();

        match result {
            Ok(FrameOutcome::Forwarded) => self.stats.forwarded += 1,
            Ok(FrameOutcome::Interrupted) => self.stats.interrupted += 1,
            Ok(FrameOutcome::Dropped(_)) => self.stats.dropped += 1,
            Err(_) => {}
        }
        result
    }

    fn forward<R: Renderer + ?Sized>(
        &mut self,
        frame: &CameraFrame,
        ctx: &ForwardContext<'_>,
        renderer: &mut R,
    ) -> Result<FrameOutcome> {
        if self.attach_window {
            if let Some(window) = ctx.window {
                if self.applied_window != Some(window)
                    && !self.apply_window(window, ctx.halt, renderer)?
                {
                    return Ok(FrameOutcome::Dropped(DropReason::SessionEnded));
                }
            }
        }

        {
            let Some(_permit) = ctx.halt.permit() else {
                return Ok(FrameOutcome::Dropped(DropReason::SessionEnded));
            };
            renderer.update_frame(&FrameUpdate::from_frame(frame))?;
        }

        let Some(_permit) = ctx.halt.permit() else {
            debug!(frame = %frame.id, "Teardown began before draw");
            return Ok(FrameOutcome::Interrupted);
        };
        renderer.render(false)?;
        Ok(FrameOutcome::Forwarded)
    }

    /// Push a new LUT window to the renderer unless teardown began.
    /// Returns whether the renderer was called.
    pub fn apply_window<R: Renderer + ?Sized>(
        &mut self,
        window: ScrollWindow,
        halt: &HaltSignal,
        renderer: &mut R,
    ) -> Result<bool> {
        let Some(_permit) = halt.permit() else {
            return Ok(false);
        };
        renderer.update_lut_window(&window)?;
        self.applied_window = Some(window);
        self.stats.windows_applied += 1;
        Ok(true)
    }
}

/// Map a renderer error into the variant the session reports.
pub(crate) fn renderer_failure(error: LutCamError) -> LutCamError {
    match error {
        LutCamError::Renderer(_) => error,
        other => LutCamError::Renderer(other.to_string()),
    }
}
