//! Frame source boundary and its collaborators.

use crate::delivery::Message;
use crossbeam_channel::Sender;
use lutcam_core::{CameraFrame, LutImage, PreviewSize, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::trace;

/// The camera device and capture session.
///
/// All methods are called from the delivery context.
pub trait FrameSource: Send {
    /// Open the device and start capturing. The source reports its
    /// negotiated preview size once through `notifier` before frames flow,
    /// then signals every new frame.
    fn start(&mut self, notifier: FrameNotifier) -> Result<()>;

    /// Take the newest pending frame. `Ok(None)` is a normal empty tick.
    fn acquire_latest(&mut self) -> Result<Option<CameraFrame>>;

    /// Stop capturing and close the device.
    fn stop(&mut self);
}

/// Wake-up state shared by the notifiers and the delivery context.
#[derive(Debug, Default)]
pub(crate) struct FrameWake {
    /// A `FrameAvailable` is queued and not yet handled.
    pending: AtomicBool,
    /// The delivery context has exited.
    closed: AtomicBool,
}

impl FrameWake {
    /// Called by the delivery context right before it acquires a frame, so
    /// frames arriving during the acquisition wake it again.
    pub fn take(&self) {
        self.pending.store(false, Ordering::Release);
    }

    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }
}

/// Handle a running source uses to wake the delivery context.
///
/// Frame wake-ups coalesce: while one is queued and not yet handled, further
/// notifications only keep it queued. The delivery context then acquires the
/// newest frame once, so UI updates never wait behind stale frame ticks.
#[derive(Clone)]
pub struct FrameNotifier {
    tx: Sender<Message>,
    wake: Arc<FrameWake>,
}

impl FrameNotifier {
    pub(crate) fn new(tx: Sender<Message>, wake: Arc<FrameWake>) -> Self {
        Self { tx, wake }
    }

    /// A new frame can be acquired. Returns `false` once the session is gone.
    pub fn frame_available(&self) -> bool {
        if self.wake.closed.load(Ordering::Acquire) {
            trace!("Frame notification after session end");
            return false;
        }
        if self.wake.pending.swap(true, Ordering::AcqRel) {
            return true;
        }
        let delivered = self.tx.send(Message::FrameAvailable).is_ok();
        if !delivered {
            trace!("Frame notification after session end");
        }
        delivered
    }

    /// Report the negotiated preview resolution.
    pub fn preview_size(&self, size: PreviewSize) -> bool {
        self.tx.send(Message::PreviewSize(size)).is_ok()
    }
}

/// Loads the LUT images of the picker strip.
pub trait LutProvider: Send + Sync {
    fn load(&self, names: &[String]) -> Result<Vec<LutImage>>;
}

/// Provider that hands out identity LUTs under the requested names.
/// Useful when no LUT assets are installed.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityLuts;

impl LutProvider for IdentityLuts {
    fn load(&self, names: &[String]) -> Result<Vec<LutImage>> {
        Ok(names.iter().map(LutImage::identity).collect())
    }
}

/// Pick the preview resolution: the largest candidate (by area) that fits
/// inside `bound`, or the smallest candidate when none fits.
pub fn choose_preview_size(candidates: &[PreviewSize], bound: PreviewSize) -> Option<PreviewSize> {
    candidates
        .iter()
        .copied()
        .filter(|size| !size.is_empty() && size.fits_within(bound))
        .max_by_key(|size| size.area())
        .or_else(|| {
            candidates
                .iter()
                .copied()
                .filter(|size| !size.is_empty())
                .min_by_key(|size| size.area())
        })
}
