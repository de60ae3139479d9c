//! Synthetic camera producing color bar frames on its own thread.

use lutcam_core::{
    CameraFrame, ChromaLayout, FrameId, LutCamError, Orientation, PreviewSize, Result,
};
use lutcam_pipeline::{choose_preview_size, FrameNotifier, FrameSource};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, info};

/// Settings of the synthetic camera.
#[derive(Debug, Clone)]
pub struct SyntheticConfig {
    /// Resolutions the "sensor" offers.
    pub candidates: Vec<PreviewSize>,
    /// Upper bound for preview negotiation.
    pub max_preview: PreviewSize,
    pub fps: u32,
    pub layout: ChromaLayout,
    /// Sensor orientation relative to the display.
    pub orientation: Orientation,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            candidates: vec![
                PreviewSize::new(4032, 3024),
                PreviewSize::new(1920, 1080),
                PreviewSize::new(1280, 720),
                PreviewSize::new(640, 480),
            ],
            max_preview: PreviewSize::HD_1080P,
            fps: 30,
            layout: ChromaLayout::Interleaved,
            orientation: Orientation::Deg90,
        }
    }
}

/// Frame counters, readable after the camera was handed to a session.
#[derive(Debug, Default)]
pub struct CameraCounters {
    pub produced: AtomicU64,
    pub released: AtomicU64,
    /// Frames replaced by a newer one before anyone acquired them.
    pub superseded: AtomicU64,
}

impl CameraCounters {
    /// Frames still out with the pipeline.
    pub fn outstanding(&self) -> u64 {
        // Released first: a frame is always counted as produced before release
        let released = self.released.load(Ordering::SeqCst);
        self.produced
            .load(Ordering::SeqCst)
            .saturating_sub(released)
    }
}

pub struct SyntheticCamera {
    config: SyntheticConfig,
    latest: Arc<Mutex<Option<CameraFrame>>>,
    running: Arc<AtomicBool>,
    counters: Arc<CameraCounters>,
    thread: Option<JoinHandle<()>>,
}

impl SyntheticCamera {
    pub fn new(config: SyntheticConfig) -> Self {
        Self {
            config,
            latest: Arc::new(Mutex::new(None)),
            running: Arc::new(AtomicBool::new(false)),
            counters: Arc::new(CameraCounters::default()),
            thread: None,
        }
    }

    pub fn counters(&self) -> Arc<CameraCounters> {
        Arc::clone(&self.counters)
    }
}

impl FrameSource for SyntheticCamera {
    fn start(&mut self, notifier: FrameNotifier) -> Result<()> {
        if self.thread.is_some() {
            return Ok(());
        }
        let size = choose_preview_size(&self.config.candidates, self.config.max_preview)
            .ok_or_else(|| LutCamError::Source("camera offers no preview sizes".into()))?;
        if self.config.fps == 0 {
            return Err(LutCamError::Source("frame rate must be positive".into()));
        }
        info!(size = %size, fps = self.config.fps, "Synthetic camera opened");
        notifier.preview_size(size);

        self.running.store(true, Ordering::SeqCst);
        let running = Arc::clone(&self.running);
        let latest = Arc::clone(&self.latest);
        let counters = Arc::clone(&self.counters);
        let interval = Duration::from_secs(1) / self.config.fps;
        let layout = self.config.layout;
        let orientation = self.config.orientation;

        let handle = thread::Builder::new()
            .name("synthetic-camera".to_string())
            .spawn(move || {
                let mut next_id = 0u64;
                while running.load(Ordering::SeqCst) {
                    let released = Arc::clone(&counters);
                    let frame = CameraFrame::test_pattern(
                        FrameId(next_id),
                        size.width,
                        size.height,
                        layout,
                        orientation,
                    )
                    .with_release(move |_| {
                        released.released.fetch_add(1, Ordering::SeqCst);
                    });
                    next_id += 1;
                    counters.produced.fetch_add(1, Ordering::SeqCst);

                    // Only the newest frame is kept; an unclaimed one is released here
                    let previous = latest.lock().replace(frame);
                    if let Some(previous) = previous {
                        counters.superseded.fetch_add(1, Ordering::SeqCst);
                        previous.release();
                    }
                    if !notifier.frame_available() {
                        break;
                    }
                    thread::sleep(interval);
                }
                debug!(frames = next_id, "Synthetic camera thread finished");
            })
            .map_err(LutCamError::Io)?;
        self.thread = Some(handle);
        Ok(())
    }

    fn acquire_latest(&mut self) -> Result<Option<CameraFrame>> {
        Ok(self.latest.lock().take())
    }

    fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.thread.take() {
            let _ = handle.join();
        }
        if let Some(frame) = self.latest.lock().take() {
            frame.release();
        }
        info!(
            produced = self.counters.produced.load(Ordering::SeqCst),
            "Synthetic camera closed"
        );
    }
}

impl Drop for SyntheticCamera {
    fn drop(&mut self) {
        if self.thread.is_some() {
            self.stop();
        }
    }
}
