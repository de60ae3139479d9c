//! Renderer that logs what it is asked to draw instead of touching a GPU.

use lutcam_core::{LutImage, Result, SampleKind, SurfaceHandle};
use lutcam_pipeline::{FrameUpdate, Renderer, ScrollWindow};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, trace};

#[derive(Debug, Default)]
pub struct LoggingRenderer {
    draws: Arc<AtomicU64>,
    luts: usize,
}

impl LoggingRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Draw counter, readable after the renderer was handed to a session.
    pub fn draws(&self) -> Arc<AtomicU64> {
        Arc::clone(&self.draws)
    }
}

impl Renderer for LoggingRenderer {
    fn init(&mut self, asset_root: &Path, sample: SampleKind) -> Result<()> {
        info!(assets = %asset_root.display(), sample = sample.ordinal(), "Renderer init");
        Ok(())
    }

    fn deinit(&mut self) {
        info!(draws = self.draws.load(Ordering::Relaxed), "Renderer deinit");
    }

    fn set_surface(&mut self, surface: SurfaceHandle, width: u32, height: u32) -> Result<()> {
        info!(surface = surface.0, width, height, "Renderer surface");
        Ok(())
    }

    fn prepare_luts(&mut self, luts: &[LutImage]) -> Result<()> {
        self.luts = luts.len();
        info!(count = luts.len(), "Renderer LUTs uploaded");
        Ok(())
    }

    fn update_frame(&mut self, frame: &FrameUpdate<'_>) -> Result<()> {
        trace!(
            width = frame.width,
            height = frame.height,
            orientation = frame.orientation.degrees(),
            strides = ?frame.row_strides(),
            "Renderer frame"
        );
        Ok(())
    }

    fn update_lut_window(&mut self, window: &ScrollWindow) -> Result<()> {
        debug!(
            start = window.start_index,
            count = window.draw_count,
            offset = window.pixel_offset,
            "Renderer LUT window"
        );
        Ok(())
    }

    fn update_selection(&mut self, index: u32) -> Result<()> {
        info!(index, of = self.luts, "Renderer selection");
        Ok(())
    }

    fn render(&mut self, _looping: bool) -> Result<()> {
        self.draws.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}
