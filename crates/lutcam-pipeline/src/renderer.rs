//! Renderer boundary.
//!
//! The renderer does the GPU work; the pipeline only decides what it is sent
//! and when. Every call is made from the delivery context, one at a time.

use crate::scroll_window::ScrollWindow;
use lutcam_core::{CameraFrame, LutImage, Orientation, Result, SampleKind, SurfaceHandle};
use std::path::Path;
use tracing::debug;

/// Borrowed view of one plane for the duration of an `update_frame` call.
#[derive(Debug, Clone, Copy)]
pub struct PlaneView<'a> {
    pub data: &'a [u8],
    pub row_stride: usize,
}

/// Everything the renderer needs to upload one camera frame.
///
/// Borrows from the frame, so the renderer cannot hold on to plane memory
/// past the call; the frame is released right after.
#[derive(Debug, Clone, Copy)]
pub struct FrameUpdate<'a> {
    /// Y, U, V
    pub planes: [PlaneView<'a>; 3],
    /// Pixel strides of U and V
    pub chroma_pixel_strides: [usize; 2],
    pub width: u32,
    pub height: u32,
    pub orientation: Orientation,
}

impl<'a> FrameUpdate<'a> {
    pub fn from_frame(frame: &'a CameraFrame) -> Self {
        let view = |plane: &'a lutcam_core::FramePlane| PlaneView {
            data: &plane.data,
            row_stride: plane.row_stride,
        };
        Self {
            planes: [view(frame.y()), view(frame.u()), view(frame.v())],
            chroma_pixel_strides: frame.chroma_pixel_strides(),
            width: frame.width,
            height: frame.height,
            orientation: frame.orientation,
        }
    }

    /// Row strides of Y, U, V.
    pub fn row_strides(&self) -> [usize; 3] {
        self.planes.map(|p| p.row_stride)
    }
}

/// The external GPU renderer.
pub trait Renderer: Send {
    /// Open the session: load shaders and fixed assets for `sample`.
    fn init(&mut self, asset_root: &Path, sample: SampleKind) -> Result<()>;

    /// Close the session. Nothing else is called afterwards.
    fn deinit(&mut self);

    fn set_surface(&mut self, surface: SurfaceHandle, width: u32, height: u32) -> Result<()>;

    /// Upload the LUT images of the strip, in picker order.
    fn prepare_luts(&mut self, luts: &[LutImage]) -> Result<()>;

    fn update_frame(&mut self, frame: &FrameUpdate<'_>) -> Result<()>;

    fn update_lut_window(&mut self, window: &ScrollWindow) -> Result<()>;

    /// Apply LUT `index` (0-based) to the live image.
    fn update_selection(&mut self, index: u32) -> Result<()>;

    /// Draw. `looping` starts the renderer's own continuous loop; the
    /// capture pipeline always draws one-shot, paced by frame arrival.
    fn render(&mut self, looping: bool) -> Result<()>;
}

impl<R: Renderer + ?Sized> Renderer for Box<R> {
    fn init(&mut self, asset_root: &Path, sample: SampleKind) -> Result<()> {
        (**self).init(asset_root, sample)
    }

    fn deinit(&mut self) {
        (**self).deinit()
    }

    fn set_surface(&mut self, surface: SurfaceHandle, width: u32, height: u32) -> Result<()> {
        (**self).set_surface(surface, width, height)
    }

    fn prepare_luts(&mut self, luts: &[LutImage]) -> Result<()> {
        (**self).prepare_luts(luts)
    }

    fn update_frame(&mut self, frame: &FrameUpdate<'_>) -> Result<()> {
        (**self).update_frame(frame)
    }

    fn update_lut_window(&mut self, window: &ScrollWindow) -> Result<()> {
        (**self).update_lut_window(window)
    }

    fn update_selection(&mut self, index: u32) -> Result<()> {
        (**self).update_selection(index)
    }

    fn render(&mut self, looping: bool) -> Result<()> {
        (**self).render(looping)
    }
}

/// Wrapper that drops draw requests while a continuous loop is running.
pub struct LoopGuard<R> {
    inner: R,
    looping: bool,
}

impl<R: Renderer> LoopGuard<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            looping: false,
        }
    }

    pub fn is_looping(&self) -> bool {
        self.looping
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Renderer> Renderer for LoopGuard<R> {
    fn init(&mut self, asset_root: &Path, sample: SampleKind) -> Result<()> {
        self.inner.init(asset_root, sample)
    }

    fn deinit(&mut self) {
        self.inner.deinit();
        self.looping = false;
    }

    fn set_surface(&mut self, surface: SurfaceHandle, width: u32, height: u32) -> Result<()> {
        self.inner.set_surface(surface, width, height)
    }

    fn prepare_luts(&mut self, luts: &[LutImage]) -> Result<()> {
        self.inner.prepare_luts(luts)
    }

    fn update_frame(&mut self, frame: &FrameUpdate<'_>) -> Result<()> {
        self.inner.update_frame(frame)
    }

    fn update_lut_window(&mut self, window: &ScrollWindow) -> Result<()> {
        self.inner.update_lut_window(window)
    }

    fn update_selection(&mut self, index: u32) -> Result<()> {
        self.inner.update_selection(index)
    }

    fn render(&mut self, looping: bool) -> Result<()> {
        if self.looping {
            debug!("Render loop already running, draw request ignored");
            return Ok(());
        }
        self.inner.render(looping)?;
        self.looping = looping;
        Ok(())
    }
}
