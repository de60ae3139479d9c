//! Camera frame types.
//!
//! A [`CameraFrame`] is only lent to the pipeline for the duration of one
//! delivery callback. It belongs to the frame source and goes back to it
//! exactly once: either explicitly through [`CameraFrame::release`] or when
//! the frame is dropped. Ownership makes double release impossible.

use crate::error::{LutCamError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Source-assigned identifier of a captured frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FrameId(pub u64);

impl fmt::Display for FrameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Sensor orientation relative to the display, as reported by the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Orientation {
    #[default]
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl Orientation {
    /// Parse a device-reported rotation. Negative and >= 360 values wrap.
    pub fn from_degrees(degrees: i32) -> Result<Self> {
        match degrees.rem_euclid(360) {
            0 => Ok(Self::Deg0),
            90 => Ok(Self::Deg90),
            180 => Ok(Self::Deg180),
            270 => Ok(Self::Deg270),
            _ => Err(LutCamError::InvalidParameter(format!(
                "orientation must be a multiple of 90 degrees, got {}",
                degrees
            ))),
        }
    }

    /// Rotation in degrees.
    pub fn degrees(self) -> u32 {
        match self {
            Self::Deg0 => 0,
            Self::Deg90 => 90,
            Self::Deg180 => 180,
            Self::Deg270 => 270,
        }
    }

    /// Whether width and height swap on screen.
    pub fn is_transposed(self) -> bool {
        matches!(self, Self::Deg90 | Self::Deg270)
    }
}

/// Memory layout of the two chroma planes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ChromaLayout {
    /// Separate U and V planes, one sample per pixel step (I420).
    #[default]
    Planar,
    /// U and V samples interleaved in one buffer, pixel stride 2 (NV21).
    Interleaved,
}

/// One plane of a YUV image.
#[derive(Clone)]
pub struct FramePlane {
    /// Raw sample data
    pub data: Vec<u8>,
    /// Bytes per row (may include padding)
    pub row_stride: usize,
    /// Bytes between two horizontally adjacent samples
    pub pixel_stride: usize,
}

impl FramePlane {
    pub fn new(data: Vec<u8>, row_stride: usize, pixel_stride: usize) -> Self {
        Self {
            data,
            row_stride,
            pixel_stride,
        }
    }

    /// Sample at column `x`, row `y` of this plane.
    #[inline]
    pub fn sample(&self, x: usize, y: usize) -> Option<u8> {
        self.data
            .get(y * self.row_stride + x * self.pixel_stride)
            .copied()
    }

    /// Minimum byte length needed to hold `cols` x `rows` samples.
    fn required_len(&self, cols: usize, rows: usize) -> usize {
        if cols == 0 || rows == 0 {
            return 0;
        }
        (rows - 1) * self.row_stride + (cols - 1) * self.pixel_stride + 1
    }
}

impl fmt::Debug for FramePlane {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FramePlane")
            .field("len", &self.data.len())
            .field("row_stride", &self.row_stride)
            .field("pixel_stride", &self.pixel_stride)
            .finish()
    }
}

type ReleaseHook = Box<dyn FnOnce(FrameId) + Send>;

/// A multi-plane YUV 4:2:0 frame lent by the camera.
pub struct CameraFrame {
    pub id: FrameId,
    /// Frame width in pixels
    pub width: u32,
    /// Frame height in pixels
    pub height: u32,
    pub orientation: Orientation,
    /// Y, U, V
    pub planes: [FramePlane; 3],
    release: Option<ReleaseHook>,
}

impl CameraFrame {
    pub fn new(
        id: FrameId,
        width: u32,
        height: u32,
        orientation: Orientation,
        planes: [FramePlane; 3],
    ) -> Self {
        Self {
            id,
            width,
            height,
            orientation,
            planes,
            release: None,
        }
    }

    /// Attach the callback that hands the frame back to its source.
    pub fn with_release<F>(mut self, hook: F) -> Self
    where
        F: FnOnce(FrameId) + Send + 'static,
    {
        self.release = Some(Box::new(hook));
        self
    }

    #[inline]
    pub fn y(&self) -> &FramePlane {
        &self.planes[0]
    }

    #[inline]
    pub fn u(&self) -> &FramePlane {
        &self.planes[1]
    }

    #[inline]
    pub fn v(&self) -> &FramePlane {
        &self.planes[2]
    }

    /// Pixel strides of the U and V planes.
    pub fn chroma_pixel_strides(&self) -> [usize; 2] {
        [self.u().pixel_stride, self.v().pixel_stride]
    }

    /// Chroma plane dimensions for 4:2:0 subsampling.
    pub fn chroma_size(&self) -> (u32, u32) {
        (self.width.div_ceil(2), self.height.div_ceil(2))
    }

    /// Check that every plane is large enough for the declared geometry.
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(LutCamError::InvalidParameter(format!(
                "frame {} has empty dimensions {}x{}",
                self.id, self.width, self.height
            )));
        }
        let (cw, ch) = self.chroma_size();
        let dims = [
            (self.width as usize, self.height as usize),
            (cw as usize, ch as usize),
            (cw as usize, ch as usize),
        ];
        for (index, (plane, (cols, rows))) in self.planes.iter().zip(dims).enumerate() {
            if plane.pixel_stride == 0 || plane.row_stride < plane.pixel_stride {
                return Err(LutCamError::InvalidParameter(format!(
                    "frame {} plane {} has bad strides (row {}, pixel {})",
                    self.id, index, plane.row_stride, plane.pixel_stride
                )));
            }
            let needed = plane.required_len(cols, rows);
            if plane.data.len() < needed {
                return Err(LutCamError::InvalidParameter(format!(
                    "frame {} plane {} holds {} bytes, needs {}",
                    self.id,
                    index,
                    plane.data.len(),
                    needed
                )));
            }
        }
        Ok(())
    }

    /// Hand the frame back to its source.
    pub fn release(mut self) {
        if let Some(hook) = self.release.take() {
            hook(self.id);
        }
    }

    /// Create a color bar test frame with padded row strides.
    pub fn test_pattern(
        id: FrameId,
        width: u32,
        height: u32,
        layout: ChromaLayout,
        orientation: Orientation,
    ) -> Self {
        // 8 bars: white, yellow, cyan, green, magenta, red, blue, black
        const BARS: [[i32; 3]; 8] = [
            [255, 255, 255],
            [255, 255, 0],
            [0, 255, 255],
            [0, 255, 0],
            [255, 0, 255],
            [255, 0, 0],
            [0, 0, 255],
            [0, 0, 0],
        ];
        let bar_yuv = BARS.map(|[r, g, b]| {
            let y = (77 * r + 150 * g + 29 * b) >> 8;
            let u = ((-43 * r - 85 * g + 128 * b) >> 8) + 128;
            let v = ((128 * r - 107 * g - 21 * b) >> 8) + 128;
            [y, u, v].map(|c| c.clamp(0, 255) as u8)
        });
        let bar_at = |x: usize, w: usize| bar_yuv[(x * 8 / w.max(1)).min(7)];

        let w = width as usize;
        let h = height as usize;
        let cw = width.div_ceil(2) as usize;
        let ch = height.div_ceil(2) as usize;

        let y_stride = align64(w);
        let mut y_data = vec![0u8; y_stride * h];
        for row in 0..h {
            for x in 0..w {
                y_data[row * y_stride + x] = bar_at(x, w)[0];
            }
        }

        let [u_plane, v_plane] = match layout {
            ChromaLayout::Planar => {
                let stride = align64(cw);
                let mut u = vec![0u8; stride * ch];
                let mut v = vec![0u8; stride * ch];
                for row in 0..ch {
                    for x in 0..cw {
                        let [_, cu, cv] = bar_at(x * 2, w);
                        u[row * stride + x] = cu;
                        v[row * stride + x] = cv;
                    }
                }
                [FramePlane::new(u, stride, 1), FramePlane::new(v, stride, 1)]
            }
            ChromaLayout::Interleaved => {
                // V first, U one byte behind, both walking the same rows
                let stride = align64(cw * 2);
                let mut vu = vec![0u8; stride * ch];
                for row in 0..ch {
                    for x in 0..cw {
                        let [_, cu, cv] = bar_at(x * 2, w);
                        vu[row * stride + x * 2] = cv;
                        vu[row * stride + x * 2 + 1] = cu;
                    }
                }
                let u = vu[1..].to_vec();
                [FramePlane::new(u, stride, 2), FramePlane::new(vu, stride, 2)]
            }
        };

        Self::new(
            id,
            width,
            height,
            orientation,
            [FramePlane::new(y_data, y_stride, 1), u_plane, v_plane],
        )
    }
}

impl Drop for CameraFrame {
    fn drop(&mut self) {
        if let Some(hook) = self.release.take() {
            hook(self.id);
        }
    }
}

impl fmt::Debug for CameraFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CameraFrame")
            .field("id", &self.id)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("orientation", &self.orientation)
            .field("planes", &self.planes)
            .field("pending_release", &self.release.is_some())
            .finish()
    }
}

// Row alignment for SIMD and GPU upload
fn align64(bytes: usize) -> usize {
    (bytes + 63) & !63
}
