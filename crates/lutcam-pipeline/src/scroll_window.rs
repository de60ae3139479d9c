//! Mapping from a continuous strip scroll position to a discrete LUT window.
//!
//! The picker strip is a row of equally wide LUT thumbnails. The renderer
//! draws only the thumbnails that can be visible, so every scroll position is
//! turned into a start index, a count of resident items and the pixel offset
//! into the first item. Windows are always recomputed from scratch, never
//! patched, so the UI and the delivery context never see a half-updated value.

use lutcam_core::{LutCamError, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// The LUT thumbnails resident in the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScrollWindow {
    /// Width of one thumbnail in pixels.
    pub item_width: u32,
    /// Index of the first (possibly partially scrolled out) thumbnail.
    pub start_index: u32,
    /// Number of thumbnails to keep resident, always >= 1.
    pub draw_count: u32,
    /// Pixels of the first thumbnail scrolled past, in `[0, item_width)`.
    pub pixel_offset: u32,
}

impl ScrollWindow {
    /// Scroll offset this window was computed for.
    pub fn scroll_offset(&self) -> u64 {
        self.start_index as u64 * self.item_width as u64 + self.pixel_offset as u64
    }

    /// Index one past the last resident thumbnail.
    pub fn end_index(&self) -> u32 {
        self.start_index.saturating_add(self.draw_count)
    }
}

/// Compute the window for a scroll position.
///
/// `draw_count` covers the container plus one extra trailing item, so a
/// continuous scroll never exposes an unpainted gap for a frame. Negative
/// offsets (overscroll) are clamped to the start of the strip.
pub fn compute_window(
    scroll_offset_px: i32,
    container_width_px: i32,
    item_width_px: i32,
) -> Result<ScrollWindow> {
    if item_width_px <= 0 {
        return Err(LutCamError::InvalidLayout(format!(
            "item width must be positive, got {}",
            item_width_px
        )));
    }
    if container_width_px < 0 {
        return Err(LutCamError::InvalidLayout(format!(
            "container width must not be negative, got {}",
            container_width_px
        )));
    }

    let item = item_width_px as u32;
    let offset = scroll_offset_px.max(0) as u32;
    let container = container_width_px as u32;

    Ok(ScrollWindow {
        item_width: item,
        start_index: offset / item,
        draw_count: container.div_ceil(item) + 1,
        pixel_offset: offset % item,
    })
}

/// Measured strip geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StripGeometry {
    /// Visible width of the scroll container.
    pub container_width: i32,
    /// Width of one LUT thumbnail.
    pub item_width: i32,
}

/// Tracks strip geometry and scroll position and produces fresh windows.
#[derive(Debug, Clone, Default)]
pub struct ScrollWindowMapper {
    geometry: Option<StripGeometry>,
    scroll_offset: i32,
    current: Option<ScrollWindow>,
    seeded: bool,
}

impl ScrollWindowMapper {
    pub fn new() -> Self {
        Self::default()
    }

    /// A stable layout was measured. The very first one seeds the window at
    /// scroll offset 0; later ones keep the last reported scroll offset.
    pub fn on_layout_stable(
        &mut self,
        container_width: i32,
        item_width: i32,
    ) -> Result<ScrollWindow> {
        if !self.seeded {
            self.scroll_offset = 0;
        }
        let window = compute_window(self.scroll_offset, container_width, item_width)?;
        self.geometry = Some(StripGeometry {
            container_width,
            item_width,
        });
        self.seeded = true;
        self.current = Some(window);
        debug!(
            container_width,
            item_width,
            draw_count = window.draw_count,
            "Strip layout measured"
        );
        Ok(window)
    }

    /// The strip scrolled to `offset`.
    pub fn on_scroll(&mut self, offset: i32) -> Result<ScrollWindow> {
        let geometry = self.geometry.ok_or_else(|| {
            LutCamError::InvalidLayout("scroll reported before strip layout was measured".into())
        })?;
        let window = compute_window(offset, geometry.container_width, geometry.item_width)?;
        self.scroll_offset = offset;
        self.current = Some(window);
        Ok(window)
    }

    /// Forget the measured geometry, e.g. after the preview aspect ratio
    /// changed the thumbnail size. A new layout must be reported before the
    /// next scroll.
    pub fn invalidate(&mut self) {
        self.geometry = None;
    }

    /// Whether the first window has been produced.
    pub fn is_seeded(&self) -> bool {
        self.seeded
    }

    pub fn geometry(&self) -> Option<StripGeometry> {
        self.geometry
    }

    /// Most recently computed window.
    pub fn window(&self) -> Option<ScrollWindow> {
        self.current
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
