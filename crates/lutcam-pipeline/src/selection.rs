//! LUT selection applied to the live image.
//!
//! The picker reports 1-based identifiers; 0 (or anything below) means
//! nothing is selected yet. The renderer wants a 0-based LUT index.
//! Independent of the scroll window: the window decides what is visible in
//! the picker, the selection decides what is applied to the frame.

use tracing::debug;

/// Picker identifier of the first real LUT.
pub const FIRST_LUT_ID: i32 = 1;

/// Translate a picker identifier into a renderer LUT index.
pub fn to_renderer_index(raw_id: i32) -> Option<u32> {
    if raw_id >= FIRST_LUT_ID {
        Some((raw_id - FIRST_LUT_ID) as u32)
    } else {
        None
    }
}

/// Current selection of one session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SelectionTracker {
    current: Option<u32>,
}

impl SelectionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a user selection. Returns the renderer index to forward, or
    /// `None` when the identifier means "nothing selected".
    pub fn select(&mut self, raw_id: i32) -> Option<u32> {
        let index = to_renderer_index(raw_id)?;
        debug!(raw_id, index, "LUT selected");
        self.current = Some(index);
        Some(index)
    }

    /// Select the first LUT if nothing is selected yet, so the renderer never
    /// draws with an unset LUT. Returns the picker identifier chosen.
    pub fn auto_select(&mut self) -> Option<i32> {
        if self.current.is_some() {
            return None;
        }
        self.select(FIRST_LUT_ID).map(|_| FIRST_LUT_ID)
    }

    /// Renderer index currently applied.
    pub fn current(&self) -> Option<u32> {
        self.current
    }

    pub fn reset(&mut self) {
        self.current = None;
    }
}
