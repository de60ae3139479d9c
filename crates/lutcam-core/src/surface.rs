//! Preview surface and size types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque handle of a native window the renderer draws into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SurfaceHandle(pub u64);

/// A preview resolution in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PreviewSize {
    pub width: u32,
    pub height: u32,
}

impl PreviewSize {
    pub const HD_1080P: Self = Self::new(1920, 1080);

    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Pixel count.
    pub fn area(self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Whether this size fits inside `bound` in either orientation.
    pub fn fits_within(self, bound: PreviewSize) -> bool {
        let (long, short) = (self.width.max(self.height), self.width.min(self.height));
        long <= bound.width.max(bound.height) && short <= bound.width.min(bound.height)
    }

    pub fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl fmt::Display for PreviewSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}
