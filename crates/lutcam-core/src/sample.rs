//! Capture sample variants.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which camera sample the renderer runs.
///
/// The pipeline is the same for all of them; the variant decides whether a
/// LUT strip exists (and with it the layout readiness condition, the scroll
/// window and the selection index).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SampleKind {
    /// Plain YUV camera preview.
    CameraYuv,
    /// Preview through a single fixed LUT.
    Lut,
    /// Preview with a scrollable strip of LUT thumbnails.
    #[default]
    MultiLut,
    /// Preview with a live histogram overlay.
    Histogram,
}

impl SampleKind {
    /// Sample ordinal understood by the renderer's `init`.
    pub fn ordinal(self) -> i32 {
        match self {
            Self::CameraYuv => 5,
            Self::Lut => 7,
            Self::MultiLut => 8,
            Self::Histogram => 9,
        }
    }

    /// Whether the renderer needs LUT images at all.
    pub fn uses_luts(self) -> bool {
        matches!(self, Self::Lut | Self::MultiLut)
    }

    /// Whether a scrollable LUT strip is part of the layout.
    pub fn uses_lut_strip(self) -> bool {
        matches!(self, Self::MultiLut)
    }
}

impl fmt::Display for SampleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::CameraYuv => "camera preview",
            Self::Lut => "camera LUT",
            Self::MultiLut => "multi LUT",
            Self::Histogram => "histogram",
        };
        f.write_str(name)
    }
}
