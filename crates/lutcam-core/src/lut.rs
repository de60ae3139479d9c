//! LUT images handed to the renderer.
//!
//! The pipeline never interprets LUT contents. A [`LutImage`] is an RGBA8
//! bitmap in the 8x8 tile layout the renderer samples from (64 blue levels,
//! each tile a 64x64 red/green grid).

use crate::error::{LutCamError, Result};

/// Edge length of a standard LUT image.
pub const LUT_IMAGE_SIZE: u32 = 512;

const LEVELS: u32 = 64;
const TILES_PER_ROW: u32 = 8;

/// An RGBA8 lookup table bitmap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LutImage {
    /// Asset name the image was loaded from
    pub name: String,
    pub width: u32,
    pub height: u32,
    /// Tightly packed RGBA8 pixels
    pub data: Vec<u8>,
}

impl LutImage {
    /// Wrap decoded RGBA8 pixels.
    pub fn from_rgba(name: impl Into<String>, width: u32, height: u32, data: Vec<u8>) -> Result<Self> {
        let name = name.into();
        let expected = width as usize * height as usize * 4;
        if width == 0 || height == 0 || data.len() != expected {
            return Err(LutCamError::InvalidParameter(format!(
                "LUT '{}' is {}x{} with {} bytes, expected {}",
                name,
                width,
                height,
                data.len(),
                expected
            )));
        }
        Ok(Self {
            name,
            width,
            height,
            data,
        })
    }

    /// Identity table: applying it leaves colors unchanged.
    pub fn identity(name: impl Into<String>) -> Self {
        let size = LUT_IMAGE_SIZE;
        let mut data = Vec::with_capacity((size * size * 4) as usize);
        for y in 0..size {
            for x in 0..size {
                let blue = (y / LEVELS) * TILES_PER_ROW + x / LEVELS;
                let red = x % LEVELS;
                let green = y % LEVELS;
                data.extend_from_slice(&[
                    scale(red),
                    scale(green),
                    scale(blue),
                    255,
                ]);
            }
        }
        Self {
            name: name.into(),
            width: size,
            height: size,
            data,
        }
    }

    /// RGBA pixel at (`x`, `y`).
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        let px = self.data.get(i..i + 4)?;
        Some([px[0], px[1], px[2], px[3]])
    }
}

fn scale(level: u32) -> u8 {
    (level * 255 / (LEVELS - 1)) as u8
}
