//! LutCam Core - Foundation types for the camera-to-renderer pipeline
//!
//! This crate provides the value types shared by the pipeline and its
//! collaborators:
//! - Camera frames with per-plane strides and ownership-enforced release
//! - LUT images handed opaquely to the renderer
//! - Sample variants, preview sizes and surface handles
//! - The common error type

pub mod error;
pub mod frame;
pub mod lut;
pub mod sample;
pub mod surface;

pub use error::{LutCamError, Result};
pub use frame::{CameraFrame, ChromaLayout, FrameId, FramePlane, Orientation};
pub use lut::{LutImage, LUT_IMAGE_SIZE};
pub use sample::SampleKind;
pub use surface::{PreviewSize, SurfaceHandle};
