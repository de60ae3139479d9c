//! Error types for LutCam.

use thiserror::Error;

/// Main error type for capture pipeline operations.
#[derive(Error, Debug)]
pub enum LutCamError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The user declined camera access. The session never reaches `Active`.
    #[error("Camera permission denied")]
    PermissionDenied,

    /// Strip geometry was used before it was measured.
    #[error("Invalid layout: {0}")]
    InvalidLayout(String),

    #[error("Renderer error: {0}")]
    Renderer(String),

    #[error("Frame source error: {0}")]
    Source(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Capture session has stopped")]
    SessionStopped,
}

/// Result type alias for LutCam operations.
pub type Result<T> = std::result::Result<T, LutCamError>;
