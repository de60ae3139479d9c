//! LUT images loaded from PNG assets.

use lutcam_core::{LutCamError, LutImage, Result};
use lutcam_pipeline::LutProvider;
use std::path::PathBuf;
use tracing::{debug, warn};

/// Loads LUT PNGs relative to an asset root. Missing assets are replaced by
/// identity LUTs so the strip keeps its length.
pub struct AssetLutProvider {
    root: PathBuf,
}

impl AssetLutProvider {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn load_one(&self, name: &str) -> Result<LutImage> {
        let path = self.root.join(name);
        if !path.exists() {
            warn!(path = %path.display(), "LUT asset missing, using identity");
            return Ok(LutImage::identity(name));
        }
        let decoded = image::open(&path)
            .map_err(|e| LutCamError::Source(format!("{}: {}", path.display(), e)))?
            .to_rgba8();
        let (width, height) = decoded.dimensions();
        debug!(path = %path.display(), width, height, "LUT decoded");
        LutImage::from_rgba(name, width, height, decoded.into_raw())
    }
}

impl LutProvider for AssetLutProvider {
    fn load(&self, names: &[String]) -> Result<Vec<LutImage>> {
        names.iter().map(|name| self.load_one(name)).collect()
    }
}
