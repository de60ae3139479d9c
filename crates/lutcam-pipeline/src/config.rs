//! Session configuration with versioned JSON persistence.

use lutcam_core::{LutCamError, PreviewSize, Result, SampleKind};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

/// Current config schema version.
pub const CURRENT_VERSION: u32 = 1;

/// Number of LUTs shipped in the default strip.
pub const DEFAULT_LUT_COUNT: usize = 9;

/// Settings of one capture session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Sample the renderer runs.
    pub sample: SampleKind,
    /// Root directory the renderer and LUT provider resolve assets against.
    pub asset_root: PathBuf,
    /// LUT asset names, in picker order.
    pub lut_assets: Vec<String>,
    /// Upper bound for the negotiated preview resolution.
    pub max_preview: PreviewSize,
    /// Default log filter when `RUST_LOG` is unset.
    pub log_level: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            sample: SampleKind::MultiLut,
            asset_root: PathBuf::from("assets"),
            lut_assets: (1..=DEFAULT_LUT_COUNT)
                .map(|i| format!("lut/lut_{:02}.png", i))
                .collect(),
            max_preview: PreviewSize::HD_1080P,
            log_level: "info".to_string(),
        }
    }
}

/// Versioned config file wrapper.
#[derive(Debug, Serialize, Deserialize)]
pub struct ConfigFile {
    /// Schema version for migration.
    pub version: u32,
    pub session: SessionConfig,
}

impl SessionConfig {
    /// Reject settings no session can run with.
    pub fn validate(&self) -> Result<()> {
        if self.sample.uses_luts() && self.lut_assets.is_empty() {
            return Err(LutCamError::Config(format!(
                "sample '{}' needs at least one LUT asset",
                self.sample
            )));
        }
        if self.max_preview.is_empty() {
            return Err(LutCamError::Config(format!(
                "preview bound {} is empty",
                self.max_preview
            )));
        }
        Ok(())
    }

    /// Serialize to JSON bytes.
    pub fn to_json(&self) -> Result<Vec<u8>> {
        let file = ConfigFile {
            version: CURRENT_VERSION,
            session: self.clone(),
        };
        serde_json::to_vec_pretty(&file)
            .map_err(|e| LutCamError::Config(format!("Failed to serialize config: {}", e)))
    }

    /// Deserialize from JSON bytes, migrating older layouts.
    pub fn from_json(data: &[u8]) -> Result<Self> {
        let raw: serde_json::Value = serde_json::from_slice(data)
            .map_err(|e| LutCamError::Config(format!("Invalid JSON: {}", e)))?;

        let version = match raw.get("version") {
            None => 0,
            Some(value) => value
                .as_u64()
                .and_then(|v| u32::try_from(v).ok())
                .ok_or_else(|| LutCamError::Config(format!("Invalid config version {}", value)))?,
        };
        if version > CURRENT_VERSION {
            return Err(LutCamError::Config(format!(
                "Config version {} is newer than supported version {}",
                version, CURRENT_VERSION
            )));
        }

        let migrated = migrate(raw, version);
        let file: ConfigFile = serde_json::from_value(migrated)
            .map_err(|e| LutCamError::Config(format!("Failed to parse config: {}", e)))?;
        file.session.validate()?;
        Ok(file.session)
    }

    /// Read and validate a config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path)?;
        let config = Self::from_json(&data)?;
        info!(path = %path.display(), sample = %config.sample, "Loaded session config");
        Ok(config)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }
}

/// Version 0 files are a bare session object without the wrapper.
fn migrate(raw: serde_json::Value, version: u32) -> serde_json::Value {
    match version {
        0 => serde_json::json!({
            "version": CURRENT_VERSION,
            "session": raw,
        }),
        _ => raw,
    }
}
