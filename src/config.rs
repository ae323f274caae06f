// SPDX-License-Identifier: GPL-3.0-only

//! User configuration
//!
//! A JSON file whose fields narrow down the capture mode the CLI picks.
//! Missing fields take their defaults; command-line flags override the file.

use crate::backends::camera::{PlatformId, PollingPolicy};
use crate::constants::capture::FRAME_TIMEOUT_SECS;
use crate::errors::{CameraError, CameraResult};
use crate::media::formats::{Compression, CompressionQuality, Formats, PixelFormat};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Platform to capture from (first camera of any platform if unset)
    pub platform: Option<PlatformId>,
    /// Device path within the platform
    pub device: Option<String>,
    /// Only consider modes with this pixel format
    pub pixel_format: Option<PixelFormat>,
    /// Only consider modes of this width
    pub width: Option<u64>,
    /// Only consider modes at exactly this frame rate
    pub fps: Option<f64>,
    /// Capture through this compression instead of raw frames
    pub compression: Option<Compression>,
    pub compression_quality: CompressionQuality,
    /// Deadline for acquiring one frame
    pub frame_timeout_secs: u64,
    pub polling: PollingPolicy,
    /// Register the in-memory test pattern platform
    pub synthetic: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            platform: None,
            device: None,
            pixel_format: None,
            width: None,
            fps: None,
            compression: None,
            compression_quality: CompressionQuality::default(),
            frame_timeout_secs: FRAME_TIMEOUT_SECS,
            polling: PollingPolicy::default(),
            synthetic: false,
        }
    }
}

impl Config {
    /// Read a config file
    pub fn load(path: &Path) -> CameraResult<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| CameraError::Config(format!("{}: {}", path.display(), e)))?;
        let config = Self::from_json_str(&text)
            .map_err(|e| CameraError::Config(format!("{}: {}", path.display(), e)))?;
        debug!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    pub fn from_json_str(text: &str) -> CameraResult<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn to_json_pretty(&self) -> CameraResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the config file, replacing any existing one
    pub fn save(&self, path: &Path) -> CameraResult<()> {
        std::fs::write(path, self.to_json_pretty()?)
            .map_err(|e| CameraError::Config(format!("{}: {}", path.display(), e)))
    }

    pub fn frame_timeout(&self) -> Duration {
        Duration::from_secs(self.frame_timeout_secs)
    }

    /// Narrow `formats` down to the modes this config allows
    pub fn apply_filters(&self, formats: &Formats) -> Formats {
        let mut selected = formats.clone();
        if let Some(pixel_format) = self.pixel_format {
            selected = selected.filter_by_pixel_format(pixel_format);
        }
        if let Some(width) = self.width {
            selected = selected.filter_by_width(width);
        }
        if let Some(fps) = self.fps {
            selected = selected.filter_by_fps(fps);
        }
        selected
    }
}
