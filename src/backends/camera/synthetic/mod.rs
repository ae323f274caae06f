// SPDX-License-Identifier: GPL-3.0-only

//! Synthetic test-pattern platform
//!
//! Generates a moving pattern in memory instead of talking to hardware. It
//! follows the same contract as a real backend:
//! - Exclusive device access (a second open reports the device busy)
//! - A bounded slot pool that starves when frames are not released
//! - Optional warm-up period of empty payloads after streaming starts
//! - Raw NV12 / YUYV / MJPG delivery and MJPEG compressed delivery

mod camera;
pub mod pattern;

pub use camera::{SyntheticCamera, SyntheticCompressedCamera};

use super::polling::{FramePoller, PollingPolicy};
use super::types::{DevicePath, PlatformId};
use super::{Camera, CameraCompressed, Platform};
use crate::constants::synthetic::{DEFAULT_POOL_SIZE, DEVICE_PREFIX};
use crate::errors::{CameraError, CameraResult};
use crate::media::formats::{Compression, CompressionQuality, Format, Formats, Fraction, PixelFormat};
use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tracing::{debug, info};

/// One simulated device
#[derive(Debug, Clone)]
pub struct SyntheticDevice {
    pub path: DevicePath,
    pub formats: Formats,
    /// Empty payloads delivered after each `start_streaming`
    pub warmup_frames: u32,
    pub pool_size: usize,
}

impl SyntheticDevice {
    pub fn new(path: impl Into<DevicePath>) -> Self {
        Self {
            path: path.into(),
            formats: default_formats(),
            warmup_frames: 0,
            pool_size: DEFAULT_POOL_SIZE,
        }
    }

    pub fn with_formats(mut self, formats: impl Into<Formats>) -> Self {
        self.formats = formats.into();
        self
    }

    pub fn with_warmup_frames(mut self, frames: u32) -> Self {
        self.warmup_frames = frames;
        self
    }

    pub fn with_pool_size(mut self, size: usize) -> Self {
        self.pool_size = size;
        self
    }

    /// Offered format matching the request's geometry and layout
    ///
    /// Prefers an exact frame rate match and falls back to the first
    /// offered rate.
    fn negotiate(&self, request: &Format) -> CameraResult<Format> {
        let candidates: Vec<&Format> = self
            .formats
            .iter()
            .filter(|f| {
                f.width == request.width
                    && f.height == request.height
                    && f.pixel_format == request.pixel_format
            })
            .collect();
        candidates
            .iter()
            .find(|f| f.fps == request.fps)
            .or_else(|| candidates.first())
            .map(|f| **f)
            .ok_or_else(|| {
                CameraError::NotSupported(format!("{} does not offer {}", self.path, request))
            })
    }
}

/// Formats every default synthetic device offers
pub fn default_formats() -> Formats {
    let fps30 = Fraction::new(30, 1);
    Formats::new(vec![
        Format::raw(640, 480, PixelFormat::NV12, fps30),
        Format::raw(1280, 720, PixelFormat::NV12, fps30),
        Format::raw(640, 480, PixelFormat::YUYV, fps30),
        Format::raw(640, 480, PixelFormat::YUYV, Fraction::new(60, 1)),
        Format::raw(640, 480, PixelFormat::MJPEG, fps30),
    ])
}

/// Paths with an open camera, shared by a platform and its cameras
type BusySet = Arc<Mutex<HashSet<DevicePath>>>;

/// Marks a device open for as long as it lives
#[derive(Debug)]
pub(crate) struct DeviceLease {
    busy: BusySet,
    path: DevicePath,
}

impl DeviceLease {
    fn acquire(busy: &BusySet, path: &str) -> CameraResult<Self> {
        let mut set = busy.lock().unwrap_or_else(PoisonError::into_inner);
        if !set.insert(path.to_string()) {
            return Err(CameraError::DeviceBusy(path.to_string()));
        }
        Ok(Self {
            busy: Arc::clone(busy),
            path: path.to_string(),
        })
    }

    pub(crate) fn path(&self) -> &str {
        &self.path
    }
}

impl Drop for DeviceLease {
    fn drop(&mut self) {
        let mut set = self.busy.lock().unwrap_or_else(PoisonError::into_inner);
        set.remove(&self.path);
        debug!(device = %self.path, "Synthetic device released");
    }
}

/// In-memory platform producing test patterns
#[derive(Debug)]
pub struct SyntheticPlatform {
    devices: Vec<SyntheticDevice>,
    busy: BusySet,
    polling: PollingPolicy,
    poll_interval: Option<Duration>,
}

impl Default for SyntheticPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl SyntheticPlatform {
    /// Platform with a single default device, `synthetic0`
    pub fn new() -> Self {
        Self::with_devices(vec![SyntheticDevice::new(format!("{}0", DEVICE_PREFIX))])
    }

    pub fn with_devices(devices: Vec<SyntheticDevice>) -> Self {
        Self {
            devices,
            busy: BusySet::default(),
            polling: PollingPolicy::default(),
            poll_interval: None,
        }
    }

    /// `count` default devices named `synthetic0`, `synthetic1`, ...
    pub fn with_device_count(count: usize) -> Self {
        Self::with_devices(
            (0..count)
                .map(|i| SyntheticDevice::new(format!("{}{}", DEVICE_PREFIX, i)))
                .collect(),
        )
    }

    pub fn with_polling(mut self, polling: PollingPolicy) -> Self {
        self.polling = polling;
        self
    }

    /// Override the pause between empty polls (one frame interval by default)
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = Some(interval);
        self
    }

    fn device(&self, path: &str) -> CameraResult<&SyntheticDevice> {
        self.devices
            .iter()
            .find(|d| d.path == path)
            .ok_or_else(|| CameraError::backend("open device", format!("no such device {}", path)))
    }

    fn poller(&self, format: &Format) -> FramePoller {
        let poller = self.polling.poller(format.fps);
        match self.poll_interval {
            Some(interval) => poller.with_interval(interval),
            None => poller,
        }
    }
}

impl Platform for SyntheticPlatform {
    fn id(&self) -> PlatformId {
        PlatformId::Synthetic
    }

    fn list_cameras(&self) -> CameraResult<Vec<DevicePath>> {
        Ok(self.devices.iter().map(|d| d.path.clone()).collect())
    }

    fn list_formats(&self, device: &str) -> CameraResult<Formats> {
        Ok(self.device(device)?.formats.clone())
    }

    fn open_camera(&self, device: &str, format: &Format) -> CameraResult<Box<dyn Camera>> {
        format.validate()?;
        if !format.compression.is_undefined() {
            return Err(CameraError::InvalidFormat(format!(
                "raw capture cannot use compression {}",
                format.compression
            )));
        }
        let dev = self.device(device)?;
        let negotiated = dev.negotiate(format)?;
        negotiated.dimensions()?;
        let lease = DeviceLease::acquire(&self.busy, device)?;
        info!(device, format = %negotiated, "Opened synthetic camera");
        Ok(Box::new(SyntheticCamera::new(
            lease,
            negotiated,
            dev.pool_size,
            dev.warmup_frames,
            self.poller(&negotiated),
        )))
    }

    fn open_camera_compressed(
        &self,
        device: &str,
        format: &Format,
        compression: Compression,
        quality: CompressionQuality,
    ) -> CameraResult<Box<dyn CameraCompressed>> {
        match compression {
            Compression::MJPEG => {}
            Compression::HEIC => {
                return Err(CameraError::NotSupported(
                    "HEIC capture is not implemented".into(),
                ));
            }
            other => {
                return Err(CameraError::InvalidFormat(format!(
                    "compressed capture needs a concrete compression, got '{}'",
                    other
                )));
            }
        }
        let dev = self.device(device)?;
        // Any offered geometry can be encoded; the pixel layout is ours to pick.
        let negotiated = dev
            .formats
            .iter()
            .find(|f| f.width == format.width && f.height == format.height)
            .map(|f| Format::compressed(f.width, f.height, compression, f.fps))
            .ok_or_else(|| {
                CameraError::NotSupported(format!(
                    "{} does not offer {}x{}",
                    device, format.width, format.height
                ))
            })?;
        negotiated.dimensions()?;
        let lease = DeviceLease::acquire(&self.busy, device)?;
        info!(device, format = %negotiated, quality = quality.value(), "Opened synthetic compressed camera");
        Ok(Box::new(SyntheticCompressedCamera::new(
            lease,
            negotiated,
            quality,
            dev.pool_size,
            dev.warmup_frames,
            self.poller(&negotiated),
        )))
    }
}
