// SPDX-License-Identifier: GPL-3.0-only

//! Video4Linux2 capture platform
//!
//! Talks to `/dev/video*` capture nodes through the `v4l` crate:
//! - Device discovery filtered to nodes with the video capture capability
//! - Format enumeration (pixel format x frame size x frame interval)
//! - Raw capture through memory-mapped buffers
//! - MJPEG compressed capture on devices that encode in hardware

mod camera;

pub use camera::{V4l2Camera, V4l2CompressedCamera};

use super::polling::PollingPolicy;
use super::types::{DevicePath, PlatformId};
use super::{Camera, CameraCompressed, Platform};
use crate::constants::v4l2::{DEVICE_DIR, DEVICE_PREFIX};
use crate::errors::{CameraError, CameraResult, ResultExt};
use crate::media::formats::{Compression, CompressionQuality, Format, Formats, Fraction, PixelFormat};
use std::io;
use std::path::Path;
use tracing::{debug, info, warn};
use v4l::capability::Flags;
use v4l::frameinterval::FrameIntervalEnum;
use v4l::framesize::FrameSizeEnum;
use v4l::prelude::*;
use v4l::video::Capture;

/// Map an I/O failure from the driver to a camera error
pub(crate) fn io_error(operation: &str, device: &str, err: io::Error) -> CameraError {
    match err.kind() {
        io::ErrorKind::ResourceBusy => CameraError::DeviceBusy(device.to_string()),
        io::ErrorKind::TimedOut => CameraError::Timeout(format!("{} on {}", operation, device)),
        _ => CameraError::backend(operation, format!("{}: {}", device, err)),
    }
}

/// The V4L2 platform
#[derive(Debug, Default)]
pub struct V4l2Platform {
    polling: PollingPolicy,
}

impl V4l2Platform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_polling(polling: PollingPolicy) -> Self {
        Self { polling }
    }

    fn open_device(&self, device: &str) -> CameraResult<Device> {
        Device::with_path(device).map_err(|e| io_error("open device", device, e))
    }
}

/// Whether `name` looks like a capture node (`video0`, `video12`, ...)
fn is_video_node(name: &str) -> bool {
    name.strip_prefix(DEVICE_PREFIX)
        .is_some_and(|n| !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()))
}

/// Sort key putting `video2` before `video10`
fn node_number(path: &str) -> u32 {
    path.rsplit(DEVICE_PREFIX)
        .next()
        .and_then(|n| n.parse().ok())
        .unwrap_or(u32::MAX)
}

/// Frame rate of a frame interval (time per frame)
fn fps_of(interval: v4l::Fraction) -> Fraction {
    Fraction::new(interval.denominator, interval.numerator)
}

/// Frame rates the device offers for one size
///
/// Stepwise ranges contribute their fastest rate only.
fn frame_rates(dev: &Device, fourcc: v4l::FourCC, width: u32, height: u32) -> Vec<Fraction> {
    match dev.enum_frameintervals(fourcc, width, height) {
        Ok(intervals) => intervals
            .into_iter()
            .map(|i| match i.interval {
                FrameIntervalEnum::Discrete(f) => fps_of(f),
                FrameIntervalEnum::Stepwise(s) => fps_of(s.min),
            })
            .filter(|f| f.numerator != 0 && f.denominator != 0)
            .collect(),
        Err(e) => {
            debug!(width, height, error = %e, "No frame intervals reported");
            Vec::new()
        }
    }
}

/// Frame sizes the device offers for one pixel format
///
/// Stepwise ranges contribute their largest size only.
fn frame_sizes(dev: &Device, fourcc: v4l::FourCC) -> io::Result<Vec<(u32, u32)>> {
    let mut sizes = Vec::new();
    for size in dev.enum_framesizes(fourcc)? {
        match size.size {
            FrameSizeEnum::Discrete(d) => sizes.push((d.width, d.height)),
            FrameSizeEnum::Stepwise(s) => sizes.push((s.max_width, s.max_height)),
        }
    }
    Ok(sizes)
}

impl Platform for V4l2Platform {
    fn id(&self) -> PlatformId {
        PlatformId::V4l2
    }

    fn list_cameras(&self) -> CameraResult<Vec<DevicePath>> {
        let entries = std::fs::read_dir(DEVICE_DIR)
            .map_err(|e| CameraError::backend("list devices", format!("{}: {}", DEVICE_DIR, e)))?;

        let mut devices: Vec<DevicePath> = entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_name().to_str().is_some_and(is_video_node))
            .map(|entry| Path::new(DEVICE_DIR).join(entry.file_name()).display().to_string())
            .filter(|path| match Device::with_path(path).and_then(|d| d.query_caps()) {
                Ok(caps) => caps.capabilities.contains(Flags::VIDEO_CAPTURE),
                Err(e) => {
                    debug!(device = %path, error = %e, "Skipping unreadable video node");
                    false
                }
            })
            .collect();
        devices.sort_by_key(|p| node_number(p));

        info!(count = devices.len(), "Enumerated V4L2 capture devices");
        Ok(devices)
    }

    fn list_formats(&self, device: &str) -> CameraResult<Formats> {
        let dev = self.open_device(device)?;
        let descriptions = dev
            .enum_formats()
            .map_err(|e| io_error("enumerate formats", device, e))?;

        let mut formats = Vec::new();
        for description in descriptions {
            let fourcc = description.fourcc;
            let pixel_format = PixelFormat::from_bytes(fourcc.repr);
            let sizes = match frame_sizes(&dev, fourcc) {
                Ok(sizes) => sizes,
                Err(e) => {
                    warn!(device, %pixel_format, error = %e, "Could not enumerate frame sizes");
                    continue;
                }
            };
            for (width, height) in sizes {
                for fps in frame_rates(&dev, fourcc, width, height) {
                    formats.push(Format::raw(width as u64, height as u64, pixel_format, fps));
                }
            }
        }

        debug!(device, count = formats.len(), "Enumerated V4L2 formats");
        Ok(Formats::new(formats))
    }

    fn open_camera(&self, device: &str, format: &Format) -> CameraResult<Box<dyn Camera>> {
        Ok(Box::new(self.open(device, format)?))
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
        // The device encodes; the requested quality cannot be applied.
        debug!(device, quality = quality.value(), "Using device MJPEG encoder");
        let mut raw = *format;
        raw.pixel_format = PixelFormat::MJPEG;
        raw.compression = Compression::Undefined;
        let camera = self.open(device, &raw)?;
        Ok(Box::new(V4l2CompressedCamera::new(camera)))
    }
}

impl V4l2Platform {
    fn open(&self, device: &str, format: &Format) -> CameraResult<V4l2Camera> {
        format.validate()?;
        if !format.compression.is_undefined() {
            return Err(CameraError::InvalidFormat(format!(
                "raw capture cannot use compression {}",
                format.compression
            )));
        }
        let bytes = format.pixel_format.bytes().ok_or_else(|| {
            CameraError::InvalidFormat(format!(
                "V4L2 needs a concrete pixel format, got '{}'",
                format.pixel_format
            ))
        })?;
        let (width, height) = format.dimensions()?;

        let dev = self.open_device(device)?;
        let fourcc = v4l::FourCC::new(&bytes);
        let applied = dev
            .set_format(&v4l::Format::new(width, height, fourcc))
            .map_err(|e| io_error("set format", device, e))?;
        if applied.fourcc != fourcc {
            return Err(CameraError::NotSupported(format!(
                "{} does not capture {}",
                device, format.pixel_format
            )));
        }

        let mut fps = format.fps;
        if fps.numerator != 0 && fps.denominator != 0 {
            // Parameters take the time per frame, the inverse of the rate.
            let params = v4l::video::capture::Parameters::new(v4l::Fraction::new(
                fps.denominator,
                fps.numerator,
            ));
            match dev.set_params(&params) {
                Ok(p) => fps = fps_of(p.interval),
                Err(e) => warn!(device, error = %e, "Could not set frame rate"),
            }
        }

        let negotiated = Format::raw(
            applied.width as u64,
            applied.height as u64,
            PixelFormat::from_bytes(applied.fourcc.repr),
            fps,
        );
        if negotiated != *format {
            info!(device, requested = %format, negotiated = %negotiated, "Device adjusted format");
        }

        V4l2Camera::new(device, dev, negotiated, self.polling.poller(negotiated.fps))
            .with_context(|| format!("open {}", device))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_video_node_names() {
        assert!(is_video_node("video0"));
        assert!(is_video_node("video12"));
        assert!(!is_video_node("video"));
        assert!(!is_video_node("video0p1"));
        assert!(!is_video_node("vhci"));
    }

    #[test]
    fn test_node_ordering() {
        let mut nodes = vec!["/dev/video10".to_string(), "/dev/video2".to_string()];
        nodes.sort_by_key(|p| node_number(p));
        assert_eq!(nodes, vec!["/dev/video2", "/dev/video10"]);
    }

    #[test]
    fn test_interval_to_rate() {
        assert_eq!(fps_of(v4l::Fraction::new(1, 30)), Fraction::new(30, 1));
        assert_eq!(fps_of(v4l::Fraction::new(1001, 30000)), Fraction::new(30000, 1001));
    }

    #[test]
    fn test_io_error_mapping() {
        let busy = io_error("open", "/dev/video0", io::Error::from(io::ErrorKind::ResourceBusy));
        assert!(matches!(busy, CameraError::DeviceBusy(_)));
        let other = io_error("open", "/dev/video0", io::Error::from(io::ErrorKind::NotFound));
        assert_eq!(other.kind(), crate::errors::ErrorKind::Backend);
    }

    #[test]
    fn test_open_rejects_wildcard_pixel_format() {
        let platform = V4l2Platform::new();
        let format = Format::raw(640, 480, PixelFormat::Auto, Fraction::new(30, 1));
        let err = platform.open_camera("/dev/video0", &format).err().unwrap();
        assert_eq!(err.kind(), crate::errors::ErrorKind::Validation);
    }

    #[test]
    fn test_missing_device_is_backend_error() {
        let platform = V4l2Platform::new();
        let err = platform.list_formats("/dev/video-does-not-exist").unwrap_err();
        assert_eq!(err.kind(), crate::errors::ErrorKind::Backend);
    }
}
