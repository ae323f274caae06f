// SPDX-License-Identifier: MPL-2.0

//! Camera backend abstraction
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────┐
//! │       Caller        │
//! └──────────┬──────────┘
//!            │
//!            ▼
//! ┌─────────────────────┐
//! │      Registry       │  ← (platform, device) enumeration
//! └──────────┬──────────┘
//!            │
//!            ▼
//! ┌─────────────────────┐
//! │   Platform trait    │  ← list cameras / formats, open
//! └──────────┬──────────┘
//!            │
//!            ▼
//! ┌─────────────────────┐
//! │ Camera / Compressed │  ← streaming, frame acquire / release
//! └──────────┬──────────┘
//!       ┌────┴──────┐
//!       ▼           ▼
//!   ┌──────┐  ┌───────────┐
//!   │ V4L2 │  │ Synthetic │
//!   └──────┘  └───────────┘
//! ```
//!
//! Every frame handed out by `get_frame` occupies one slot of the camera's
//! bounded buffer pool until it is passed back to `release_frame`. Holding
//! on to frames starves the pool and later `get_frame` calls fail with
//! [`CameraError::FrameNotDelivered`](crate::errors::CameraError::FrameNotDelivered).

pub mod cancel;
pub mod polling;
pub mod registry;
pub mod ring;
pub mod slots;
pub mod synthetic;
pub mod types;
#[cfg(all(target_os = "linux", feature = "v4l2"))]
pub mod v4l2;

pub use cancel::CancellationToken;
pub use polling::{FramePoller, PollingPolicy};
pub use registry::{
    CameraListing, DevicePathAndPlatform, PlatformFailure, Registry, default_registry,
    list_cameras,
};
pub use slots::SlotPool;
pub use types::*;

use crate::errors::{CameraError, CameraResult};
use crate::media::formats::{Compression, CompressionQuality, Format, Formats};
use std::sync::Arc;

/// A capture backend (OS API or device family)
pub trait Platform: Send + Sync {
    /// Unique tag of this platform
    fn id(&self) -> PlatformId;

    /// Enumerate capture devices
    fn list_cameras(&self) -> CameraResult<Vec<DevicePath>>;

    /// Capture modes a device supports
    fn list_formats(&self, device: &str) -> CameraResult<Formats>;

    /// Open a device for raw capture
    ///
    /// The returned camera reports the format actually negotiated, which may
    /// differ from the request.
    fn open_camera(&self, device: &str, format: &Format) -> CameraResult<Box<dyn Camera>>;

    /// Open a device for compressed capture
    fn open_camera_compressed(
        &self,
        device: &str,
        format: &Format,
        compression: Compression,
        quality: CompressionQuality,
    ) -> CameraResult<Box<dyn CameraCompressed>> {
        let _ = (device, format, quality);
        Err(CameraError::NotSupported(format!(
            "{} platform has no {} capture",
            self.id(),
            compression
        )))
    }
}

/// An open device delivering raw frames
pub trait Camera: Send {
    /// Begin capture; calling it while streaming is a no-op
    fn start_streaming(&mut self) -> CameraResult<()>;

    /// Stop capture; calling it while stopped is a no-op
    fn stop_streaming(&mut self) -> CameraResult<()>;

    /// The negotiated format
    fn format(&self) -> Format;

    /// Next frame, polling until ready, cancelled, or out of attempts
    fn get_frame(&mut self, token: &CancellationToken) -> CameraResult<CapturedFrame>;

    /// Return a frame's slot to the pool
    fn release_frame(&mut self, frame: CapturedFrame) -> CameraResult<()>;

    /// Stop streaming and release the device
    fn close(&mut self) -> CameraResult<()>;
}

/// An open device delivering compressed frames
pub trait CameraCompressed: Send {
    fn start_streaming(&mut self) -> CameraResult<()>;

    fn stop_streaming(&mut self) -> CameraResult<()>;

    fn format(&self) -> Format;

    fn compression(&self) -> Compression;

    fn get_frame(&mut self, token: &CancellationToken) -> CameraResult<CompressedFrame>;

    fn release_frame(&mut self, frame: CompressedFrame) -> CameraResult<()>;

    fn close(&mut self) -> CameraResult<()>;
}

/// A fresh instance of a built-in platform
///
/// Returns `None` for ids that are not compiled in.
pub fn platform_by_id(id: &PlatformId) -> Option<Arc<dyn Platform>> {
    match id {
        #[cfg(all(target_os = "linux", feature = "v4l2"))]
        PlatformId::V4l2 => Some(Arc::new(v4l2::V4l2Platform::new())),
        PlatformId::Synthetic => Some(Arc::new(synthetic::SyntheticPlatform::new())),
        _ => None,
    }
}

/// Platforms that talk to real hardware on this system
pub fn builtin_platforms() -> Vec<Arc<dyn Platform>> {
    #[allow(unused_mut)]
    let mut platforms: Vec<Arc<dyn Platform>> = Vec::new();
    #[cfg(all(target_os = "linux", feature = "v4l2"))]
    platforms.push(Arc::new(v4l2::V4l2Platform::new()));
    platforms
}
