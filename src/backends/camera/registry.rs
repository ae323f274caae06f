// SPDX-License-Identifier: GPL-3.0-only

//! Platform registry
//!
//! The registry provides:
//! - Registration of platforms under a unique id
//! - Best-effort enumeration of (platform, device) pairs across all of them
//! - Thread-safe access

use super::types::{DevicePath, PlatformId};
use super::{Camera, CameraCompressed, Platform, builtin_platforms};
use crate::errors::{CameraError, CameraResult, ResultExt};
use crate::media::formats::{Compression, CompressionQuality, Format, Formats};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};
use tracing::{debug, info, warn};

/// A device together with the platform that can open it
#[derive(Clone)]
pub struct DevicePathAndPlatform {
    pub device_path: DevicePath,
    pub platform: Arc<dyn Platform>,
}

impl DevicePathAndPlatform {
    pub fn new(device_path: impl Into<DevicePath>, platform: Arc<dyn Platform>) -> Self {
        Self {
            device_path: device_path.into(),
            platform,
        }
    }

    pub fn platform_id(&self) -> PlatformId {
        self.platform.id()
    }

    pub fn list_formats(&self) -> CameraResult<Formats> {
        self.platform
            .list_formats(&self.device_path)
            .with_context(|| format!("list formats of {}", self))
    }

    pub fn open_camera(&self, format: &Format) -> CameraResult<Box<dyn Camera>> {
        info!(device = %self, format = %format, "Opening camera");
        self.platform
            .open_camera(&self.device_path, format)
            .with_context(|| format!("open {} as {}", self, format))
    }

    pub fn open_camera_compressed(
        &self,
        format: &Format,
        compression: Compression,
        quality: CompressionQuality,
    ) -> CameraResult<Box<dyn CameraCompressed>> {
        info!(device = %self, format = %format, %compression, "Opening compressed camera");
        self.platform
            .open_camera_compressed(&self.device_path, format, compression, quality)
            .with_context(|| format!("open {} with {} compression", self, compression))
    }
}

impl std::fmt::Display for DevicePathAndPlatform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.platform.id(), self.device_path)
    }
}

impl std::fmt::Debug for DevicePathAndPlatform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DevicePathAndPlatform")
            .field("device_path", &self.device_path)
            .field("platform", &self.platform.id())
            .finish()
    }
}

/// A platform whose enumeration failed
#[derive(Debug, Clone)]
pub struct PlatformFailure {
    pub platform: PlatformId,
    pub error: CameraError,
}

/// Result of enumerating every registered platform
///
/// Enumeration is best-effort: one platform failing does not hide the
/// cameras of the others, its error is recorded in `failures`.
#[derive(Debug, Clone, Default)]
pub struct CameraListing {
    pub cameras: Vec<DevicePathAndPlatform>,
    pub failures: Vec<PlatformFailure>,
}

impl CameraListing {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Ordered set of platforms keyed by id
#[derive(Default)]
pub struct Registry {
    platforms: Mutex<Vec<Arc<dyn Platform>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry pre-populated with the hardware platforms compiled in
    pub fn with_builtin_platforms() -> Self {
        let registry = Self::new();
        for platform in builtin_platforms() {
            // Built-in ids are distinct.
            let _ = registry.register_platform(platform);
        }
        registry
    }

    /// Add a platform; fails if its id is already taken
    pub fn register_platform(&self, platform: Arc<dyn Platform>) -> CameraResult<()> {
        let id = platform.id();
        let mut platforms = self.lock();
        if platforms.iter().any(|p| p.id() == id) {
            return Err(CameraError::DuplicatePlatform(id.to_string()));
        }
        info!(platform = %id, "Registered camera platform");
        platforms.push(platform);
        Ok(())
    }

    /// Registered platforms in registration order
    pub fn platforms(&self) -> Vec<Arc<dyn Platform>> {
        self.lock().clone()
    }

    pub fn platform(&self, id: &PlatformId) -> Option<Arc<dyn Platform>> {
        self.lock().iter().find(|p| &p.id() == id).cloned()
    }

    /// Enumerate cameras across all platforms
    ///
    /// Works on a snapshot of the platform list, so registrations racing with
    /// enumeration are either fully seen or not at all, and slow device scans
    /// do not hold the lock.
    pub fn list_cameras(&self) -> CameraListing {
        let snapshot = self.platforms();
        let mut listing = CameraListing::default();
        for platform in snapshot {
            let id = platform.id();
            match platform.list_cameras() {
                Ok(devices) => {
                    debug!(platform = %id, count = devices.len(), "Enumerated cameras");
                    listing.cameras.extend(
                        devices
                            .into_iter()
                            .map(|d| DevicePathAndPlatform::new(d, Arc::clone(&platform))),
                    );
                }
                Err(error) => {
                    warn!(platform = %id, error = %error, "Camera enumeration failed");
                    listing.failures.push(PlatformFailure {
                        platform: id,
                        error,
                    });
                }
            }
        }
        listing
    }

    /// Find a device by platform and path
    pub fn find_camera(&self, platform: &PlatformId, device: &str) -> CameraResult<DevicePathAndPlatform> {
        let p = self.platform(platform).ok_or_else(|| {
            CameraError::InvalidFormat(format!("platform '{}' is not registered", platform))
        })?;
        let devices = p.list_cameras()?;
        if !devices.iter().any(|d| d == device) {
            return Err(CameraError::backend(
                "find camera",
                format!("no device {} on platform {}", device, platform),
            ));
        }
        Ok(DevicePathAndPlatform::new(device, p))
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Arc<dyn Platform>>> {
        self.platforms.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let ids: Vec<PlatformId> = self.lock().iter().map(|p| p.id()).collect();
        f.debug_struct("Registry").field("platforms", &ids).finish()
    }
}

/// Process-wide registry holding the built-in platforms
pub fn default_registry() -> &'static Registry {
    static REGISTRY: OnceLock<Registry> = OnceLock::new();
    REGISTRY.get_or_init(Registry::with_builtin_platforms)
}

/// Enumerate cameras on the process-wide registry
pub fn list_cameras() -> CameraListing {
    default_registry().list_cameras()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::camera::synthetic::SyntheticPlatform;
    use crate::errors::ErrorKind;

    #[test]
    fn test_duplicate_rejected() {
        let registry = Registry::new();
        registry
            .register_platform(Arc::new(SyntheticPlatform::new()))
            .unwrap();
        let err = registry
            .register_platform(Arc::new(SyntheticPlatform::new()))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(registry.platforms().len(), 1);
    }

    #[test]
    fn test_lists_synthetic_devices() {
        let registry = Registry::new();
        registry
            .register_platform(Arc::new(SyntheticPlatform::new()))
            .unwrap();
        let listing = registry.list_cameras();
        assert!(listing.is_complete());
        assert!(!listing.cameras.is_empty());
        assert_eq!(listing.cameras[0].platform_id(), PlatformId::Synthetic);
        assert_eq!(listing.cameras[0].to_string(), "synthetic:synthetic0");
    }

    #[test]
    fn test_find_camera() {
        let registry = Registry::new();
        registry
            .register_platform(Arc::new(SyntheticPlatform::new()))
            .unwrap();
        assert!(registry.find_camera(&PlatformId::Synthetic, "synthetic0").is_ok());
        assert!(registry.find_camera(&PlatformId::Synthetic, "nope").is_err());
        assert!(registry.find_camera(&PlatformId::V4l2, "/dev/video0").is_err());
    }
}
