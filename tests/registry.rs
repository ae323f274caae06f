// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for the platform registry

use camera_capture::backends::camera::synthetic::{SyntheticDevice, SyntheticPlatform};
use camera_capture::backends::camera::{Camera, DevicePath, Platform, PlatformId, Registry};
use camera_capture::{CameraError, CameraResult, ErrorKind, Format, Formats, Fraction, PixelFormat};
use std::sync::Arc;
use std::thread;

/// A platform whose enumeration always fails
struct BrokenPlatform;

impl Platform for BrokenPlatform {
    fn id(&self) -> PlatformId {
        PlatformId::Other("broken".into())
    }

    fn list_cameras(&self) -> CameraResult<Vec<DevicePath>> {
        Err(CameraError::backend("list devices", "permission denied"))
    }

    fn list_formats(&self, _device: &str) -> CameraResult<Formats> {
        Err(CameraError::backend("list formats", "permission denied"))
    }

    fn open_camera(&self, _device: &str, _format: &Format) -> CameraResult<Box<dyn Camera>> {
        Err(CameraError::backend("open", "permission denied"))
    }
}

#[test]
fn test_duplicate_id_rejected() {
    let registry = Registry::new();
    registry
        .register_platform(Arc::new(SyntheticPlatform::new()))
        .unwrap();
    let err = registry
        .register_platform(Arc::new(SyntheticPlatform::with_device_count(3)))
        .unwrap_err();
    assert!(matches!(err, CameraError::DuplicatePlatform(_)));
    assert_eq!(err.kind(), ErrorKind::Validation);

    let listing = registry.list_cameras();
    assert_eq!(listing.cameras.len(), 1);
}

#[test]
fn test_partial_failure_is_recorded() {
    let registry = Registry::new();
    registry.register_platform(Arc::new(BrokenPlatform)).unwrap();
    registry
        .register_platform(Arc::new(SyntheticPlatform::with_device_count(2)))
        .unwrap();

    let listing = registry.list_cameras();
    assert!(!listing.is_complete());
    assert_eq!(listing.failures.len(), 1);
    assert_eq!(listing.failures[0].platform, PlatformId::Other("broken".into()));
    assert_eq!(listing.failures[0].error.kind(), ErrorKind::Backend);

    let names: Vec<String> = listing.cameras.iter().map(|c| c.to_string()).collect();
    assert_eq!(names, vec!["synthetic:synthetic0", "synthetic:synthetic1"]);
}

#[test]
fn test_listing_orders_by_registration() {
    let registry = Registry::new();
    registry
        .register_platform(Arc::new(SyntheticPlatform::with_devices(vec![
            SyntheticDevice::new("b"),
            SyntheticDevice::new("a"),
        ])))
        .unwrap();
    let paths: Vec<String> = registry
        .list_cameras()
        .cameras
        .into_iter()
        .map(|c| c.device_path)
        .collect();
    assert_eq!(paths, vec!["b", "a"]);
}

#[test]
fn test_device_handle_opens_through_its_platform() {
    let registry = Registry::new();
    registry
        .register_platform(Arc::new(SyntheticPlatform::new()))
        .unwrap();
    let device = registry
        .find_camera(&PlatformId::Synthetic, "synthetic0")
        .unwrap();
    let formats = device.list_formats().unwrap();
    let best = formats
        .filter_by_pixel_format(PixelFormat::NV12)
        .best_resolution();
    assert_eq!((best.width, best.height), (1280, 720));

    let mut camera = device.open_camera(&best).unwrap();
    assert_eq!(camera.format(), best);
    camera.close().unwrap();
}

#[test]
fn test_open_errors_carry_device_context() {
    let registry = Registry::new();
    registry
        .register_platform(Arc::new(SyntheticPlatform::new()))
        .unwrap();
    let device = registry
        .find_camera(&PlatformId::Synthetic, "synthetic0")
        .unwrap();
    let request = Format::raw(320, 200, PixelFormat::YUYV, Fraction::new(30, 1));
    let err = device.open_camera(&request).err().unwrap();
    assert_eq!(err.kind(), ErrorKind::NotSupported);
    assert!(err.to_string().contains("synthetic:synthetic0"));
}

#[test]
fn test_concurrent_registration_and_listing() {
    let registry = Arc::new(Registry::new());
    let handles: Vec<_> = (0..4)
        .map(|i| {
            let registry = Arc::clone(&registry);
            thread::spawn(move || {
                let id = format!("platform{}", i);
                registry
                    .register_platform(Arc::new(NamedPlatform(id)))
                    .unwrap();
                registry.list_cameras()
            })
        })
        .collect();
    for handle in handles {
        let listing = handle.join().unwrap();
        assert!(listing.is_complete());
        assert!(!listing.cameras.is_empty());
    }
    assert_eq!(registry.platforms().len(), 4);
}

/// Platform with one device and a caller-chosen id
struct NamedPlatform(String);

impl Platform for NamedPlatform {
    fn id(&self) -> PlatformId {
        PlatformId::Other(self.0.clone())
    }

    fn list_cameras(&self) -> CameraResult<Vec<DevicePath>> {
        Ok(vec![format!("{}-cam", self.0)])
    }

    fn list_formats(&self, _device: &str) -> CameraResult<Formats> {
        Ok(Formats::default())
    }

    fn open_camera(&self, device: &str, _format: &Format) -> CameraResult<Box<dyn Camera>> {
        Err(CameraError::NotSupported(format!("{} cannot stream", device)))
    }
}
