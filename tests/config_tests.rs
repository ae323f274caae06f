// SPDX-License-Identifier: MPL-2.0

//! Integration tests for configuration module

use camera_capture::backends::camera::PlatformId;
use camera_capture::{Config, ErrorKind, PixelFormat};
use std::io::Write;
use std::time::Duration;

#[test]
fn test_config_default() {
    let config = Config::default();
    assert_eq!(config.frame_timeout(), Duration::from_secs(10));
    assert_eq!(config.polling.attempts_per_fps, 10);
    assert!(config.platform.is_none());
}

#[test]
fn test_load_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{
            "platform": "synthetic",
            "device": "synthetic0",
            "pixel_format": "NV12",
            "width": 1280,
            "frame_timeout_secs": 3,
            "polling": {{ "attempts_per_fps": 2 }},
            "synthetic": true
        }}"#
    )
    .unwrap();

    let config = Config::load(file.path()).unwrap();
    assert_eq!(config.platform, Some(PlatformId::Synthetic));
    assert_eq!(config.device.as_deref(), Some("synthetic0"));
    assert_eq!(config.pixel_format, Some(PixelFormat::NV12));
    assert_eq!(config.width, Some(1280));
    assert_eq!(config.frame_timeout(), Duration::from_secs(3));
    assert_eq!(config.polling.attempts_per_fps, 2);
    assert!(config.synthetic);
}

#[test]
fn test_save_then_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("camera.json");
    let config = Config {
        fps: Some(60.0),
        pixel_format: Some(PixelFormat::YUYV),
        ..Default::default()
    };
    config.save(&path).unwrap();
    assert_eq!(Config::load(&path).unwrap(), config);
}

#[test]
fn test_missing_file_is_config_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = Config::load(&dir.path().join("absent.json")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Config);
    assert!(err.to_string().contains("absent.json"));
}

#[test]
fn test_invalid_pixel_format_rejected() {
    let err = Config::from_json_str(r#"{"pixel_format": "TOOLONG"}"#).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Config);
}
