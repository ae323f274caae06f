// SPDX-License-Identifier: MPL-2.0

//! Integration tests for constants module

use camera_capture::constants::{capture, jpeg, polling, synthetic, v4l2};
use std::time::Duration;

#[test]
fn test_polling_constants() {
    assert_eq!(polling::ATTEMPTS_PER_FPS, 10);
    assert!(polling::CANCEL_CHECK_INTERVAL <= Duration::from_millis(50));
}

#[test]
fn test_capture_timeout() {
    assert_eq!(capture::FRAME_TIMEOUT_SECS, 10);
}

#[test]
fn test_pool_sizes() {
    assert!(v4l2::BUFFER_COUNT >= 2);
    assert!(v4l2::SLOT_COUNT >= 1);
    assert!(synthetic::DEFAULT_POOL_SIZE >= 1);
}

#[test]
fn test_jpeg_markers() {
    assert_eq!(jpeg::MARKER, 0xFF);
    assert_eq!(jpeg::SOI, 0xD8);
    assert_eq!(jpeg::EOI, 0xD9);
    assert_eq!(jpeg::SOS, 0xDA);
    assert_eq!(jpeg::RST7 - jpeg::RST0, 7);
    assert!((1..=100).contains(&jpeg::DEFAULT_QUALITY));
}
