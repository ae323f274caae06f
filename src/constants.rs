// SPDX-License-Identifier: GPL-3.0-only

//! Crate-wide constants

use std::time::Duration;

/// Frame polling policy
pub mod polling {
    use super::Duration;

    /// Poll attempts per unit of (rounded) frame rate before giving up
    pub const ATTEMPTS_PER_FPS: u32 = 10;

    /// Granularity at which sleeping pollers re-check cancellation
    pub const CANCEL_CHECK_INTERVAL: Duration = Duration::from_millis(10);
}

/// Capture session defaults
pub mod capture {
    /// Timeout for acquiring a single frame from the CLI (seconds)
    pub const FRAME_TIMEOUT_SECS: u64 = 10;
}

/// Video4Linux2 backend
pub mod v4l2 {
    /// Directory scanned for capture devices
    pub const DEVICE_DIR: &str = "/dev";

    /// File name prefix of capture device nodes
    pub const DEVICE_PREFIX: &str = "video";

    /// Number of mmap buffers requested from the driver
    pub const BUFFER_COUNT: u32 = 4;

    /// Frame slots the camera hands out to callers
    pub const SLOT_COUNT: usize = 4;
}

/// Synthetic test-pattern backend
pub mod synthetic {
    /// Device path prefix (`synthetic0`, `synthetic1`, ...)
    pub const DEVICE_PREFIX: &str = "synthetic";

    /// Frame slots per camera
    pub const DEFAULT_POOL_SIZE: usize = 4;
}

/// JPEG / MJPEG stream parsing
pub mod jpeg {
    /// Marker prefix byte
    pub const MARKER: u8 = 0xFF;
    /// Start of image
    pub const SOI: u8 = 0xD8;
    /// End of image
    pub const EOI: u8 = 0xD9;
    /// Start of scan
    pub const SOS: u8 = 0xDA;
    /// Temporary marker (standalone)
    pub const TEM: u8 = 0x01;
    /// First restart marker (RST0..RST7 are standalone)
    pub const RST0: u8 = 0xD0;
    /// Last restart marker
    pub const RST7: u8 = 0xD7;

    /// Default encoder quality (1..=100)
    pub const DEFAULT_QUALITY: u8 = 85;

    /// Read chunk size when pulling from the pipe
    pub const READ_CHUNK: usize = 16 * 1024;
}
